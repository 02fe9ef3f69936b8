use crate::Connections;
use crate::sdh::{self, NewSdhLink};
use kw_business::objects::Removed;
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SdhCall {
    #[serde(rename = "createSDHTransportLink")]
    #[strum(serialize = "createSDHTransportLink")]
    CreateTransportLink(NewSdhLink),
    #[serde(rename = "createSDHContainerLink")]
    #[strum(serialize = "createSDHContainerLink")]
    CreateContainerLink(NewSdhLink),
    #[serde(rename = "createSDHTributaryLink")]
    #[strum(serialize = "createSDHTributaryLink")]
    CreateTributaryLink(NewSdhLink),
    #[serde(rename = "deleteSDHTransportLink")]
    #[strum(serialize = "deleteSDHTransportLink")]
    DeleteTransportLink {
        class_name: String,
        id: Id,
        #[serde(default)]
        force_delete: bool,
    },
    #[serde(rename = "deleteSDHContainerLink")]
    #[strum(serialize = "deleteSDHContainerLink")]
    DeleteContainerLink {
        class_name: String,
        id: Id,
        #[serde(default)]
        force_delete: bool,
    },
    #[serde(rename = "deleteSDHTributaryLink")]
    #[strum(serialize = "deleteSDHTributaryLink")]
    DeleteTributaryLink { class_name: String, id: Id },
    #[serde(rename = "findSDHRoutesUsingTransportLinks")]
    #[strum(serialize = "findSDHRoutesUsingTransportLinks")]
    FindRoutesUsingTransportLinks { a_class_name: String, a_id: Id, b_class_name: String, b_id: Id },
    #[serde(rename = "findSDHRoutesUsingContainerLinks")]
    #[strum(serialize = "findSDHRoutesUsingContainerLinks")]
    FindRoutesUsingContainerLinks { a_class_name: String, a_id: Id, b_class_name: String, b_id: Id },
    #[serde(rename = "getSDHTransportLinkStructure")]
    #[strum(serialize = "getSDHTransportLinkStructure")]
    GetTransportLinkStructure { class_name: String, id: Id },
    #[serde(rename = "getSDHContainerLinkStructure")]
    #[strum(serialize = "getSDHContainerLinkStructure")]
    GetContainerLinkStructure { class_name: String, id: Id },
}

impl SliceCall for SdhCall {
    type Slice = Connections;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::FindRoutesUsingTransportLinks { .. }
            | Self::FindRoutesUsingContainerLinks { .. }
            | Self::GetTransportLinkStructure { .. }
            | Self::GetContainerLinkStructure { .. } => Requirement::read(FeatureSet::SDH),
            _ => Requirement::write(FeatureSet::SDH),
        }
    }

    async fn execute(self, slice: &Connections, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateTransportLink(new) => {
                let id = db.write(|t| sdh::create_transport_link(t, &new))?;
                record_created(ctx, &new, &id);
                reply(id)
            },
            Self::CreateContainerLink(new) => {
                let id = db.write(|t| sdh::create_container_link(t, &new))?;
                record_created(ctx, &new, &id);
                reply(id)
            },
            Self::CreateTributaryLink(new) => {
                let id = db.write(|t| sdh::create_tributary_link(t, &new))?;
                record_created(ctx, &new, &id);
                reply(id)
            },
            Self::DeleteTransportLink { class_name, id, force_delete } => {
                let removed = db.write(|t| sdh::delete_transport_link(t, &class_name, &id, force_delete))?;
                forget(slice, ctx, &removed).await;
                reply(())
            },
            Self::DeleteContainerLink { class_name, id, force_delete } => {
                let removed = db.write(|t| sdh::delete_container_link(t, &class_name, &id, force_delete))?;
                forget(slice, ctx, &removed).await;
                reply(())
            },
            Self::DeleteTributaryLink { class_name, id } => {
                let removed = db.write(|t| sdh::delete_tributary_link(t, &class_name, &id))?;
                forget(slice, ctx, &removed).await;
                reply(())
            },
            Self::FindRoutesUsingTransportLinks { a_class_name, a_id, b_class_name, b_id } => {
                let (a, b) = (ObjectKey::new(a_class_name, a_id), ObjectKey::new(b_class_name, b_id));
                reply(db.read(|t| sdh::routes_using_transport_links(t, &a, &b))?)
            },
            Self::FindRoutesUsingContainerLinks { a_class_name, a_id, b_class_name, b_id } => {
                let (a, b) = (ObjectKey::new(a_class_name, a_id), ObjectKey::new(b_class_name, b_id));
                reply(db.read(|t| sdh::routes_using_container_links(t, &a, &b))?)
            },
            Self::GetTransportLinkStructure { class_name, id } => {
                reply(db.read(|t| sdh::transport_link_structure(t, &class_name, &id))?)
            },
            Self::GetContainerLinkStructure { class_name, id } => {
                reply(db.read(|t| sdh::container_link_structure(t, &class_name, &id))?)
            },
        }
    }
}

fn record_created(ctx: &CallContext, new: &NewSdhLink, id: &Id) {
    ctx.record(
        ActivityType::CreateInventoryObject,
        Some(&ObjectKey::new(new.link_type.clone(), id.clone())),
        format!("Between {} and {}", new.endpoint_a, new.endpoint_b),
    );
}

async fn forget(slice: &Connections, ctx: &CallContext, removed: &Removed) {
    kw_business::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
    for key in &removed.objects {
        ctx.record(ActivityType::DeleteInventoryObject, Some(key), "");
    }
}
