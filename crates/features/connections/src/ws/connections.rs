
use crate::physical::{self, NewConnection};
use crate::wiring::{self, ConnectionKind, Planned, Side, Wiring};
use crate::{Connections, bgp, mirror, mpls, path};
use kw_domain::constants::{CLASS_MPLS_LINK, REL_MIRROR, REL_MIRROR_MULTIPLE};
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use strum::VariantNames;

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ConnectionsCall {
    CreatePhysicalConnection(NewConnection),
    DeletePhysicalConnection { class_name: String, id: Id },
    GetPhysicalConnectionEndpoints { class_name: String, id: Id },
    GetPhysicalConnectionsInObject { class_name: String, id: Id },
    ConnectPhysicalLinks { connections: Vec<Wiring> },
    ConnectPhysicalContainers { connections: Vec<Wiring> },
    DisconnectPhysicalConnection { class_name: String, id: Id, side_to_disconnect: i32 },
    ReconnectPhysicalConnection {
        class_name: String,
        id: Id,
        #[serde(default)]
        new_endpoint_a: Option<ObjectKey>,
        #[serde(default)]
        new_endpoint_b: Option<ObjectKey>,
    },
    ConnectMirrorPort { a_class_name: String, a_id: Id, b_class_name: String, b_id: Id },
    ConnectMirrorMultiplePort { a_class_name: String, a_id: Id, targets: Vec<ObjectKey> },
    ReleaseMirrorPort { class_name: String, id: Id },
    ReleaseMirrorMultiplePort { class_name: String, id: Id },
    GetPhysicalPath { class_name: String, id: Id },
    GetPhysicalTree { class_name: String, id: Id },
    GetLinkConnectedToPort { class_name: String, id: Id },
    GetContainersBetweenObjects {
        a_class_name: String,
        a_id: Id,
        b_class_name: String,
        b_id: Id,
        container_class_name: String,
    },
    #[serde(rename = "createMPLSLink")]
    #[strum(serialize = "createMPLSLink")]
    CreateMplsLink {
        #[serde(default)]
        endpoint_a: Option<ObjectKey>,
        #[serde(default)]
        endpoint_b: Option<ObjectKey>,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
    },
    #[serde(rename = "getMPLSLinkEndpoints")]
    #[strum(serialize = "getMPLSLinkEndpoints")]
    GetMplsLinkEndpoints { id: Id },
    ConnectMplsLink { connections: Vec<Wiring> },
    #[serde(rename = "disconnectMPLSLink")]
    #[strum(serialize = "disconnectMPLSLink")]
    DisconnectMplsLink { id: Id, side_to_disconnect: i32 },
    #[serde(rename = "deleteMPLSLink")]
    #[strum(serialize = "deleteMPLSLink")]
    DeleteMplsLink {
        id: Id,
        #[serde(default)]
        force_delete: bool,
    },
    #[serde(rename = "getBGPMap")]
    #[strum(serialize = "getBGPMap")]
    GetBgpMap {
        #[serde(default, rename = "mappedBGPLinksIds")]
        mapped_bgp_links_ids: Vec<Id>,
    },
}

impl SliceCall for ConnectionsCall {
    type Slice = Connections;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetPhysicalConnectionEndpoints { .. }
            | Self::GetPhysicalConnectionsInObject { .. }
            | Self::GetPhysicalPath { .. }
            | Self::GetPhysicalTree { .. }
            | Self::GetLinkConnectedToPort { .. }
            | Self::GetContainersBetweenObjects { .. }
            | Self::GetMplsLinkEndpoints { .. }
            | Self::GetBgpMap { .. } => Requirement::read(FeatureSet::CONNECTIONS),
            _ => Requirement::write(FeatureSet::CONNECTIONS),
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn execute(self, slice: &Connections, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreatePhysicalConnection(new) => {
                let id = db.write(|t| physical::create(t, &new))?;
                let key = ObjectKey::new(new.class_name.clone(), id.clone());
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&key),
                    format!("Between {} and {}", new.endpoint_a, new.endpoint_b),
                );
                reply(id)
            },
            Self::DeletePhysicalConnection { class_name, id } => {
                let removed = db.write(|t| physical::delete(t, &class_name, &id))?;
                kw_business::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
                ctx.record(
                    ActivityType::DeleteInventoryObject,
                    Some(&ObjectKey::new(class_name, id)),
                    format!("{} objects removed", removed.objects.len()),
                );
                reply(())
            },
            Self::GetPhysicalConnectionEndpoints { class_name, id } => {
                reply(db.read(|t| wiring::endpoints(t, &class_name, &id, ConnectionKind::PHYSICAL))?)
            },
            Self::GetPhysicalConnectionsInObject { class_name, id } => {
                reply(db.read(|t| physical::connections_in_object(t, &class_name, &id))?)
            },
            Self::ConnectPhysicalLinks { connections } => {
                let attached = db.write(|t| wiring::connect(t, &connections, &[ConnectionKind::Link]))?;
                record_attached(ctx, &attached);
                reply(())
            },
            Self::ConnectPhysicalContainers { connections } => {
                let attached = db.write(|t| wiring::connect(t, &connections, &[ConnectionKind::Container]))?;
                record_attached(ctx, &attached);
                reply(())
            },
            Self::DisconnectPhysicalConnection { class_name, id, side_to_disconnect } => {
                let side = Side::try_from(side_to_disconnect)?;
                let released =
                    db.write(|t| wiring::disconnect(t, &class_name, &id, side, ConnectionKind::PHYSICAL))?;
                record_released(ctx, &ObjectKey::new(class_name, id), &released);
                reply(())
            },
            Self::ReconnectPhysicalConnection { class_name, id, new_endpoint_a, new_endpoint_b } => {
                let moved = db.write(|t| {
                    wiring::reconnect(
                        t,
                        &class_name,
                        &id,
                        new_endpoint_a.as_ref(),
                        new_endpoint_b.as_ref(),
                        ConnectionKind::PHYSICAL,
                    )
                })?;
                record_attached(ctx, &moved);
                reply(())
            },
            Self::ConnectMirrorPort { a_class_name, a_id, b_class_name, b_id } => {
                let (a, b) = (ObjectKey::new(a_class_name, a_id), ObjectKey::new(b_class_name, b_id));
                db.write(|t| mirror::connect(t, &a, &b))?;
                ctx.record(ActivityType::CreateRelationship, Some(&a), format!("{REL_MIRROR} -> {b}"));
                reply(())
            },
            Self::ConnectMirrorMultiplePort { a_class_name, a_id, targets } => {
                let a = ObjectKey::new(a_class_name, a_id);
                let count = db.write(|t| mirror::connect_multiple(t, &a, &targets))?;
                ctx.record(ActivityType::CreateRelationship, Some(&a), format!("{count} {REL_MIRROR_MULTIPLE}"));
                reply(())
            },
            Self::ReleaseMirrorPort { class_name, id } => release_mirror(slice, ctx, class_name, id, REL_MIRROR),
            Self::ReleaseMirrorMultiplePort { class_name, id } => {
                release_mirror(slice, ctx, class_name, id, REL_MIRROR_MULTIPLE)
            },
            Self::GetPhysicalPath { class_name, id } => reply(db.read(|t| path::physical_path(t, &class_name, &id))?),
            Self::GetPhysicalTree { class_name, id } => reply(db.read(|t| path::physical_tree(t, &class_name, &id))?),
            Self::GetLinkConnectedToPort { class_name, id } => {
                reply(db.read(|t| physical::link_connected_to_port(t, &class_name, &id))?)
            },
            Self::GetContainersBetweenObjects { a_class_name, a_id, b_class_name, b_id, container_class_name } => {
                let (a, b) = (ObjectKey::new(a_class_name, a_id), ObjectKey::new(b_class_name, b_id));
                reply(db.read(|t| physical::containers_between(t, &a, &b, &container_class_name))?)
            },
            Self::CreateMplsLink { endpoint_a, endpoint_b, attributes } => {
                let id = db.write(|t| mpls::create(t, endpoint_a.as_ref(), endpoint_b.as_ref(), &attributes))?;
                ctx.record(
                    ActivityType::CreateInventoryObject,
                    Some(&ObjectKey::new(CLASS_MPLS_LINK, id.clone())),
                    attributes.get("name").cloned().unwrap_or_default(),
                );
                reply(id)
            },
            Self::GetMplsLinkEndpoints { id } => reply(db.read(|t| mpls::details(t, &id))?),
            Self::ConnectMplsLink { connections } => {
                let attached = db.write(|t| mpls::connect(t, &connections))?;
                record_attached(ctx, &attached);
                reply(())
            },
            Self::DisconnectMplsLink { id, side_to_disconnect } => {
                let side = Side::try_from(side_to_disconnect)?;
                let released = db.write(|t| mpls::disconnect(t, &id, side))?;
                record_released(ctx, &ObjectKey::new(CLASS_MPLS_LINK, id), &released);
                reply(())
            },
            Self::DeleteMplsLink { id, force_delete } => {
                let removed = db.write(|t| mpls::delete(t, &id, force_delete))?;
                kw_business::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
                ctx.record(ActivityType::DeleteInventoryObject, Some(&ObjectKey::new(CLASS_MPLS_LINK, id)), "");
                reply(())
            },
            Self::GetBgpMap { mapped_bgp_links_ids } => reply(db.read(|t| bgp::bgp_map(t, &mapped_bgp_links_ids))?),
        }
    }
}

fn record_attached(ctx: &CallContext, attached: &[Planned]) {
    for (connection, endpoint, name) in attached {
        ctx.record(ActivityType::CreateRelationship, Some(connection), format!("{name} -> {endpoint}"));
    }
}

fn record_released(ctx: &CallContext, connection: &ObjectKey, released: &[ObjectKey]) {
    let notes = released.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    ctx.record(ActivityType::ReleaseRelationship, Some(connection), notes);
}

fn release_mirror(
    slice: &Connections,
    ctx: &CallContext,
    class_name: String,
    id: Id,
    name: &str,
) -> Result<Value, InventoryError> {
    let key = ObjectKey::new(class_name, id);
    let released = slice.database.write(|t| mirror::release(t, &key, name))?;
    ctx.record(ActivityType::ReleaseRelationship, Some(&key), format!("{released} {name} released"));
    reply(())
}
