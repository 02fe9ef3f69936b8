use crate::Application;
use crate::views::{self, ViewContent, ViewLight};
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
pub enum ViewsCall {
    CreateObjectRelatedView {
        class_name: String,
        id: Id,
        view_class: String,
        #[serde(flatten)]
        content: ViewContent,
    },
    UpdateObjectRelatedView {
        class_name: String,
        id: Id,
        view_id: Id,
        #[serde(flatten)]
        content: ViewContent,
    },
    GetObjectRelatedView { class_name: String, id: Id, view_id: Id },
    GetObjectRelatedViews {
        class_name: String,
        id: Id,
        #[serde(default)]
        limit: i64,
    },
    DeleteObjectRelatedViews { ids: Vec<Id> },
    CreateGeneralView {
        view_class: String,
        #[serde(flatten)]
        content: ViewContent,
    },
    UpdateGeneralView {
        id: Id,
        #[serde(flatten)]
        content: ViewContent,
    },
    GetGeneralViews {
        #[serde(default)]
        view_class: Option<String>,
        #[serde(default)]
        limit: i64,
    },
    GetGeneralView { id: Id },
    DeleteGeneralViews { ids: Vec<Id> },
    #[serde(rename = "createOSPView")]
    #[strum(serialize = "createOSPView")]
    CreateOspView(ViewContent),
    #[serde(rename = "getOSPView")]
    #[strum(serialize = "getOSPView")]
    GetOspView { id: Id },
    #[serde(rename = "getOSPViews")]
    #[strum(serialize = "getOSPViews")]
    GetOspViews {},
    #[serde(rename = "updateOSPView")]
    #[strum(serialize = "updateOSPView")]
    UpdateOspView {
        id: Id,
        #[serde(flatten)]
        content: ViewContent,
    },
    #[serde(rename = "deleteOSPView")]
    #[strum(serialize = "deleteOSPView")]
    DeleteOspView { id: Id },
}

impl SliceCall for ViewsCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetObjectRelatedView { .. }
            | Self::GetObjectRelatedViews { .. }
            | Self::GetGeneralViews { .. }
            | Self::GetGeneralView { .. } => Requirement::read(FeatureSet::VIEWS),
            Self::GetOspView { .. } | Self::GetOspViews {} => Requirement::read(FeatureSet::OUTSIDE_PLANT),
            Self::CreateOspView(_) | Self::UpdateOspView { .. } | Self::DeleteOspView { .. } => {
                Requirement::write(FeatureSet::OUTSIDE_PLANT)
            },
            _ => Requirement::write(FeatureSet::VIEWS),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateObjectRelatedView { class_name, id, view_class, content } => {
                let view_id = db.write(|t| views::create_object_view(t, &class_name, &id, &view_class, &content))?;
                ctx.record(
                    ActivityType::CreateApplicationObject,
                    Some(&ObjectKey::new(class_name, id)),
                    format!("{view_class} view {view_id}"),
                );
                reply(view_id)
            },
            Self::UpdateObjectRelatedView { class_name, id, view_id, content } => {
                db.write(|t| views::update_object_view(t, &class_name, &id, &view_id, &content))?;
                ctx.record(
                    ActivityType::UpdateApplicationObject,
                    Some(&ObjectKey::new(class_name, id)),
                    format!("View {view_id}"),
                );
                reply(())
            },
            Self::GetObjectRelatedView { class_name, id, view_id } => {
                reply(db.read(|t| views::object_view(t, &class_name, &id, &view_id).cloned())?)
            },
            Self::GetObjectRelatedViews { class_name, id, limit } => {
                reply(db.read(|t| views::object_views(t, &class_name, &id, limit))?)
            },
            Self::DeleteObjectRelatedViews { ids } => delete(slice, ctx, &ids, false),
            Self::CreateGeneralView { view_class, content } => {
                let id = db.write(|t| views::create_general_view(t, &view_class, &content))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("{view_class} view {id}"));
                reply(id)
            },
            Self::UpdateGeneralView { id, content } => {
                db.write(|t| views::update_general_view(t, &id, &content))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("View {id}"));
                reply(())
            },
            Self::GetGeneralViews { view_class, limit } => {
                let found: Vec<ViewLight> = db.read(|t| views::general_views(t, view_class.as_deref(), limit));
                reply(found)
            },
            Self::GetGeneralView { id } => reply(db.read(|t| views::general_view(t, &id).cloned())?),
            Self::DeleteGeneralViews { ids } => delete(slice, ctx, &ids, true),
            Self::CreateOspView(content) => {
                let id = db.write(|t| views::create_osp_view(t, &content))?;
                ctx.record(ActivityType::CreateApplicationObject, None, format!("OSP view {id}"));
                reply(id)
            },
            Self::GetOspView { id } => reply(db.read(|t| views::osp_view(t, &id).cloned())?),
            Self::GetOspViews {} => reply(db.read(views::osp_views)),
            Self::UpdateOspView { id, content } => {
                db.write(|t| views::update_osp_view(t, &id, &content))?;
                ctx.record(ActivityType::UpdateApplicationObject, None, format!("OSP view {id}"));
                reply(())
            },
            Self::DeleteOspView { id } => {
                let removed = db.write(|t| views::delete_osp_view(t, &id))?;
                ctx.record(ActivityType::DeleteApplicationObject, None, format!("OSP view {}", removed.name));
                reply(())
            },
        }
    }
}

fn delete(slice: &Application, ctx: &CallContext, ids: &[Id], general: bool) -> Result<Value, InventoryError> {
    slice.database.write(|t| views::delete_views(t, ids, general))?;
    ctx.record(ActivityType::DeleteApplicationObject, None, format!("Views {}", ids.join(", ")));
    reply(())
}
