use crate::Application;
use crate::templates;
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
pub enum TemplatesCall {
    CreateTemplate { class_name: String, name: String },
    CreateTemplateElement { class_name: String, parent_class_name: String, parent_id: Id, name: String },
    CreateTemplateSpecialElement { class_name: String, parent_class_name: String, parent_id: Id, name: String },
    CreateBulkTemplateElement { class_name: String, parent_class_name: String, parent_id: Id, name_pattern: String },
    CreateBulkSpecialTemplateElement {
        class_name: String,
        parent_class_name: String,
        parent_id: Id,
        name_pattern: String,
    },
    UpdateTemplateElement { class_name: String, id: Id, attributes: BTreeMap<String, String> },
    DeleteTemplateElement { class_name: String, id: Id },
    GetTemplatesForClass { class_name: String },
    GetTemplateElementChildren { class_name: String, id: Id },
    GetTemplateSpecialElementChildren { class_name: String, id: Id },
    GetTemplateElement { class_name: String, id: Id },
    CopyTemplateElements { sources: Vec<ObjectKey>, new_parent_class_name: String, new_parent_id: Id },
    CopyTemplateSpecialElements { sources: Vec<ObjectKey>, new_parent_class_name: String, new_parent_id: Id },
}

impl SliceCall for TemplatesCall {
    type Slice = Application;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::GetTemplatesForClass { .. }
            | Self::GetTemplateElementChildren { .. }
            | Self::GetTemplateSpecialElementChildren { .. }
            | Self::GetTemplateElement { .. } => Requirement::read(FeatureSet::TEMPLATES),
            _ => Requirement::write(FeatureSet::TEMPLATES),
        }
    }

    async fn execute(self, slice: &Application, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateTemplate { class_name, name } => {
                let id = db.write(|t| templates::create_template(t, &class_name, &name))?;
                ctx.record(
                    ActivityType::CreateApplicationObject,
                    Some(&ObjectKey::new(class_name, id.clone())),
                    format!("Template {name}"),
                );
                reply(id)
            },
            Self::CreateTemplateElement { class_name, parent_class_name, parent_id, name } => {
                element(slice, ctx, class_name, &parent_class_name, &parent_id, &name, false)
            },
            Self::CreateTemplateSpecialElement { class_name, parent_class_name, parent_id, name } => {
                element(slice, ctx, class_name, &parent_class_name, &parent_id, &name, true)
            },
            Self::CreateBulkTemplateElement { class_name, parent_class_name, parent_id, name_pattern } => {
                bulk(slice, ctx, &class_name, &parent_class_name, &parent_id, &name_pattern, false)
            },
            Self::CreateBulkSpecialTemplateElement { class_name, parent_class_name, parent_id, name_pattern } => {
                bulk(slice, ctx, &class_name, &parent_class_name, &parent_id, &name_pattern, true)
            },
            Self::UpdateTemplateElement { class_name, id, attributes } => {
                let notes = db.write(|t| templates::update_element(t, &class_name, &id, &attributes))?;
                ctx.record(ActivityType::UpdateApplicationObject, Some(&ObjectKey::new(class_name, id)), notes);
                reply(())
            },
            Self::DeleteTemplateElement { class_name, id } => {
                let count = db.write(|t| templates::delete_element(t, &class_name, &id))?;
                ctx.record(
                    ActivityType::DeleteApplicationObject,
                    Some(&ObjectKey::new(class_name, id)),
                    format!("{count} template elements removed"),
                );
                reply(())
            },
            Self::GetTemplatesForClass { class_name } => reply(db.read(|t| templates::templates_for_class(t, &class_name))),
            Self::GetTemplateElementChildren { class_name, id } => {
                reply(db.read(|t| templates::element_children(t, &class_name, &id))?)
            },
            Self::GetTemplateSpecialElementChildren { class_name, id } => {
                reply(db.read(|t| templates::special_element_children(t, &class_name, &id))?)
            },
            Self::GetTemplateElement { class_name, id } => reply(db.read(|t| templates::element(t, &class_name, &id))?),
            Self::CopyTemplateElements { sources, new_parent_class_name, new_parent_id } => {
                copy(slice, ctx, &sources, new_parent_class_name, new_parent_id, false)
            },
            Self::CopyTemplateSpecialElements { sources, new_parent_class_name, new_parent_id } => {
                copy(slice, ctx, &sources, new_parent_class_name, new_parent_id, true)
            },
        }
    }
}

fn element(
    slice: &Application,
    ctx: &CallContext,
    class_name: String,
    parent_class: &str,
    parent_id: &str,
    name: &str,
    special: bool,
) -> Result<Value, InventoryError> {
    let id = slice.database.write(|t| templates::create_element(t, &class_name, parent_class, parent_id, name, special))?;
    ctx.record(
        ActivityType::CreateApplicationObject,
        Some(&ObjectKey::new(class_name, id.clone())),
        format!("Template element {name} under {parent_class} {parent_id}"),
    );
    reply(id)
}

fn bulk(
    slice: &Application,
    ctx: &CallContext,
    class_name: &str,
    parent_class: &str,
    parent_id: &str,
    pattern: &str,
    special: bool,
) -> Result<Value, InventoryError> {
    let ids = slice
        .database
        .write(|t| templates::create_bulk_elements(t, class_name, parent_class, parent_id, pattern, special))?;
    ctx.record(
        ActivityType::CreateApplicationObject,
        Some(&ObjectKey::new(parent_class, parent_id)),
        format!("{} {class_name} template elements from {pattern}", ids.len()),
    );
    reply(ids)
}

fn copy(
    slice: &Application,
    ctx: &CallContext,
    sources: &[ObjectKey],
    parent_class: String,
    parent_id: Id,
    special: bool,
) -> Result<Value, InventoryError> {
    let ids = slice.database.write(|t| templates::copy_elements(t, sources, &parent_class, &parent_id, special))?;
    ctx.record(
        ActivityType::CreateApplicationObject,
        Some(&ObjectKey::new(parent_class, parent_id)),
        format!("{} template elements copied", ids.len()),
    );
    reply(ids)
}
