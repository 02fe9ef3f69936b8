//! Web service operations on inventory objects.

use crate::objects::{self, NewObject, Store};
use crate::{Business, navigation, relationships, search};
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::FeatureSet;
use kw_kernel::call::{CallContext, Requirement, SliceCall, reply};
use kw_kernel::error::InventoryError;
use kw_metadata::values::RemoteObject;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use strum::VariantNames;

const fn first_page() -> i64 {
    1
}

#[derive(Debug, Deserialize, strum_macros::AsRefStr, strum_macros::VariantNames)]
#[serde(tag = "operation", content = "params", rename_all = "camelCase", rename_all_fields = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum BusinessCall {
    CreateObject(NewObject),
    CreateSpecialObject(NewObject),
    CreateBulkObjects {
        class_name: String,
        parent_class_name: String,
        parent_id: Id,
        name_pattern: String,
        #[serde(default)]
        template_id: Option<Id>,
    },
    CreateBulkSpecialObjects {
        class_name: String,
        parent_class_name: String,
        parent_id: Id,
        name_pattern: String,
        #[serde(default)]
        template_id: Option<Id>,
    },
    GetObject { class_name: String, id: Id },
    GetObjectLight { class_name: String, id: Id },
    GetObjectsOfClassLight {
        class_name: String,
        #[serde(default)]
        max_results: i64,
    },
    GetObjectChildren {
        class_name: String,
        id: Id,
        #[serde(default)]
        max_results: i64,
    },
    GetChildrenOfClassLight {
        parent_class_name: String,
        parent_id: Id,
        class_to_filter: String,
        #[serde(default)]
        max_results: i64,
    },
    GetObjectSpecialChildren { class_name: String, id: Id },
    GetSiblings {
        class_name: String,
        id: Id,
        #[serde(default)]
        max_results: i64,
    },
    GetParent { class_name: String, id: Id },
    GetParents { class_name: String, id: Id },
    GetParentsUntilFirstOfClass { class_name: String, id: Id, classes: Vec<String> },
    GetFirstParentOfClass { class_name: String, id: Id, parent_class_name: String },
    GetCommonParent { a_class_name: String, a_id: Id, b_class_name: String, b_id: Id },
    UpdateObject { class_name: String, id: Id, attributes: BTreeMap<String, String> },
    DeleteObjects {
        objects: Vec<ObjectKey>,
        #[serde(default)]
        release_relationships: bool,
    },
    MoveObjects { target_class_name: String, target_id: Id, objects: Vec<ObjectKey> },
    MoveSpecialObjects { target_class_name: String, target_id: Id, objects: Vec<ObjectKey> },
    CopyObjects {
        target_class_name: String,
        target_id: Id,
        objects: Vec<ObjectKey>,
        #[serde(default)]
        recursive: bool,
    },
    CopySpecialObjects {
        target_class_name: String,
        target_id: Id,
        objects: Vec<ObjectKey>,
        #[serde(default)]
        recursive: bool,
    },
    CreateSpecialRelationship {
        a_class_name: String,
        a_id: Id,
        b_class_name: String,
        b_id: Id,
        name: String,
        #[serde(default)]
        unique: bool,
        #[serde(default)]
        properties: BTreeMap<String, String>,
    },
    ReleaseSpecialRelationship { class_name: String, id: Id, other_id: Id, name: String },
    GetSpecialAttribute { class_name: String, id: Id, attribute_name: String },
    GetSpecialAttributes { class_name: String, id: Id },
    GetObjectsWithFilterLight { class_name: String, filter_name: String, filter_value: String },
    GetSuggestedObjectsWithFilter {
        filter: String,
        #[serde(default)]
        class_names: Vec<String>,
        #[serde(default = "first_page")]
        page: i64,
        #[serde(default)]
        limit: i64,
    },
    GetAttributeValueAsString { class_name: String, id: Id, attribute_name: String },
    GetAttributeValuesAsString { class_name: String, id: Id },
    GetObjectsByNameAndClassName {
        names: Vec<String>,
        #[serde(default)]
        class_names: Vec<String>,
        #[serde(default)]
        max_results: i64,
    },
    CountChildren { class_name: String, id: Id },
}

impl SliceCall for BusinessCall {
    type Slice = Business;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::CreateObject(_)
            | Self::CreateSpecialObject(_)
            | Self::CreateBulkObjects { .. }
            | Self::CreateBulkSpecialObjects { .. }
            | Self::UpdateObject { .. }
            | Self::DeleteObjects { .. }
            | Self::MoveObjects { .. }
            | Self::MoveSpecialObjects { .. }
            | Self::CopyObjects { .. }
            | Self::CopySpecialObjects { .. }
            | Self::CreateSpecialRelationship { .. }
            | Self::ReleaseSpecialRelationship { .. } => Requirement::write(FeatureSet::BUSINESS),
            _ => Requirement::read(FeatureSet::BUSINESS),
        }
    }

    #[allow(clippy::too_many_lines)]
    async fn execute(self, slice: &Business, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateObject(new) => create(slice, ctx, &new, false),
            Self::CreateSpecialObject(new) => create(slice, ctx, &new, true),
            Self::CreateBulkObjects { class_name, parent_class_name, parent_id, name_pattern, template_id } => {
                let new = NewObject { class_name, parent_class_name, parent_id, attributes: BTreeMap::new(), template_id };
                bulk(slice, ctx, &new, &name_pattern, false)
            },
            Self::CreateBulkSpecialObjects { class_name, parent_class_name, parent_id, name_pattern, template_id } => {
                let new = NewObject { class_name, parent_class_name, parent_id, attributes: BTreeMap::new(), template_id };
                bulk(slice, ctx, &new, &name_pattern, true)
            },
            Self::GetObject { class_name, id } => {
                reply(db.read(|t| objects::object(t, &class_name, &id).map(RemoteObject::from))?)
            },
            Self::GetObjectLight { class_name, id } => {
                reply(db.read(|t| objects::object(t, &class_name, &id).map(|o| o.light()))?)
            },
            Self::GetObjectsOfClassLight { class_name, max_results } => {
                reply(db.read(|t| navigation::objects_of_class(t, &class_name, max_results))?)
            },
            Self::GetObjectChildren { class_name, id, max_results } => {
                reply(db.read(|t| navigation::children(t, &class_name, &id, max_results))?)
            },
            Self::GetChildrenOfClassLight { parent_class_name, parent_id, class_to_filter, max_results } => {
                reply(db.read(|t| {
                    navigation::children_of_class(t, &parent_class_name, &parent_id, &class_to_filter, max_results)
                })?)
            },
            Self::GetObjectSpecialChildren { class_name, id } => {
                reply(db.read(|t| navigation::special_children(t, &class_name, &id))?)
            },
            Self::GetSiblings { class_name, id, max_results } => {
                reply(db.read(|t| navigation::siblings(t, &class_name, &id, max_results))?)
            },
            Self::GetParent { class_name, id } => reply(db.read(|t| navigation::parent(t, &class_name, &id))?),
            Self::GetParents { class_name, id } => reply(db.read(|t| navigation::parents(t, &class_name, &id))?),
            Self::GetParentsUntilFirstOfClass { class_name, id, classes } => {
                reply(db.read(|t| navigation::parents_until_first_of_class(t, &class_name, &id, &classes))?)
            },
            Self::GetFirstParentOfClass { class_name, id, parent_class_name } => {
                reply(db.read(|t| navigation::first_parent_of_class(t, &class_name, &id, &parent_class_name))?)
            },
            Self::GetCommonParent { a_class_name, a_id, b_class_name, b_id } => {
                let (a, b) = (ObjectKey::new(a_class_name, a_id), ObjectKey::new(b_class_name, b_id));
                reply(db.read(|t| navigation::common_parent(t, &a, &b))?)
            },
            Self::UpdateObject { class_name, id, attributes } => {
                let notes = db.write(|t| objects::update_object(t, Store::Objects, &class_name, &id, &attributes))?;
                ctx.record(ActivityType::UpdateInventoryObject, Some(&ObjectKey::new(class_name, id)), notes);
                reply(())
            },
            Self::DeleteObjects { objects, release_relationships } => {
                let removed =
                    db.write(|t| objects::delete_objects(t, Store::Objects, &objects, release_relationships))?;
                crate::discard_attachments(slice.attachments.as_ref(), &removed.files).await;
                for key in &objects {
                    ctx.record(
                        ActivityType::DeleteInventoryObject,
                        Some(key),
                        format!("{} objects removed", removed.objects.len()),
                    );
                }
                reply(())
            },
            Self::MoveObjects { target_class_name, target_id, objects } => {
                relocate(slice, ctx, &target_class_name, &target_id, &objects, false)
            },
            Self::MoveSpecialObjects { target_class_name, target_id, objects } => {
                relocate(slice, ctx, &target_class_name, &target_id, &objects, true)
            },
            Self::CopyObjects { target_class_name, target_id, objects, recursive } => {
                copy(slice, ctx, &target_class_name, &target_id, &objects, recursive, false)
            },
            Self::CopySpecialObjects { target_class_name, target_id, objects, recursive } => {
                copy(slice, ctx, &target_class_name, &target_id, &objects, recursive, true)
            },
            Self::CreateSpecialRelationship { a_class_name, a_id, b_class_name, b_id, name, unique, properties } => {
                let (a, b) = (ObjectKey::new(a_class_name, a_id), ObjectKey::new(b_class_name, b_id));
                let id = db.write(|t| relationships::create(t, &a, &b, &name, unique, properties))?;
                ctx.record(ActivityType::CreateRelationship, Some(&a), format!("{name} -> {b}"));
                reply(id)
            },
            Self::ReleaseSpecialRelationship { class_name, id, other_id, name } => {
                let key = ObjectKey::new(class_name, id);
                let released = db.write(|t| relationships::release(t, &key, &other_id, &name))?;
                ctx.record(ActivityType::ReleaseRelationship, Some(&key), format!("{released} {name} released"));
                reply(())
            },
            Self::GetSpecialAttribute { class_name, id, attribute_name } => {
                let key = ObjectKey::new(class_name, id);
                reply(db.read(|t| relationships::special_attribute(t, &key, &attribute_name))?)
            },
            Self::GetSpecialAttributes { class_name, id } => {
                let key = ObjectKey::new(class_name, id);
                reply(db.read(|t| relationships::special_attributes(t, &key))?)
            },
            Self::GetObjectsWithFilterLight { class_name, filter_name, filter_value } => {
                reply(db.read(|t| search::objects_with_filter(t, &class_name, &filter_name, &filter_value))?)
            },
            Self::GetSuggestedObjectsWithFilter { filter, class_names, page, limit } => {
                reply(db.read(|t| search::suggested_objects(t, &filter, &class_names, page, limit))?)
            },
            Self::GetAttributeValueAsString { class_name, id, attribute_name } => {
                reply(db.read(|t| search::attribute_value_as_string(t, &class_name, &id, &attribute_name))?)
            },
            Self::GetAttributeValuesAsString { class_name, id } => {
                reply(db.read(|t| search::attribute_values_as_string(t, &class_name, &id))?)
            },
            Self::GetObjectsByNameAndClassName { names, class_names, max_results } => {
                reply(db.read(|t| navigation::objects_by_name_and_class(t, &names, &class_names, max_results)))
            },
            Self::CountChildren { class_name, id } => reply(db.read(|t| navigation::count_children(t, &class_name, &id))?),
        }
    }
}

fn create(slice: &Business, ctx: &CallContext, new: &NewObject, special: bool) -> Result<Value, InventoryError> {
    let id = slice.database.write(|t| objects::create_object(t, Store::Objects, new, special))?;
    let key = ObjectKey::new(new.class_name.clone(), id.clone());
    ctx.record(ActivityType::CreateInventoryObject, Some(&key), format!("Under {}:{}", new.parent_class_name, new.parent_id));
    reply(id)
}

fn bulk(slice: &Business, ctx: &CallContext, new: &NewObject, pattern: &str, special: bool) -> Result<Value, InventoryError> {
    let ids = slice.database.write(|t| objects::create_bulk_objects(t, Store::Objects, new, pattern, special))?;
    for id in &ids {
        let key = ObjectKey::new(new.class_name.clone(), id.clone());
        ctx.record(ActivityType::CreateInventoryObject, Some(&key), format!("Pattern {pattern}"));
    }
    reply(ids)
}

fn relocate(
    slice: &Business,
    ctx: &CallContext,
    target_class: &str,
    target_id: &str,
    objects: &[ObjectKey],
    special: bool,
) -> Result<Value, InventoryError> {
    slice.database.write(|t| objects::move_objects(t, Store::Objects, target_class, target_id, objects, special))?;
    for key in objects {
        ctx.record(ActivityType::MoveObject, Some(key), format!("To {target_class}:{target_id}"));
    }
    reply(())
}

fn copy(
    slice: &Business,
    ctx: &CallContext,
    target_class: &str,
    target_id: &str,
    objects: &[ObjectKey],
    recursive: bool,
    special: bool,
) -> Result<Value, InventoryError> {
    let ids = slice
        .database
        .write(|t| objects::copy_objects(t, Store::Objects, target_class, target_id, objects, recursive, special))?;
    for (source, id) in objects.iter().zip(&ids) {
        let key = ObjectKey::new(source.class_name.clone(), id.clone());
        ctx.record(ActivityType::CreateInventoryObject, Some(&key), format!("Copy of {source}"));
    }
    reply(ids)
}
