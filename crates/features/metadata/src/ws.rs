//! Web service operations of the class model.

use crate::attributes::{self, AttributeUpdate, NewAttribute};
use crate::classes::{self, ClassUpdate, NewClass};
use crate::{Metadata, containment, list_types, schema};
use kw_domain::model::ObjectKey;
use kw_domain::model::audit::ActivityType;
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
pub enum MetadataCall {
    CreateClass(NewClass),
    SetClassProperties(ClassUpdate),
    DeleteClass { class_name: String },
    GetClass { class_name: String },
    GetAllClasses {
        #[serde(default)]
        include_list_types: bool,
    },
    GetAllClassesLight {
        #[serde(default)]
        include_list_types: bool,
    },
    GetSubClassesLight {
        class_name: String,
        #[serde(default)]
        include_abstract_classes: bool,
        #[serde(default)]
        include_self: bool,
    },
    GetSubClassesLightNoRecursive {
        class_name: String,
        #[serde(default)]
        include_abstract_classes: bool,
        #[serde(default)]
        include_self: bool,
    },
    GetUpstreamClassHierarchy {
        class_name: String,
        #[serde(default)]
        include_self: bool,
    },
    IsSubclassOf { class_name: String, subclass_of: String },

    CreateAttribute { class_name: String, attribute: NewAttribute },
    SetAttributeProperties { class_name: String, attribute_id: String, properties: AttributeUpdate },
    DeleteAttribute { class_name: String, attribute_name: String },
    GetAttribute { class_name: String, attribute_name: String },
    GetMandatoryAttributesInClass { class_name: String },

    GetPossibleChildren { parent_class_name: String },
    GetPossibleChildrenNoRecursive { parent_class_name: String },
    GetPossibleSpecialChildren { parent_class_name: String },
    GetPossibleSpecialChildrenNoRecursive { parent_class_name: String },
    AddPossibleChildren { parent_class_name: String, new_possible_children: Vec<String> },
    AddPossibleSpecialChildren { parent_class_name: String, new_possible_special_children: Vec<String> },
    RemovePossibleChildren { parent_class_name: String, children_to_be_removed: Vec<String> },
    RemovePossibleSpecialChildren { parent_class_name: String, children_to_be_removed: Vec<String> },
    GetUpstreamContainmentHierarchy {
        class_name: String,
        #[serde(default)]
        recursive: bool,
    },

    CreateListTypeItem {
        class_name: String,
        name: String,
        #[serde(default)]
        display_name: String,
    },
    UpdateListTypeItem { class_name: String, id: String, attributes: BTreeMap<String, String> },
    DeleteListTypeItem {
        class_name: String,
        id: String,
        #[serde(default)]
        release_relationships: bool,
    },
    GetListTypeItem { class_name: String, id: String },
    GetListTypeItems { class_name: String },
    GetInstanceableListTypes {},
    GetListTypeItemUses {
        class_name: String,
        id: String,
        #[serde(default)]
        limit: i64,
    },
}

impl SliceCall for MetadataCall {
    type Slice = Metadata;

    fn operations() -> &'static [&'static str] {
        Self::VARIANTS
    }

    fn requirement(&self) -> Requirement {
        match self {
            Self::CreateClass(_)
            | Self::SetClassProperties(_)
            | Self::DeleteClass { .. }
            | Self::CreateAttribute { .. }
            | Self::SetAttributeProperties { .. }
            | Self::DeleteAttribute { .. }
            | Self::AddPossibleChildren { .. }
            | Self::AddPossibleSpecialChildren { .. }
            | Self::RemovePossibleChildren { .. }
            | Self::RemovePossibleSpecialChildren { .. }
            | Self::CreateListTypeItem { .. }
            | Self::UpdateListTypeItem { .. }
            | Self::DeleteListTypeItem { .. } => Requirement::write(FeatureSet::METADATA),
            _ => Requirement::read(FeatureSet::METADATA),
        }
    }

    async fn execute(self, slice: &Metadata, ctx: &CallContext) -> Result<Value, InventoryError> {
        let db = &slice.database;
        match self {
            Self::CreateClass(new) => {
                let name = new.class_name.clone();
                let id = db.write(|t| classes::create_class(t, new))?;
                ctx.record(ActivityType::CreateMetadataObject, None, format!("Class {name}"));
                reply(id)
            },
            Self::SetClassProperties(update) => {
                let id = update.class_id.clone();
                db.write(|t| classes::set_class_properties(t, update))?;
                ctx.record(ActivityType::UpdateMetadataObject, None, format!("Class {id}"));
                reply(())
            },
            Self::DeleteClass { class_name } => {
                db.write(|t| classes::delete_class(t, &class_name))?;
                ctx.record(ActivityType::DeleteMetadataObject, None, format!("Class {class_name}"));
                reply(())
            },
            Self::GetClass { class_name } => reply(db.read(|t| schema::resolved_class(t, &class_name))?),
            Self::GetAllClasses { include_list_types } => {
                reply(db.read(|t| classes::all_classes(t, include_list_types)))
            },
            Self::GetAllClassesLight { include_list_types } => {
                reply(db.read(|t| classes::all_classes_light(t, include_list_types)))
            },
            Self::GetSubClassesLight { class_name, include_abstract_classes, include_self } => reply(db.read(|t| {
                classes::subclasses_light(t, &class_name, include_abstract_classes, include_self, true)
            })?),
            Self::GetSubClassesLightNoRecursive { class_name, include_abstract_classes, include_self } => {
                reply(db.read(|t| {
                    classes::subclasses_light(t, &class_name, include_abstract_classes, include_self, false)
                })?)
            },
            Self::GetUpstreamClassHierarchy { class_name, include_self } => {
                reply(db.read(|t| classes::upstream_class_hierarchy(t, &class_name, include_self))?)
            },
            Self::IsSubclassOf { class_name, subclass_of } => {
                reply(db.read(|t| t.classes.is_subclass_of(&class_name, &subclass_of)))
            },

            Self::CreateAttribute { class_name, attribute } => {
                let name = attribute.name.clone();
                let id = db.write(|t| attributes::create_attribute(t, &class_name, attribute))?;
                ctx.record(ActivityType::CreateMetadataObject, None, format!("Attribute {class_name}.{name}"));
                reply(id)
            },
            Self::SetAttributeProperties { class_name, attribute_id, properties } => {
                db.write(|t| attributes::set_attribute_properties(t, &class_name, &attribute_id, properties))?;
                ctx.record(
                    ActivityType::UpdateMetadataObject,
                    None,
                    format!("Attribute {attribute_id} of {class_name}"),
                );
                reply(())
            },
            Self::DeleteAttribute { class_name, attribute_name } => {
                db.write(|t| attributes::delete_attribute(t, &class_name, &attribute_name))?;
                ctx.record(
                    ActivityType::DeleteMetadataObject,
                    None,
                    format!("Attribute {class_name}.{attribute_name}"),
                );
                reply(())
            },
            Self::GetAttribute { class_name, attribute_name } => {
                reply(db.read(|t| attributes::attribute(t, &class_name, &attribute_name))?)
            },
            Self::GetMandatoryAttributesInClass { class_name } => {
                reply(db.read(|t| attributes::mandatory_attributes(t, &class_name))?)
            },

            Self::GetPossibleChildren { parent_class_name } => {
                reply(db.read(|t| containment::possible_children(t, &parent_class_name, false))?)
            },
            Self::GetPossibleChildrenNoRecursive { parent_class_name } => {
                reply(db.read(|t| containment::possible_children_no_recursive(t, &parent_class_name, false))?)
            },
            Self::GetPossibleSpecialChildren { parent_class_name } => {
                reply(db.read(|t| containment::possible_children(t, &parent_class_name, true))?)
            },
            Self::GetPossibleSpecialChildrenNoRecursive { parent_class_name } => {
                reply(db.read(|t| containment::possible_children_no_recursive(t, &parent_class_name, true))?)
            },
            Self::AddPossibleChildren { parent_class_name, new_possible_children } => {
                db.write(|t| containment::add_possible_children(t, &parent_class_name, &new_possible_children, false))?;
                ctx.record(
                    ActivityType::UpdateMetadataObject,
                    None,
                    format!("Possible children of {parent_class_name}: {}", new_possible_children.join(", ")),
                );
                reply(())
            },
            Self::AddPossibleSpecialChildren { parent_class_name, new_possible_special_children } => {
                db.write(|t| {
                    containment::add_possible_children(t, &parent_class_name, &new_possible_special_children, true)
                })?;
                ctx.record(
                    ActivityType::UpdateMetadataObject,
                    None,
                    format!(
                        "Possible special children of {parent_class_name}: {}",
                        new_possible_special_children.join(", ")
                    ),
                );
                reply(())
            },
            Self::RemovePossibleChildren { parent_class_name, children_to_be_removed } => {
                db.write(|t| {
                    containment::remove_possible_children(t, &parent_class_name, &children_to_be_removed, false)
                })?;
                ctx.record(ActivityType::UpdateMetadataObject, None, format!("Possible children of {parent_class_name}"));
                reply(())
            },
            Self::RemovePossibleSpecialChildren { parent_class_name, children_to_be_removed } => {
                db.write(|t| {
                    containment::remove_possible_children(t, &parent_class_name, &children_to_be_removed, true)
                })?;
                ctx.record(
                    ActivityType::UpdateMetadataObject,
                    None,
                    format!("Possible special children of {parent_class_name}"),
                );
                reply(())
            },
            Self::GetUpstreamContainmentHierarchy { class_name, recursive } => {
                reply(db.read(|t| containment::upstream_containment_hierarchy(t, &class_name, recursive))?)
            },

            Self::CreateListTypeItem { class_name, name, display_name } => {
                let id = db.write(|t| list_types::create_item(t, &class_name, &name, &display_name))?;
                ctx.record(ActivityType::CreateApplicationObject, Some(&ObjectKey::new(&class_name, &id)), name);
                reply(id)
            },
            Self::UpdateListTypeItem { class_name, id, attributes } => {
                db.write(|t| list_types::update_item(t, &class_name, &id, &attributes))?;
                ctx.record(ActivityType::UpdateApplicationObject, Some(&ObjectKey::new(&class_name, &id)), "");
                reply(())
            },
            Self::DeleteListTypeItem { class_name, id, release_relationships } => {
                db.write(|t| list_types::delete_item(t, &class_name, &id, release_relationships))?;
                ctx.record(ActivityType::DeleteApplicationObject, Some(&ObjectKey::new(&class_name, &id)), "");
                reply(())
            },
            Self::GetListTypeItem { class_name, id } => reply(db.read(|t| list_types::get_item(t, &class_name, &id))?),
            Self::GetListTypeItems { class_name } => reply(db.read(|t| list_types::get_items(t, &class_name))?),
            Self::GetInstanceableListTypes {} => reply(db.read(list_types::instanceable_list_types)),
            Self::GetListTypeItemUses { class_name, id, limit } => {
                reply(db.read(|t| list_types::item_uses(t, &class_name, &id, limit))?)
            },
        }
    }
}
