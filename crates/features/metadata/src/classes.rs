use crate::schema::{self, has_instances, is_list_type};
use kw_database::Tables;
use kw_domain::constants::{CLASS_DUMMY_ROOT, CORE_CLASSES};
use kw_domain::model::Id;
use kw_domain::model::metadata::{AttributeType, ClassLight, ClassMetadata};
use kw_kernel::error::InventoryError;
use kw_kernel::validation;
use kw_kernel::{new_id, now_millis};
use serde::Deserialize;

const fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    pub class_name: String,
    pub parent_class_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default = "yes")]
    pub is_custom: bool,
    #[serde(default = "yes")]
    pub is_countable: bool,
    #[serde(default)]
    pub is_in_design: bool,
    #[serde(default)]
    pub color: i32,
}

/// Changes to a class; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdate {
    pub class_id: Id,
    pub class_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<i32>,
    pub is_abstract: Option<bool>,
    pub is_in_design: Option<bool>,
    pub is_custom: Option<bool>,
    pub is_countable: Option<bool>,
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for malformed or duplicated names.
/// * [`InventoryError::NotFound`] when the parent class does not exist.
pub fn create_class(tables: &mut Tables, new: NewClass) -> Result<Id, InventoryError> {
    let name = validation::identifier(&new.class_name, "Class name")?.to_owned();
    if tables.classes.contains(&name) {
        return Err(InventoryError::invalid(format!("Class {name} already exists")));
    }
    let parent = schema::class(tables, &new.parent_class_name)?;
    if parent.name == CLASS_DUMMY_ROOT {
        return Err(InventoryError::not_permitted("DummyRoot can not be subclassed"));
    }
    let parent_name = parent.name.clone();

    let id = new_id();
    tables.classes.insert(ClassMetadata {
        id: id.clone(),
        display_name: if new.display_name.trim().is_empty() { name.clone() } else { new.display_name },
        name,
        description: new.description,
        parent_class_name: Some(parent_name),
        is_abstract: new.is_abstract,
        custom: new.is_custom,
        countable: new.is_countable,
        in_design: new.is_in_design,
        color: new.color,
        attributes: Vec::new(),
        possible_children: Vec::new(),
        possible_special_children: Vec::new(),
        creation_date: now_millis(),
    });
    Ok(id)
}

/// Renaming is only allowed for classes without instances; the new name is propagated to
/// subclasses, containment rules, list-type attributes, pools, validators and reports.
///
/// # Errors
/// * [`InventoryError::NotFound`] for an unknown class id.
/// * [`InventoryError::OperationNotPermitted`] when renaming a core class or a class with
///   instances, or turning a class with instances abstract.
pub fn set_class_properties(tables: &mut Tables, update: ClassUpdate) -> Result<(), InventoryError> {
    let current = tables
        .classes
        .get_by_id(&update.class_id)
        .ok_or_else(|| InventoryError::not_found(format!("Class with id {} could not be found", update.class_id)))?;
    let old_name = current.name.clone();

    let new_name = match update.class_name.as_deref() {
        Some(requested) if requested.trim() != old_name => {
            let requested = validation::identifier(requested, "Class name")?.to_owned();
            if tables.classes.contains(&requested) {
                return Err(InventoryError::invalid(format!("Class {requested} already exists")));
            }
            if CORE_CLASSES.contains(&old_name.as_str()) {
                return Err(InventoryError::not_permitted(format!("Core class {old_name} can not be renamed")));
            }
            if has_instances(tables, &old_name) {
                return Err(InventoryError::not_permitted(format!(
                    "Class {old_name} has instances and can not be renamed"
                )));
            }
            Some(requested)
        },
        _ => None,
    };
    if update.is_abstract == Some(true) && has_instances(tables, &old_name) {
        return Err(InventoryError::not_permitted(format!(
            "Class {old_name} has instances and can not be made abstract"
        )));
    }

    tables.classes.edit(&old_name, |class| {
        if let Some(name) = &new_name {
            class.name.clone_from(name);
        }
        if let Some(display_name) = update.display_name {
            class.display_name = display_name;
        }
        if let Some(description) = update.description {
            class.description = description;
        }
        if let Some(color) = update.color {
            class.color = color;
        }
        if let Some(is_abstract) = update.is_abstract {
            class.is_abstract = is_abstract;
        }
        if let Some(in_design) = update.is_in_design {
            class.in_design = in_design;
        }
        if let Some(custom) = update.is_custom {
            class.custom = custom;
        }
        if let Some(countable) = update.is_countable {
            class.countable = countable;
        }
    });

    if let Some(new_name) = new_name {
        propagate_rename(tables, &old_name, &new_name);
    }
    Ok(())
}

fn propagate_rename(tables: &mut Tables, old: &str, new: &str) {
    let names: Vec<String> = tables.classes.iter().map(|c| c.name.clone()).collect();
    for name in names {
        tables.classes.edit(&name, |class| {
            for entry in class.possible_children.iter_mut().chain(class.possible_special_children.iter_mut()) {
                if entry == old {
                    new.clone_into(entry);
                }
            }
            for attribute in &mut class.attributes {
                if attribute.attribute_type == AttributeType::ListType(old.to_owned()) {
                    attribute.attribute_type = AttributeType::ListType(new.to_owned());
                }
            }
        });
    }
    for pool in tables.pools.values_mut().filter(|p| p.class_name == old) {
        new.clone_into(&mut pool.class_name);
    }
    for validator in tables.validators.values_mut().filter(|v| v.class_name == old) {
        new.clone_into(&mut validator.class_name);
    }
    for report in tables.reports.values_mut() {
        if report.class_name.as_deref() == Some(old) {
            report.class_name = Some(new.to_owned());
        }
    }
}

/// # Errors
/// [`InventoryError::OperationNotPermitted`] for core classes, classes with instances or
/// subclasses, classes used by pools and list types used as attribute types.
pub fn delete_class(tables: &mut Tables, class_name: &str) -> Result<(), InventoryError> {
    schema::class(tables, class_name)?;
    if CORE_CLASSES.contains(&class_name) {
        return Err(InventoryError::not_permitted(format!("Core class {class_name} can not be deleted")));
    }
    if has_instances(tables, class_name) {
        return Err(InventoryError::not_permitted(format!("Class {class_name} has instances")));
    }
    if tables.classes.direct_subclasses(class_name).next().is_some() {
        return Err(InventoryError::not_permitted(format!("Class {class_name} has subclasses")));
    }
    if tables.pools.values().any(|p| p.class_name == class_name) {
        return Err(InventoryError::not_permitted(format!("Class {class_name} is used by pools")));
    }
    if is_list_type(tables, class_name) {
        let list_type = AttributeType::ListType(class_name.to_owned());
        if let Some(user) = tables.classes.iter().find(|c| c.attributes.iter().any(|a| a.attribute_type == list_type)) {
            return Err(InventoryError::not_permitted(format!(
                "List type {class_name} is used as an attribute type in class {}",
                user.name
            )));
        }
    }

    let names: Vec<String> = tables.classes.iter().map(|c| c.name.clone()).collect();
    for name in names {
        tables.classes.edit(&name, |class| {
            class.possible_children.retain(|c| c != class_name);
            class.possible_special_children.retain(|c| c != class_name);
        });
    }
    tables.validators.retain(|_, v| v.class_name != class_name);
    tables.classes.remove(class_name);
    Ok(())
}

/// Every class with inherited attributes resolved.
#[must_use]
pub fn all_classes(tables: &Tables, include_list_types: bool) -> Vec<ClassMetadata> {
    tables
        .classes
        .iter()
        .filter(|c| include_list_types || !is_list_type(tables, &c.name))
        .filter_map(|c| schema::resolved_class(tables, &c.name).ok())
        .collect()
}

#[must_use]
pub fn all_classes_light(tables: &Tables, include_list_types: bool) -> Vec<ClassLight> {
    tables
        .classes
        .iter()
        .filter(|c| include_list_types || !is_list_type(tables, &c.name))
        .map(ClassLight::from)
        .collect()
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn subclasses_light(
    tables: &Tables,
    class_name: &str,
    include_abstract: bool,
    include_self: bool,
    recursive: bool,
) -> Result<Vec<ClassLight>, InventoryError> {
    let root = schema::class(tables, class_name)?;
    let mut found: Vec<&ClassMetadata> = if recursive {
        tables.classes.all_subclasses(class_name)
    } else {
        tables.classes.direct_subclasses(class_name).collect()
    };
    if include_self {
        found.insert(0, root);
    }
    Ok(found
        .into_iter()
        .filter(|c| include_abstract || !c.is_abstract)
        .map(ClassLight::from)
        .collect())
}

/// Ancestors of `class_name`, nearest first.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn upstream_class_hierarchy(
    tables: &Tables,
    class_name: &str,
    include_self: bool,
) -> Result<Vec<ClassLight>, InventoryError> {
    schema::class(tables, class_name)?;
    Ok(tables
        .classes
        .lineage(class_name)
        .into_iter()
        .skip(usize::from(!include_self))
        .map(ClassLight::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::seed_core_model;
    use kw_domain::model::inventory::{BusinessObject, ParentRef};
    use std::collections::BTreeMap;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        tables
    }

    fn new_class(name: &str, parent: &str) -> NewClass {
        NewClass {
            class_name: name.to_owned(),
            parent_class_name: parent.to_owned(),
            display_name: String::new(),
            description: String::new(),
            is_abstract: false,
            is_custom: true,
            is_countable: true,
            is_in_design: false,
            color: 0,
        }
    }

    #[test]
    fn created_classes_join_the_hierarchy() {
        let mut tables = tables();
        create_class(&mut tables, new_class("Antenna", "GenericCommunicationsElement")).unwrap();

        let class = tables.classes.get("Antenna").unwrap();
        assert!(class.custom);
        assert_eq!(class.display_name, "Antenna");
        assert!(tables.classes.is_subclass_of("Antenna", "InventoryObject"));

        let err = create_class(&mut tables, new_class("Antenna", "InventoryObject")).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument { .. }));
        let err = create_class(&mut tables, new_class("Bad Name", "InventoryObject")).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument { .. }));
        let err = create_class(&mut tables, new_class("Orphan", "Nowhere")).unwrap_err();
        assert!(matches!(err, InventoryError::NotFound { .. }));
    }

    #[test]
    fn rename_propagates_to_containment() {
        let mut tables = tables();
        create_class(&mut tables, new_class("Shelf", "GenericPhysicalNode")).unwrap();
        tables.classes.edit("Rack", |c| c.possible_children.push("Shelf".to_owned()));
        let id = tables.classes.get("Shelf").unwrap().id.clone();

        set_class_properties(
            &mut tables,
            ClassUpdate { class_id: id, class_name: Some("Subrack".to_owned()), ..ClassUpdate::default() },
        )
        .unwrap();

        assert!(tables.classes.get("Rack").unwrap().possible_children.contains(&"Subrack".to_owned()));
        assert!(!tables.classes.contains("Shelf"));
    }

    #[test]
    fn classes_with_instances_are_protected() {
        let mut tables = tables();
        tables.objects.insert(BusinessObject {
            id: "r1".to_owned(),
            class_name: "Router".to_owned(),
            name: "r1".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        let id = tables.classes.get("Router").unwrap().id.clone();
        let rename =
            ClassUpdate { class_id: id, class_name: Some("Gateway".to_owned()), ..ClassUpdate::default() };
        assert!(matches!(
            set_class_properties(&mut tables, rename),
            Err(InventoryError::OperationNotPermitted { .. })
        ));
        assert!(matches!(delete_class(&mut tables, "Router"), Err(InventoryError::OperationNotPermitted { .. })));
        assert!(matches!(delete_class(&mut tables, "GenericPort"), Err(InventoryError::OperationNotPermitted { .. })));
    }

    #[test]
    fn used_list_types_can_not_be_deleted() {
        let mut tables = tables();
        assert!(delete_class(&mut tables, "EquipmentVendor").is_err());
        delete_class(&mut tables, "Switch").unwrap();
        assert!(!tables.classes.contains("Switch"));
    }

    #[test]
    fn hierarchy_queries() {
        let tables = tables();
        let upstream: Vec<_> = upstream_class_hierarchy(&tables, "OpticalPort", false)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(upstream, ["GenericPort", "InventoryObject", "RootObject"]);

        let concrete = subclasses_light(&tables, "GenericPort", false, true, true).unwrap();
        assert_eq!(concrete.len(), 2);
        let direct = subclasses_light(&tables, "InventoryObject", true, false, false).unwrap();
        assert!(direct.iter().any(|c| c.name == "GenericPort"));
        assert!(!direct.iter().any(|c| c.name == "OpticalPort"));
    }
}
