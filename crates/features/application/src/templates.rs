//! Templates: trees of prototype objects copied when an object is created from them.
//!
//! A template is the root element of such a tree. Its elements follow the same containment
//! and attribute rules as inventory objects, they just live in their own table.

use kw_business::navigation::sorted;
use kw_business::objects::{self, NewObject, Store};
use kw_database::Tables;
use kw_domain::constants::{ATTRIBUTE_NAME, CLASS_INVENTORY_OBJECT};
use kw_domain::model::inventory::{BusinessObject, ParentRef};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, now_millis, validation};
use kw_metadata::schema;
use kw_metadata::values::RemoteObject;
use std::collections::BTreeMap;

/// Creates the root element of a new template.
///
/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank names.
/// * [`InventoryError::NotFound`] for unknown classes.
/// * [`InventoryError::OperationNotPermitted`] for abstract or non inventory classes.
pub fn create_template(tables: &mut Tables, class_name: &str, name: &str) -> Result<Id, InventoryError> {
    let name = validation::not_blank(name, "The template name")?;
    schema::instanceable(tables, class_name, CLASS_INVENTORY_OBJECT)?;
    let id = new_id();
    tables.templates.insert(BusinessObject {
        id: id.clone(),
        class_name: class_name.to_owned(),
        name: name.to_owned(),
        parent: ParentRef::Root,
        attributes: BTreeMap::new(),
        creation_date: now_millis(),
    });
    Ok(id)
}

fn element_under(class_name: &str, parent_class: &str, parent_id: &str, name: &str) -> Result<NewObject, InventoryError> {
    if objects::is_root(parent_class, parent_id) {
        return Err(InventoryError::invalid("Template elements hang from another template element"));
    }
    Ok(NewObject {
        class_name: class_name.to_owned(),
        parent_class_name: parent_class.to_owned(),
        parent_id: parent_id.to_owned(),
        attributes: BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())]),
        template_id: None,
    })
}

/// Creates a regular or special child of a template element.
///
/// # Errors
/// * [`InventoryError::InvalidArgument`] for root parents.
/// * Everything object creation reports, applied to the template table.
pub fn create_element(
    tables: &mut Tables,
    class_name: &str,
    parent_class: &str,
    parent_id: &str,
    name: &str,
    special: bool,
) -> Result<Id, InventoryError> {
    let new = element_under(class_name, parent_class, parent_id, name)?;
    objects::create_object(tables, Store::Templates, &new, special)
}

/// Creates one element per name `pattern` expands to.
///
/// # Errors
/// As [`create_element`], plus pattern errors.
pub fn create_bulk_elements(
    tables: &mut Tables,
    class_name: &str,
    parent_class: &str,
    parent_id: &str,
    pattern: &str,
    special: bool,
) -> Result<Vec<Id>, InventoryError> {
    let new = element_under(class_name, parent_class, parent_id, "")?;
    objects::create_bulk_objects(tables, Store::Templates, &new, pattern, special)
}

/// # Errors
/// Everything an object update reports, applied to the template table.
pub fn update_element(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<String, InventoryError> {
    objects::update_object(tables, Store::Templates, class_name, id, attributes)
}

/// Deletes an element and everything below it. Returns how many elements went away.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown elements.
pub fn delete_element(tables: &mut Tables, class_name: &str, id: &str) -> Result<usize, InventoryError> {
    let key = objects::find(tables, Store::Templates, class_name, id)?.key();
    Ok(objects::delete_objects(tables, Store::Templates, &[key], true)?.objects.len())
}

/// Templates whose root is an instance of exactly `class_name`.
#[must_use]
pub fn templates_for_class(tables: &Tables, class_name: &str) -> Vec<ObjectLight> {
    let lights = tables
        .templates
        .children_of(&ParentRef::Root)
        .filter(|t| t.class_name == class_name)
        .map(BusinessObject::light)
        .collect();
    sorted(lights, 0)
}

fn element_children_of(
    tables: &Tables,
    class_name: &str,
    id: &str,
    special: bool,
) -> Result<Vec<ObjectLight>, InventoryError> {
    let key = objects::find(tables, Store::Templates, class_name, id)?.key();
    let parent = if special { ParentRef::Special(key) } else { ParentRef::Child(key) };
    Ok(sorted(tables.templates.children_of(&parent).map(BusinessObject::light).collect(), 0))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown elements.
pub fn element_children(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<ObjectLight>, InventoryError> {
    element_children_of(tables, class_name, id, false)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown elements.
pub fn special_element_children(
    tables: &Tables,
    class_name: &str,
    id: &str,
) -> Result<Vec<ObjectLight>, InventoryError> {
    element_children_of(tables, class_name, id, true)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown elements.
pub fn element(tables: &Tables, class_name: &str, id: &str) -> Result<RemoteObject, InventoryError> {
    Ok(RemoteObject::from(objects::find(tables, Store::Templates, class_name, id)?))
}

/// Copies elements with their subtrees under another element.
///
/// # Errors
/// Everything an object copy reports, applied to the template table.
pub fn copy_elements(
    tables: &mut Tables,
    sources: &[ObjectKey],
    parent_class: &str,
    parent_id: &str,
    special: bool,
) -> Result<Vec<Id>, InventoryError> {
    objects::copy_objects(tables, Store::Templates, parent_class, parent_id, sources, true, special)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_metadata::bootstrap::seed_core_model;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        tables
    }

    #[test]
    fn templates_grow_like_the_inventory() {
        let mut tables = tables();
        let router = create_template(&mut tables, "Router", "Edge router").unwrap();
        let ports = create_bulk_elements(&mut tables, "OpticalPort", "Router", &router, "ge-[sequence(0,3)]", false)
            .unwrap();
        assert_eq!(ports.len(), 4);
        assert_eq!(element_children(&tables, "Router", &router).unwrap().len(), 4);

        let refused = create_element(&mut tables, "Building", "Router", &router, "hq", false);
        assert!(matches!(refused, Err(InventoryError::OperationNotPermitted { .. })));
        assert!(create_element(&mut tables, "OpticalPort", "DummyRoot", "-1", "loose", false).is_err());

        assert_eq!(templates_for_class(&tables, "Router")[0].name, "Edge router");
        assert!(templates_for_class(&tables, "Switch").is_empty());
        assert_eq!(tables.objects.len(), 0);
    }

    #[test]
    fn elements_are_copied_and_deleted_with_their_subtrees() {
        let mut tables = tables();
        let first = create_template(&mut tables, "Router", "First").unwrap();
        let second = create_template(&mut tables, "Router", "Second").unwrap();
        let port = create_element(&mut tables, "OpticalPort", "Router", &first, "ge-0", false).unwrap();
        create_element(&mut tables, "VirtualPort", "OpticalPort", &port, "ge-0.100", false).unwrap();

        let copies =
            copy_elements(&mut tables, &[ObjectKey::new("OpticalPort", port.clone())], "Router", &second, false).unwrap();
        assert_eq!(element_children(&tables, "OpticalPort", &copies[0]).unwrap()[0].name, "ge-0.100");

        assert_eq!(delete_element(&mut tables, "Router", &first).unwrap(), 3);
        assert!(element(&tables, "OpticalPort", &port).is_err());
        assert_eq!(tables.templates.len(), 3);
    }

    #[test]
    fn abstract_classes_have_no_templates() {
        let mut tables = tables();
        assert!(create_template(&mut tables, "GenericPort", "any").is_err());
        assert!(create_template(&mut tables, "Router", " ").is_err());
    }
}
