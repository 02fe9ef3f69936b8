//! Read-only questions about the class model, shared by every slice that validates objects.

use kw_database::Tables;
use kw_domain::constants::{
    CLASS_DUMMY_ROOT, CLASS_GENERIC_OBJECT_LIST, CLASS_INVENTORY_OBJECT, ROOT_ID,
};
use kw_domain::model::metadata::{AttributeMetadata, ClassMetadata};
use kw_kernel::error::InventoryError;
use std::collections::BTreeSet;

/// Maps the aliases clients use for the containment root onto `DummyRoot`.
#[must_use]
pub fn normalize_parent_class(class_name: &str) -> &str {
    match class_name.trim() {
        "" | ROOT_ID => CLASS_DUMMY_ROOT,
        other => other,
    }
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn class<'a>(tables: &'a Tables, class_name: &str) -> Result<&'a ClassMetadata, InventoryError> {
    tables
        .classes
        .get(class_name)
        .ok_or_else(|| InventoryError::not_found(format!("Class {class_name} could not be found")))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown classes, [`InventoryError::InvalidArgument`] when
/// the class does not inherit from `ancestor`.
pub fn subclass_of<'a>(
    tables: &'a Tables,
    class_name: &str,
    ancestor: &str,
) -> Result<&'a ClassMetadata, InventoryError> {
    let found = class(tables, class_name)?;
    if tables.classes.is_subclass_of(class_name, ancestor) {
        Ok(found)
    } else {
        Err(InventoryError::invalid(format!("Class {class_name} is not a subclass of {ancestor}")))
    }
}

/// Like [`subclass_of`], also refusing abstract and in-design classes.
///
/// # Errors
/// See [`subclass_of`]; abstract or in-design classes are
/// [`InventoryError::OperationNotPermitted`].
pub fn instanceable<'a>(
    tables: &'a Tables,
    class_name: &str,
    ancestor: &str,
) -> Result<&'a ClassMetadata, InventoryError> {
    let found = subclass_of(tables, class_name, ancestor)?;
    if found.is_abstract {
        return Err(InventoryError::not_permitted(format!(
            "Abstract class {class_name} can not have instances"
        )));
    }
    if found.in_design {
        return Err(InventoryError::not_permitted(format!(
            "Class {class_name} is in design and can not have instances yet"
        )));
    }
    Ok(found)
}

#[must_use]
pub fn is_list_type(tables: &Tables, class_name: &str) -> bool {
    class_name != CLASS_GENERIC_OBJECT_LIST
        && tables.classes.is_subclass_of(class_name, CLASS_GENERIC_OBJECT_LIST)
}

#[must_use]
pub fn is_inventory_class(tables: &Tables, class_name: &str) -> bool {
    tables.classes.is_subclass_of(class_name, CLASS_INVENTORY_OBJECT)
}

/// Attributes of a class including inherited ones. A redefinition in a subclass replaces the
/// inherited attribute of the same name. Sorted by `order`, then name.
#[must_use]
pub fn effective_attributes(tables: &Tables, class_name: &str) -> Vec<AttributeMetadata> {
    let mut resolved: Vec<AttributeMetadata> = Vec::new();
    for ancestor in tables.classes.lineage(class_name).into_iter().rev() {
        for attribute in &ancestor.attributes {
            resolved.retain(|a| a.name != attribute.name);
            resolved.push(attribute.clone());
        }
    }
    resolved.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    resolved
}

#[must_use]
pub fn effective_attribute(
    tables: &Tables,
    class_name: &str,
    attribute: &str,
) -> Option<AttributeMetadata> {
    tables
        .classes
        .lineage(class_name)
        .into_iter()
        .find_map(|c| c.own_attribute(attribute).cloned())
}

/// The class with its inherited attributes merged in, as clients expect it.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn resolved_class(tables: &Tables, class_name: &str) -> Result<ClassMetadata, InventoryError> {
    let mut resolved = class(tables, class_name)?.clone();
    resolved.attributes = effective_attributes(tables, class_name);
    Ok(resolved)
}

/// Whether any stored record is an instance of exactly `class_name`.
#[must_use]
pub fn has_instances(tables: &Tables, class_name: &str) -> bool {
    tables.objects.count_of_class(class_name) > 0
        || tables.templates.count_of_class(class_name) > 0
        || tables.list_items.count_of_class(class_name) > 0
        || tables.proxies.count_of_class(class_name) > 0
}

/// Classes that may be contained by `parent_class`, following inheritance of the parent and
/// expanding abstract entries into their concrete subclasses.
#[must_use]
pub fn possible_children<'a>(
    tables: &'a Tables,
    parent_class: &str,
    special: bool,
) -> Vec<&'a ClassMetadata> {
    let mut seen = BTreeSet::new();
    let mut result = Vec::new();
    for ancestor in tables.classes.lineage(normalize_parent_class(parent_class)) {
        let entries = if special {
            &ancestor.possible_special_children
        } else {
            &ancestor.possible_children
        };
        for entry in entries {
            let Some(entry_class) = tables.classes.get(entry) else {
                continue;
            };
            let expanded = if entry_class.is_abstract {
                tables.classes.all_subclasses(entry).into_iter().filter(|c| !c.is_abstract).collect()
            } else {
                vec![entry_class]
            };
            for child in expanded {
                if seen.insert(child.name.clone()) {
                    result.push(child);
                }
            }
        }
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    result
}

#[must_use]
pub fn can_contain(tables: &Tables, parent_class: &str, child_class: &str, special: bool) -> bool {
    possible_children(tables, parent_class, special).iter().any(|c| c.name == child_class)
}

/// # Errors
/// [`InventoryError::OperationNotPermitted`] when the containment rules forbid it.
pub fn ensure_can_contain(
    tables: &Tables,
    parent_class: &str,
    child_class: &str,
    special: bool,
) -> Result<(), InventoryError> {
    if can_contain(tables, parent_class, child_class, special) {
        return Ok(());
    }
    let kind = if special { "special child" } else { "child" };
    Err(InventoryError::not_permitted(format!(
        "An instance of {child_class} can not be a {kind} of an instance of {}",
        normalize_parent_class(parent_class)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::seed_core_model;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        tables
    }

    #[test]
    fn abstract_entries_expand_to_concrete_subclasses() {
        let tables = tables();
        let names: Vec<_> =
            possible_children(&tables, "Rack", false).iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, ["Router", "Switch"]);
        assert!(can_contain(&tables, "Router", "OpticalPort", false));
        assert!(can_contain(&tables, "-1", "Country", false));
        assert!(!can_contain(&tables, "Country", "Router", false));
    }

    #[test]
    fn inherited_attributes_are_resolved() {
        let tables = tables();
        let names: Vec<_> =
            effective_attributes(&tables, "Router").into_iter().map(|a| a.name).collect();
        assert!(names.contains(&"name".to_owned()));
        assert!(names.contains(&"vendor".to_owned()));
        assert!(effective_attribute(&tables, "SubnetIPv4", "networkIp").is_some());
    }

    #[test]
    fn abstract_classes_are_not_instanceable() {
        let tables = tables();
        assert!(instanceable(&tables, "Router", CLASS_INVENTORY_OBJECT).is_ok());
        assert!(matches!(
            instanceable(&tables, "GenericPort", CLASS_INVENTORY_OBJECT),
            Err(InventoryError::OperationNotPermitted { .. })
        ));
        assert!(matches!(
            instanceable(&tables, "TechnicalContact", CLASS_INVENTORY_OBJECT),
            Err(InventoryError::InvalidArgument { .. })
        ));
    }
}
