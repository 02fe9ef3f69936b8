use crate::schema::{self, can_contain, is_inventory_class, normalize_parent_class};
use kw_database::Tables;
use kw_domain::constants::CLASS_DUMMY_ROOT;
use kw_domain::model::metadata::{ClassLight, ClassMetadata};
use kw_kernel::error::InventoryError;
use std::collections::{BTreeSet, VecDeque};

fn entries(class: &ClassMetadata, special: bool) -> &Vec<String> {
    if special { &class.possible_special_children } else { &class.possible_children }
}

/// Classes that instances of `parent_class` may hold, inherited and with abstract entries
/// expanded.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn possible_children(
    tables: &Tables,
    parent_class: &str,
    special: bool,
) -> Result<Vec<ClassLight>, InventoryError> {
    schema::class(tables, normalize_parent_class(parent_class))?;
    Ok(schema::possible_children(tables, parent_class, special).into_iter().map(ClassLight::from).collect())
}

/// Only the entries declared by `parent_class` itself, as stored.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn possible_children_no_recursive(
    tables: &Tables,
    parent_class: &str,
    special: bool,
) -> Result<Vec<ClassLight>, InventoryError> {
    let parent = schema::class(tables, normalize_parent_class(parent_class))?;
    Ok(entries(parent, special)
        .iter()
        .filter_map(|name| tables.classes.get(name))
        .map(ClassLight::from)
        .collect())
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes.
/// * [`InventoryError::OperationNotPermitted`] when a child is not an inventory class or
///   is already possible.
pub fn add_possible_children(
    tables: &mut Tables,
    parent_class: &str,
    children: &[String],
    special: bool,
) -> Result<(), InventoryError> {
    let parent_name = schema::class(tables, normalize_parent_class(parent_class))?.name.clone();
    let declared_above: BTreeSet<&str> = tables
        .classes
        .lineage(&parent_name)
        .into_iter()
        .flat_map(|c| entries(c, special).iter().map(String::as_str))
        .collect();

    let mut accepted: Vec<String> = Vec::new();
    for child in children {
        let child_class = schema::class(tables, child)?;
        if !is_inventory_class(tables, &child_class.name) {
            return Err(InventoryError::not_permitted(format!(
                "{child} is not a subclass of InventoryObject and can not be contained"
            )));
        }
        let already = declared_above.contains(child.as_str())
            || (!child_class.is_abstract && can_contain(tables, &parent_name, child, special))
            || accepted.contains(child);
        if already {
            return Err(InventoryError::not_permitted(format!(
                "{child} is already a possible child of {parent_name}"
            )));
        }
        accepted.push(child.clone());
    }

    tables.classes.edit(&parent_name, |class| {
        let target = if special { &mut class.possible_special_children } else { &mut class.possible_children };
        target.extend(accepted);
    });
    Ok(())
}

/// Removes entries declared by `parent_class`. Names that are not there are ignored.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown parent classes.
pub fn remove_possible_children(
    tables: &mut Tables,
    parent_class: &str,
    children: &[String],
    special: bool,
) -> Result<(), InventoryError> {
    let parent_name = schema::class(tables, normalize_parent_class(parent_class))?.name.clone();
    tables.classes.edit(&parent_name, |class| {
        let target = if special { &mut class.possible_special_children } else { &mut class.possible_children };
        target.retain(|entry| !children.contains(entry));
    });
    Ok(())
}

/// Classes whose instances may contain an instance of `class_name`. With `recursive`, also
/// the classes that may contain those, up to `DummyRoot`.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn upstream_containment_hierarchy(
    tables: &Tables,
    class_name: &str,
    recursive: bool,
) -> Result<Vec<ClassLight>, InventoryError> {
    schema::class(tables, class_name)?;
    let containers = |child: &str| -> Vec<&ClassMetadata> {
        tables
            .classes
            .iter()
            .filter(|c| !c.is_abstract && can_contain(tables, &c.name, child, false))
            .collect()
    };

    let mut seen = BTreeSet::from([class_name.to_owned()]);
    let mut result = Vec::new();
    let mut pending = VecDeque::from([class_name.to_owned()]);
    while let Some(current) = pending.pop_front() {
        for container in containers(&current) {
            if !seen.insert(container.name.clone()) {
                continue;
            }
            result.push(ClassLight::from(container));
            if recursive && container.name != CLASS_DUMMY_ROOT {
                pending.push_back(container.name.clone());
            }
        }
        if !recursive {
            break;
        }
    }
    Ok(result)
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

    fn names(classes: &[ClassLight]) -> Vec<&str> {
        classes.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn recursive_and_declared_views_differ() {
        let tables = tables();
        let declared = possible_children_no_recursive(&tables, "Rack", false).unwrap();
        assert_eq!(names(&declared), ["GenericCommunicationsElement"]);
        let expanded = possible_children(&tables, "Rack", false).unwrap();
        assert_eq!(names(&expanded), ["Router", "Switch"]);
        let special = possible_children(&tables, "Router", true).unwrap();
        assert!(names(&special).contains(&"OpticalLink"));
        assert!(names(&special).contains(&"VLAN"));
    }

    #[test]
    fn adding_checks_for_duplicates_and_inventory_classes() {
        let mut tables = tables();
        let err = add_possible_children(&mut tables, "Rack", &["Router".to_owned()], false).unwrap_err();
        assert!(matches!(err, InventoryError::OperationNotPermitted { .. }));
        let err = add_possible_children(&mut tables, "Room", &["TechnicalContact".to_owned()], false).unwrap_err();
        assert!(matches!(err, InventoryError::OperationNotPermitted { .. }));

        add_possible_children(&mut tables, "-1", &["City".to_owned()], false).unwrap();
        assert!(can_contain(&tables, "DummyRoot", "City", false));

        remove_possible_children(&mut tables, "", &["City".to_owned(), "Nothing".to_owned()], false).unwrap();
        assert!(!can_contain(&tables, "DummyRoot", "City", false));
    }

    #[test]
    fn upstream_walks_to_the_root() {
        let tables = tables();
        let direct = upstream_containment_hierarchy(&tables, "Rack", false).unwrap();
        assert_eq!(names(&direct), ["Building", "Room"]);

        let all = upstream_containment_hierarchy(&tables, "Router", true).unwrap();
        let all = names(&all);
        assert!(all.contains(&"Rack"));
        assert!(all.contains(&"Country"));
        assert!(all.contains(&"DummyRoot"));
    }
}
