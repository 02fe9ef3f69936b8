//! Special relationships between objects outside the containment tree.

use crate::navigation::sorted;
use crate::objects;
use kw_database::Tables;
use kw_domain::constants::ROOT_ID;
use kw_domain::model::application::BUSINESS_RULE_TYPE_RELATIONSHIP;
use kw_domain::model::inventory::Relationship;
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::new_id;
use std::collections::BTreeMap;

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}

/// Target classes the relationship rules allow for `name` links leaving `source_class`.
/// `None` when no rule mentions the pair, which leaves the link unrestricted.
fn allowed_targets(tables: &Tables, source_class: &str, name: &str) -> Option<Vec<String>> {
    let mut targets: Option<Vec<String>> = None;
    let constraints = tables
        .business_rules
        .values()
        .filter(|rule| rule.rule_type == BUSINESS_RULE_TYPE_RELATIONSHIP)
        .flat_map(|rule| rule.constraints.iter());
    for constraint in constraints {
        let mut parts = constraint.split(';').map(str::trim);
        let (Some(source), Some(relationship), Some(target)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        if relationship == name && tables.classes.is_subclass_of(source_class, source) {
            targets.get_or_insert_with(Vec::new).push(target.to_owned());
        }
    }
    targets
}

/// Checks that `a` may be linked to `b` through `name` and resolves both ends to their
/// stored keys.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::OperationNotPermitted`] for self links, malformed names, a second
///   `unique` link from `a`, or a target class the relationship rules do not allow.
pub fn validate(
    tables: &Tables,
    a: &ObjectKey,
    b: &ObjectKey,
    name: &str,
    unique: bool,
) -> Result<(ObjectKey, ObjectKey), InventoryError> {
    if a.id == b.id {
        return Err(InventoryError::not_permitted("An object can not be related to itself"));
    }
    if !valid_name(name) {
        return Err(InventoryError::not_permitted(format!(
            "Relationship name '{name}' must start with a lowercase letter followed by letters or digits"
        )));
    }
    let a = objects::object(tables, &a.class_name, &a.id)?.key();
    let b = objects::object(tables, &b.class_name, &b.id)?.key();
    if unique && tables.relationships.named(&a, name).next().is_some() {
        return Err(InventoryError::not_permitted(format!("Object {a} already has a {name} relationship")));
    }
    if let Some(targets) = allowed_targets(tables, &a.class_name, name)
        && !targets.iter().any(|t| tables.classes.is_subclass_of(&b.class_name, t))
    {
        return Err(InventoryError::not_permitted(format!(
            "The business rules do not allow a {name} relationship between {} and {}",
            a.class_name, b.class_name
        )));
    }
    Ok((a, b))
}

/// Stores a link already checked with [`validate`].
pub fn insert(tables: &mut Tables, a: ObjectKey, b: ObjectKey, name: &str, properties: BTreeMap<String, String>) -> Id {
    let id = new_id();
    tables.relationships.insert(Relationship { id: id.clone(), name: name.to_owned(), a, b, properties });
    id
}

/// Links `a` to `b` through `name`.
///
/// # Errors
/// See [`validate`].
pub fn create(
    tables: &mut Tables,
    a: &ObjectKey,
    b: &ObjectKey,
    name: &str,
    unique: bool,
    properties: BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    let (a, b) = validate(tables, a, b, name, unique)?;
    Ok(insert(tables, a, b, name, properties))
}

/// Releases the `name` links between an object and `other_id`; `-1` releases every link of
/// that name. Returns how many were released.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::InvalidArgument`] for an empty target id.
pub fn release(tables: &mut Tables, key: &ObjectKey, other_id: &str, name: &str) -> Result<usize, InventoryError> {
    if other_id.trim().is_empty() {
        return Err(InventoryError::invalid("The id of the related object is required"));
    }
    let key = objects::object(tables, &key.class_name, &key.id)?.key();
    if other_id == ROOT_ID {
        return Ok(tables.relationships.release(&key, name, None).len());
    }
    let others: Vec<ObjectKey> = tables
        .relationships
        .related(&key, name)
        .into_iter()
        .filter(|other| other.id == other_id)
        .collect();
    Ok(others.iter().map(|other| tables.relationships.release(&key, name, Some(other)).len()).sum())
}

/// Resolves a relationship end into a light object, wherever it is stored.
#[must_use]
pub fn light(tables: &Tables, key: &ObjectKey) -> Option<ObjectLight> {
    [&tables.objects, &tables.proxies, &tables.templates]
        .into_iter()
        .find_map(|store| store.get_by_key(key))
        .map(kw_domain::model::inventory::BusinessObject::light)
}

/// Objects linked to the given one through `name`.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn special_attribute(tables: &Tables, key: &ObjectKey, name: &str) -> Result<Vec<ObjectLight>, InventoryError> {
    let key = objects::object(tables, &key.class_name, &key.id)?.key();
    let lights = tables.relationships.related(&key, name).iter().filter_map(|other| light(tables, other)).collect();
    Ok(sorted(lights, 0))
}

/// Every relationship of an object, grouped by name.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn special_attributes(tables: &Tables, key: &ObjectKey) -> Result<BTreeMap<String, Vec<ObjectLight>>, InventoryError> {
    let key = objects::object(tables, &key.class_name, &key.id)?.key();
    let mut grouped: BTreeMap<String, Vec<ObjectLight>> = BTreeMap::new();
    for relationship in tables.relationships.of_object(&key) {
        if let Some(other) = relationship.other(&key).and_then(|other| light(tables, other)) {
            grouped.entry(relationship.name.clone()).or_default().push(other);
        }
    }
    for lights in grouped.values_mut() {
        lights.sort();
    }
    Ok(grouped)
}
