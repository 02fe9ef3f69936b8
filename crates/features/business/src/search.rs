//! Attribute rendering and object lookups by value.

use crate::navigation::sorted;
use crate::objects;
use chrono::DateTime;
use kw_database::Tables;
use kw_domain::constants::{ATTRIBUTE_CREATION_DATE, ATTRIBUTE_NAME};
use kw_domain::model::ObjectLight;
use kw_domain::model::inventory::BusinessObject;
use kw_domain::model::metadata::AttributeValue;
use kw_kernel::error::InventoryError;
use kw_kernel::validation;
use kw_metadata::schema;
use std::collections::BTreeMap;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_millis(millis: i64, format: &str) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(|| millis.to_string(), |d| d.format(format).to_string())
}

/// A value the way a person reads it: list items by name, dates formatted.
#[must_use]
pub fn display_value(tables: &Tables, value: &AttributeValue) -> String {
    match value {
        AttributeValue::ListItem(id) => tables.list_items.get(id).map_or_else(|| id.clone(), |item| item.name.clone()),
        AttributeValue::Date(millis) => format_millis(*millis, DATE_FORMAT),
        AttributeValue::Timestamp(millis) => format_millis(*millis, TIMESTAMP_FORMAT),
        other => other.to_string(),
    }
}

/// An attribute as text, `None` while unset.
pub fn readable(tables: &Tables, object: &BusinessObject, attribute: &str) -> Option<String> {
    match attribute {
        ATTRIBUTE_NAME => Some(object.name.clone()),
        ATTRIBUTE_CREATION_DATE => Some(format_millis(object.creation_date, TIMESTAMP_FORMAT)),
        _ => object.attributes.get(attribute).map(|v| display_value(tables, v)),
    }
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::InvalidArgument`] when the class has no such attribute.
pub fn attribute_value_as_string(
    tables: &Tables,
    class_name: &str,
    id: &str,
    attribute: &str,
) -> Result<String, InventoryError> {
    let object = objects::object(tables, class_name, id)?;
    if schema::effective_attribute(tables, &object.class_name, attribute).is_none() {
        return Err(InventoryError::invalid(format!("Class {} has no attribute named {attribute}", object.class_name)));
    }
    Ok(readable(tables, object, attribute).unwrap_or_default())
}

/// Every attribute holding a value, rendered for display.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn attribute_values_as_string(
    tables: &Tables,
    class_name: &str,
    id: &str,
) -> Result<BTreeMap<String, String>, InventoryError> {
    let object = objects::object(tables, class_name, id)?;
    Ok(schema::effective_attributes(tables, &object.class_name)
        .into_iter()
        .filter_map(|a| readable(tables, object, &a.name).map(|value| (a.name, value)))
        .collect())
}

/// Instances of `class_name` (and subclasses) whose attribute `attribute` reads exactly
/// `value`. List type attributes match either the item id or its name.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn objects_with_filter(
    tables: &Tables,
    class_name: &str,
    attribute: &str,
    value: &str,
) -> Result<Vec<ObjectLight>, InventoryError> {
    schema::class(tables, class_name)?;
    let lights = tables
        .objects
        .iter()
        .filter(|o| tables.classes.is_subclass_of(&o.class_name, class_name))
        .filter(|o| match attribute {
            ATTRIBUTE_NAME => o.name == value,
            _ => o.attributes.get(attribute).is_some_and(|stored| {
                stored.to_string() == value || display_value(tables, stored) == value
            }),
        })
        .map(BusinessObject::light)
        .collect();
    Ok(sorted(lights, 0))
}

/// Objects whose name or class contains `filter`, ignoring case, optionally restricted to
/// some classes and their subclasses.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for bad paging arguments.
pub fn suggested_objects(
    tables: &Tables,
    filter: &str,
    class_names: &[String],
    page: i64,
    limit: i64,
) -> Result<Vec<ObjectLight>, InventoryError> {
    let needle = filter.trim().to_lowercase();
    let matches = sorted(
        tables
            .objects
            .iter()
            .filter(|o| {
                class_names.is_empty() || class_names.iter().any(|c| tables.classes.is_subclass_of(&o.class_name, c))
            })
            .filter(|o| o.name.to_lowercase().contains(&needle) || o.class_name.to_lowercase().contains(&needle))
            .map(BusinessObject::light)
            .collect(),
        0,
    );
    validation::paginate(matches, page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::inventory::ParentRef;
    use kw_metadata::bootstrap::seed_core_model;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        tables.list_items.insert(BusinessObject {
            id: "cisco".to_owned(),
            class_name: "EquipmentVendor".to_owned(),
            name: "Cisco".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        tables.objects.insert(BusinessObject {
            id: "r1".to_owned(),
            class_name: "Router".to_owned(),
            name: "core-router".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::from([
                ("vendor".to_owned(), AttributeValue::ListItem("cisco".to_owned())),
                ("serialNumber".to_owned(), AttributeValue::String("FOC123".to_owned())),
            ]),
            creation_date: 0,
        });
        tables
    }

    #[test]
    fn list_items_render_by_name() {
        let tables = tables();
        assert_eq!(attribute_value_as_string(&tables, "Router", "r1", "vendor").unwrap(), "Cisco");
        assert_eq!(attribute_value_as_string(&tables, "Router", "r1", "description").unwrap(), "");
        assert!(attribute_value_as_string(&tables, "Router", "r1", "color").is_err());

        let all = attribute_values_as_string(&tables, "Router", "r1").unwrap();
        assert_eq!(all["serialNumber"], "FOC123");
        assert_eq!(all["creationDate"], "1970-01-01 00:00:00");
    }

    #[test]
    fn filters_match_ids_or_names() {
        let tables = tables();
        assert_eq!(objects_with_filter(&tables, "GenericCommunicationsElement", "vendor", "Cisco").unwrap().len(), 1);
        assert_eq!(objects_with_filter(&tables, "Router", "vendor", "cisco").unwrap().len(), 1);
        assert!(objects_with_filter(&tables, "Switch", "vendor", "Cisco").unwrap().is_empty());
    }

    #[test]
    fn suggestions_ignore_case() {
        let tables = tables();
        assert_eq!(suggested_objects(&tables, "CORE", &[], 1, 10).unwrap().len(), 1);
        assert_eq!(suggested_objects(&tables, "router", &["GenericPort".to_owned()], 1, 10).unwrap().len(), 0);
    }
}
