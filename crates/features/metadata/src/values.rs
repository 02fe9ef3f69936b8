//! Conversion between the string attribute maps of the web service and typed values.

use crate::schema;
use kw_database::Tables;
use kw_domain::constants::{ATTRIBUTE_CREATION_DATE, ATTRIBUTE_NAME};
use kw_domain::model::inventory::BusinessObject;
use kw_domain::model::metadata::{AttributeMetadata, AttributeType, AttributeValue};
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use serde::Serialize;
use std::collections::BTreeMap;

/// An object with its attributes rendered as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    pub id: Id,
    pub class_name: String,
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl From<&BusinessObject> for RemoteObject {
    fn from(object: &BusinessObject) -> Self {
        let mut attributes: BTreeMap<String, String> =
            object.attributes.iter().map(|(k, v)| (k.clone(), v.to_string())).collect();
        attributes.insert(ATTRIBUTE_NAME.to_owned(), object.name.clone());
        attributes.insert(ATTRIBUTE_CREATION_DATE.to_owned(), object.creation_date.to_string());
        Self {
            id: object.id.clone(),
            class_name: object.class_name.clone(),
            name: object.name.clone(),
            attributes,
        }
    }
}

/// A validated attribute update. `None` values clear the attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeChanges {
    pub name: Option<String>,
    pub values: BTreeMap<String, Option<AttributeValue>>,
}

impl AttributeChanges {
    /// Writes the changes into `object`.
    pub fn apply(self, object: &mut BusinessObject) {
        if let Some(name) = self.name {
            object.name = name;
        }
        for (attribute, value) in self.values {
            match value {
                Some(value) => object.attributes.insert(attribute, value),
                None => object.attributes.remove(&attribute),
            };
        }
    }
}

/// Parses `raw` against the attributes of `class_name`.
///
/// `creationDate` is managed by the service and is ignored. Empty strings clear values.
///
/// # Errors
/// * [`InventoryError::InvalidArgument`] for unknown attributes or unparsable values.
/// * [`InventoryError::NotFound`] when a list type value names no item of that list type.
pub fn parse_attributes(
    tables: &Tables,
    class_name: &str,
    raw: &BTreeMap<String, String>,
) -> Result<AttributeChanges, InventoryError> {
    let mut changes = AttributeChanges::default();
    for (attribute_name, text) in raw {
        if attribute_name == ATTRIBUTE_CREATION_DATE {
            continue;
        }
        if attribute_name == ATTRIBUTE_NAME {
            changes.name = Some(text.trim().to_owned());
            continue;
        }
        let attribute = schema::effective_attribute(tables, class_name, attribute_name).ok_or_else(
            || {
                InventoryError::invalid(format!(
                    "Class {class_name} has no attribute named {attribute_name}"
                ))
            },
        )?;
        changes.values.insert(attribute_name.clone(), parse_value(tables, &attribute, text)?);
    }
    Ok(changes)
}

/// # Errors
/// See [`parse_attributes`].
pub fn parse_value(
    tables: &Tables,
    attribute: &AttributeMetadata,
    text: &str,
) -> Result<Option<AttributeValue>, InventoryError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let invalid = || {
        InventoryError::invalid(format!(
            "Value '{text}' is not a valid {} for attribute {}",
            attribute.attribute_type, attribute.name
        ))
    };
    let value = match &attribute.attribute_type {
        AttributeType::String => AttributeValue::String(text.to_owned()),
        AttributeType::Integer => AttributeValue::Integer(text.parse().map_err(|_| invalid())?),
        AttributeType::Long => AttributeValue::Long(text.parse().map_err(|_| invalid())?),
        AttributeType::Float => AttributeValue::Float(text.parse().map_err(|_| invalid())?),
        AttributeType::Boolean => AttributeValue::Boolean(text.parse().map_err(|_| invalid())?),
        AttributeType::Date => AttributeValue::Date(text.parse().map_err(|_| invalid())?),
        AttributeType::Timestamp => AttributeValue::Timestamp(text.parse().map_err(|_| invalid())?),
        AttributeType::ListType(list_type) => {
            let item = tables.list_items.get(text).filter(|item| {
                tables.classes.is_subclass_of(&item.class_name, list_type)
            });
            if item.is_none() {
                return Err(InventoryError::not_found(format!(
                    "List type item {text} of {list_type} could not be found"
                )));
            }
            AttributeValue::ListItem(text.to_owned())
        },
    };
    Ok(Some(value))
}

/// Names of mandatory attributes of `class_name` that `object` leaves empty.
#[must_use]
pub fn missing_mandatory(tables: &Tables, class_name: &str, object: &BusinessObject) -> Vec<String> {
    schema::effective_attributes(tables, class_name)
        .into_iter()
        .filter(|a| a.mandatory)
        .filter(|a| {
            if a.name == ATTRIBUTE_NAME {
                object.name.trim().is_empty()
            } else {
                !object.attributes.contains_key(&a.name)
            }
        })
        .map(|a| a.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::seed_core_model;
    use kw_domain::model::inventory::ParentRef;

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
        tables
    }

    #[test]
    fn values_are_typed_by_metadata() {
        let tables = tables();
        let raw = BTreeMap::from([
            ("name".to_owned(), " core-1 ".to_owned()),
            ("vendor".to_owned(), "cisco".to_owned()),
            ("serialNumber".to_owned(), String::new()),
        ]);
        let changes = parse_attributes(&tables, "Router", &raw).unwrap();
        assert_eq!(changes.name.as_deref(), Some("core-1"));
        assert_eq!(changes.values["vendor"], Some(AttributeValue::ListItem("cisco".to_owned())));
        assert_eq!(changes.values["serialNumber"], None);
    }

    #[test]
    fn bad_values_are_rejected() {
        let tables = tables();
        let unknown = BTreeMap::from([("color".to_owned(), "red".to_owned())]);
        assert!(parse_attributes(&tables, "Router", &unknown).is_err());

        let missing_item = BTreeMap::from([("vendor".to_owned(), "juniper".to_owned())]);
        assert!(matches!(
            parse_attributes(&tables, "Router", &missing_item),
            Err(InventoryError::NotFound { .. })
        ));

        let not_a_number = BTreeMap::from([("hosts".to_owned(), "many".to_owned())]);
        assert!(matches!(
            parse_attributes(&tables, "SubnetIPv4", &not_a_number),
            Err(InventoryError::InvalidArgument { .. })
        ));
    }
}
