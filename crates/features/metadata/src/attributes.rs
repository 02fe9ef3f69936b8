use crate::schema::{self, is_list_type};
use kw_database::Tables;
use kw_domain::constants::ATTRIBUTE_NAME;
use kw_domain::model::Id;
use kw_domain::model::metadata::{AttributeMetadata, AttributeType};
use kw_kernel::error::InventoryError;
use kw_kernel::new_id;
use kw_kernel::validation;
use serde::Deserialize;
use std::collections::BTreeSet;

const fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttribute {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
    #[serde(default)]
    pub administrative: bool,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub no_copy: bool,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeUpdate {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub attribute_type: Option<String>,
    pub administrative: Option<bool>,
    pub visible: Option<bool>,
    pub read_only: Option<bool>,
    pub unique: Option<bool>,
    pub mandatory: Option<bool>,
    pub no_copy: Option<bool>,
    pub order: Option<i32>,
}

fn attribute_type(tables: &Tables, name: &str) -> Result<AttributeType, InventoryError> {
    let parsed = AttributeType::parse(name.trim());
    if let AttributeType::ListType(list_type) = &parsed
        && !is_list_type(tables, list_type)
    {
        return Err(InventoryError::invalid(format!(
            "{list_type} is neither a primitive type nor a list type"
        )));
    }
    Ok(parsed)
}

/// Whether `attribute` is taken in `class_name`, its ancestors or any of its subclasses.
fn name_in_use(tables: &Tables, class_name: &str, attribute: &str) -> bool {
    schema::effective_attribute(tables, class_name, attribute).is_some()
        || tables
            .classes
            .all_subclasses(class_name)
            .iter()
            .any(|c| c.own_attribute(attribute).is_some())
}

/// Classes whose instances store values of an attribute declared in `class_name`.
fn affected_classes(tables: &Tables, class_name: &str) -> Vec<String> {
    std::iter::once(class_name.to_owned())
        .chain(tables.classes.all_subclasses(class_name).into_iter().map(|c| c.name.clone()))
        .collect()
}

fn clear_values(tables: &mut Tables, class_name: &str, attribute: &str) {
    for class in affected_classes(tables, class_name) {
        for store in [&mut tables.objects, &mut tables.templates] {
            let ids: Vec<Id> = store.of_class(&class).map(|o| o.id.clone()).collect();
            for id in ids {
                store.edit(&id, |object| object.attributes.remove(attribute));
            }
        }
    }
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes.
/// * [`InventoryError::InvalidArgument`] for malformed, duplicated or untyped attributes.
pub fn create_attribute(
    tables: &mut Tables,
    class_name: &str,
    new: NewAttribute,
) -> Result<Id, InventoryError> {
    schema::class(tables, class_name)?;
    let name = validation::identifier(&new.name, "Attribute name")?.to_owned();
    if name_in_use(tables, class_name, &name) {
        return Err(InventoryError::invalid(format!(
            "Attribute {name} already exists in class {class_name} or its hierarchy"
        )));
    }
    let attribute_type = attribute_type(tables, &new.attribute_type)?;

    let id = new_id();
    let attribute = AttributeMetadata {
        id: id.clone(),
        display_name: if new.display_name.trim().is_empty() { name.clone() } else { new.display_name },
        name,
        description: new.description,
        attribute_type,
        administrative: new.administrative,
        visible: new.visible,
        read_only: new.read_only,
        unique: new.unique,
        mandatory: new.mandatory,
        no_copy: new.no_copy,
        order: new.order,
    };
    tables.classes.edit(class_name, |class| class.attributes.push(attribute));
    Ok(id)
}

/// Updates an attribute declared by `class_name` itself.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes or attributes.
/// * [`InventoryError::OperationNotPermitted`] when renaming `name` or turning an attribute
///   unique while instances share a value.
pub fn set_attribute_properties(
    tables: &mut Tables,
    class_name: &str,
    attribute_id: &str,
    update: AttributeUpdate,
) -> Result<(), InventoryError> {
    let current = schema::class(tables, class_name)?
        .attributes
        .iter()
        .find(|a| a.id == attribute_id)
        .cloned()
        .ok_or_else(|| {
            InventoryError::not_found(format!(
                "Attribute with id {attribute_id} could not be found in class {class_name}"
            ))
        })?;

    let new_name = match update.name.as_deref().map(str::trim) {
        Some(requested) if requested != current.name => {
            if current.name == ATTRIBUTE_NAME {
                return Err(InventoryError::not_permitted("Attribute name can not be renamed"));
            }
            let requested = validation::identifier(requested, "Attribute name")?.to_owned();
            if name_in_use(tables, class_name, &requested) {
                return Err(InventoryError::invalid(format!(
                    "Attribute {requested} already exists in class {class_name} or its hierarchy"
                )));
            }
            Some(requested)
        },
        _ => None,
    };
    let new_type = match update.attribute_type.as_deref() {
        Some(requested) => Some(attribute_type(tables, requested)?).filter(|t| *t != current.attribute_type),
        None => None,
    };
    if update.unique == Some(true) && !current.unique {
        ensure_unique_values(tables, class_name, &current.name)?;
    }

    let mut changed = current.clone();
    if let Some(name) = &new_name {
        changed.name.clone_from(name);
    }
    if let Some(attribute_type) = &new_type {
        changed.attribute_type = attribute_type.clone();
    }
    if let Some(display_name) = update.display_name {
        changed.display_name = display_name;
    }
    if let Some(description) = update.description {
        changed.description = description;
    }
    changed.administrative = update.administrative.unwrap_or(changed.administrative);
    changed.visible = update.visible.unwrap_or(changed.visible);
    changed.read_only = update.read_only.unwrap_or(changed.read_only);
    changed.unique = update.unique.unwrap_or(changed.unique);
    changed.mandatory = update.mandatory.unwrap_or(changed.mandatory);
    changed.no_copy = update.no_copy.unwrap_or(changed.no_copy);
    changed.order = update.order.unwrap_or(changed.order);

    tables.classes.edit(class_name, |class| {
        if let Some(slot) = class.attributes.iter_mut().find(|a| a.id == attribute_id) {
            *slot = changed;
        }
    });

    if new_type.is_some() {
        clear_values(tables, class_name, &current.name);
    } else if let Some(new_name) = new_name {
        for class in affected_classes(tables, class_name) {
            for store in [&mut tables.objects, &mut tables.templates] {
                let ids: Vec<Id> = store.of_class(&class).map(|o| o.id.clone()).collect();
                for id in ids {
                    store.edit(&id, |object| {
                        if let Some(value) = object.attributes.remove(&current.name) {
                            object.attributes.insert(new_name.clone(), value);
                        }
                    });
                }
            }
        }
    }
    Ok(())
}

fn ensure_unique_values(tables: &Tables, class_name: &str, attribute: &str) -> Result<(), InventoryError> {
    let mut seen = BTreeSet::new();
    for class in affected_classes(tables, class_name) {
        for object in tables.objects.of_class(&class) {
            let value = if attribute == ATTRIBUTE_NAME {
                Some(object.name.clone())
            } else {
                object.attributes.get(attribute).map(ToString::to_string)
            };
            if let Some(value) = value
                && !seen.insert(value.clone())
            {
                return Err(InventoryError::not_permitted(format!(
                    "Attribute {attribute} can not be unique: value {value} is repeated"
                )));
            }
        }
    }
    Ok(())
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes or attributes not declared by the class.
/// * [`InventoryError::OperationNotPermitted`] for the `name` attribute.
pub fn delete_attribute(tables: &mut Tables, class_name: &str, attribute: &str) -> Result<(), InventoryError> {
    if attribute == ATTRIBUTE_NAME {
        return Err(InventoryError::not_permitted("Attribute name can not be deleted"));
    }
    if schema::class(tables, class_name)?.own_attribute(attribute).is_none() {
        return Err(InventoryError::not_found(format!(
            "Attribute {attribute} is not declared by class {class_name}"
        )));
    }
    tables.classes.edit(class_name, |class| class.attributes.retain(|a| a.name != attribute));
    clear_values(tables, class_name, attribute);
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown classes or attributes.
pub fn attribute(tables: &Tables, class_name: &str, attribute: &str) -> Result<AttributeMetadata, InventoryError> {
    schema::class(tables, class_name)?;
    schema::effective_attribute(tables, class_name, attribute).ok_or_else(|| {
        InventoryError::not_found(format!("Attribute {attribute} could not be found in class {class_name}"))
    })
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn mandatory_attributes(tables: &Tables, class_name: &str) -> Result<Vec<AttributeMetadata>, InventoryError> {
    schema::class(tables, class_name)?;
    Ok(schema::effective_attributes(tables, class_name).into_iter().filter(|a| a.mandatory).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::seed_core_model;
    use kw_domain::model::inventory::{BusinessObject, ParentRef};
    use kw_domain::model::metadata::AttributeValue;
    use std::collections::BTreeMap;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        tables
    }

    fn new_attribute(name: &str, attribute_type: &str) -> NewAttribute {
        NewAttribute {
            name: name.to_owned(),
            display_name: String::new(),
            description: String::new(),
            attribute_type: attribute_type.to_owned(),
            administrative: false,
            visible: true,
            read_only: false,
            unique: false,
            mandatory: false,
            no_copy: false,
            order: 10,
        }
    }

    fn router(tables: &mut Tables, id: &str, rack_units: Option<i32>) {
        let attributes = rack_units
            .map(|u| BTreeMap::from([("rackUnits".to_owned(), AttributeValue::Integer(u))]))
            .unwrap_or_default();
        tables.objects.insert(BusinessObject {
            id: id.to_owned(),
            class_name: "Router".to_owned(),
            name: id.to_owned(),
            parent: ParentRef::Root,
            attributes,
            creation_date: 0,
        });
    }

    #[test]
    fn attribute_names_are_unique_along_the_hierarchy() {
        let mut tables = tables();
        create_attribute(&mut tables, "GenericCommunicationsElement", new_attribute("rackUnits", "Integer"))
            .unwrap();
        assert!(attribute(&tables, "Router", "rackUnits").is_ok());

        let err = create_attribute(&mut tables, "Router", new_attribute("rackUnits", "Integer")).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument { .. }));
        let err = create_attribute(&mut tables, "InventoryObject", new_attribute("rackUnits", "Long")).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument { .. }));
        let err = create_attribute(&mut tables, "Router", new_attribute("weight", "Kilograms")).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument { .. }));
    }

    #[test]
    fn type_change_clears_values() {
        let mut tables = tables();
        let id = create_attribute(&mut tables, "GenericCommunicationsElement", new_attribute("rackUnits", "Integer"))
            .unwrap();
        router(&mut tables, "r1", Some(2));

        let update = AttributeUpdate { attribute_type: Some("String".to_owned()), ..AttributeUpdate::default() };
        set_attribute_properties(&mut tables, "GenericCommunicationsElement", &id, update).unwrap();

        assert!(tables.objects.get("r1").unwrap().attributes.is_empty());
        assert_eq!(attribute(&tables, "Router", "rackUnits").unwrap().attribute_type, AttributeType::String);
    }

    #[test]
    fn rename_moves_values() {
        let mut tables = tables();
        let id = create_attribute(&mut tables, "Router", new_attribute("rackUnits", "Integer")).unwrap();
        router(&mut tables, "r1", Some(2));

        let update = AttributeUpdate { name: Some("height".to_owned()), ..AttributeUpdate::default() };
        set_attribute_properties(&mut tables, "Router", &id, update).unwrap();
        assert_eq!(tables.objects.get("r1").unwrap().attributes["height"], AttributeValue::Integer(2));
    }

    #[test]
    fn unique_requires_distinct_values() {
        let mut tables = tables();
        let id = create_attribute(&mut tables, "Router", new_attribute("rackUnits", "Integer")).unwrap();
        router(&mut tables, "r1", Some(2));
        router(&mut tables, "r2", Some(2));

        let update = AttributeUpdate { unique: Some(true), ..AttributeUpdate::default() };
        let err = set_attribute_properties(&mut tables, "Router", &id, update).unwrap_err();
        assert!(matches!(err, InventoryError::OperationNotPermitted { .. }));
    }

    #[test]
    fn name_attribute_is_protected() {
        let mut tables = tables();
        assert!(matches!(
            delete_attribute(&mut tables, "RootObject", "name"),
            Err(InventoryError::OperationNotPermitted { .. })
        ));
        let id = tables.classes.get("RootObject").unwrap().own_attribute("name").unwrap().id.clone();
        let update = AttributeUpdate { name: Some("label".to_owned()), ..AttributeUpdate::default() };
        assert!(set_attribute_properties(&mut tables, "RootObject", &id, update).is_err());
    }

    #[test]
    fn delete_removes_values() {
        let mut tables = tables();
        create_attribute(&mut tables, "Router", new_attribute("rackUnits", "Integer")).unwrap();
        router(&mut tables, "r1", Some(4));
        delete_attribute(&mut tables, "Router", "rackUnits").unwrap();
        assert!(tables.objects.get("r1").unwrap().attributes.is_empty());
        assert!(attribute(&tables, "Router", "rackUnits").is_err());
    }
}
