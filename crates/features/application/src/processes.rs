//! Process definitions and their instances.
//!
//! Definitions carry an opaque, base64 encoded structure document. Running the activities
//! it describes is up to the clients; the inventory only keeps the records.

use base64::{Engine as _, engine::general_purpose};
use kw_database::Tables;
use kw_domain::model::Id;
use kw_domain::model::application::{ProcessDefinition, ProcessInstance};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, now_millis, validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcessDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub structure: String,
}

/// A definition without its structure, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinitionLight {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub version: String,
    pub enabled: bool,
}

impl From<&ProcessDefinition> for ProcessDefinitionLight {
    fn from(definition: &ProcessDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            version: definition.version.clone(),
            enabled: definition.enabled,
        }
    }
}

fn checked_structure(structure: &str) -> Result<String, InventoryError> {
    let structure = structure.trim();
    if !structure.is_empty() && general_purpose::STANDARD.decode(structure).is_err() {
        return Err(InventoryError::invalid("The process structure must be base64 encoded"));
    }
    Ok(structure.to_owned())
}

/// # Errors
/// [`InventoryError::InvalidArgument`] for blank names and structures that are not base64.
pub fn create_definition(tables: &mut Tables, new: NewProcessDefinition) -> Result<Id, InventoryError> {
    let name = validation::not_blank(&new.name, "The process definition name")?.to_owned();
    let structure = checked_structure(&new.structure)?;
    let id = new_id();
    tables.process_definitions.insert(
        id.clone(),
        ProcessDefinition {
            id: id.clone(),
            name,
            description: new.description,
            version: new.version,
            enabled: new.enabled,
            structure,
            creation_date: now_millis(),
        },
    );
    Ok(id)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown definitions.
pub fn definition<'a>(tables: &'a Tables, id: &str) -> Result<&'a ProcessDefinition, InventoryError> {
    tables
        .process_definitions
        .get(id)
        .ok_or_else(|| InventoryError::not_found(format!("Process definition {id} could not be found")))
}

#[must_use]
pub fn definitions(tables: &Tables) -> Vec<ProcessDefinitionLight> {
    let mut lights: Vec<ProcessDefinitionLight> =
        tables.process_definitions.values().map(ProcessDefinitionLight::from).collect();
    lights.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));
    lights
}

/// Sets `name`, `description`, `version` or `enabled`, and replaces the structure when one
/// is given. Returns the names of the changed fields.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown definitions.
/// * [`InventoryError::InvalidArgument`] for unknown properties, blank names, values of
///   `enabled` other than `true` or `false`, and structures that are not base64.
pub fn update_definition(
    tables: &mut Tables,
    id: &str,
    properties: &BTreeMap<String, String>,
    structure: Option<&str>,
) -> Result<String, InventoryError> {
    let structure = structure.map(checked_structure).transpose()?;
    let mut updated = definition(tables, id)?.clone();
    let mut changed: Vec<&str> = Vec::new();
    for (property, value) in properties {
        match property.as_str() {
            "name" => validation::not_blank(value, "The process definition name")?.clone_into(&mut updated.name),
            "description" => updated.description.clone_from(value),
            "version" => updated.version.clone_from(value),
            "enabled" => {
                updated.enabled = value
                    .parse()
                    .map_err(|_| InventoryError::invalid(format!("'{value}' is not a valid value for enabled")))?;
            },
            other => {
                return Err(InventoryError::invalid(format!("Process definitions have no property {other}")));
            },
        }
        changed.push(property);
    }
    if let Some(structure) = structure {
        updated.structure = structure;
        changed.push("structure");
    }
    tables.process_definitions.insert(updated.id.clone(), updated);
    Ok(format!("Process definition {id}: {}", changed.join(", ")))
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown definitions.
/// * [`InventoryError::OperationNotPermitted`] while instances of the definition remain.
pub fn delete_definition(tables: &mut Tables, id: &str) -> Result<ProcessDefinition, InventoryError> {
    definition(tables, id)?;
    let instances = tables.process_instances.values().filter(|i| i.process_definition == id).count();
    if instances > 0 {
        return Err(InventoryError::not_permitted(format!(
            "Process definition {id} still has {instances} instance(s)"
        )));
    }
    tables
        .process_definitions
        .remove(id)
        .ok_or_else(|| InventoryError::not_found(format!("Process definition {id} could not be found")))
}

/// Starts a new instance of an enabled definition.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown definitions.
/// * [`InventoryError::OperationNotPermitted`] for disabled definitions.
pub fn create_instance(
    tables: &mut Tables,
    definition_id: &str,
    name: &str,
    description: &str,
) -> Result<Id, InventoryError> {
    let process = definition(tables, definition_id)?;
    if !process.enabled {
        return Err(InventoryError::not_permitted(format!(
            "Process definition {} is disabled",
            process.name
        )));
    }
    let id = new_id();
    tables.process_instances.insert(
        id.clone(),
        ProcessInstance {
            id: id.clone(),
            name: name.trim().to_owned(),
            description: description.to_owned(),
            process_definition: definition_id.to_owned(),
            current_activity: None,
            creation_date: now_millis(),
        },
    );
    Ok(id)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown instances.
pub fn instance<'a>(tables: &'a Tables, id: &str) -> Result<&'a ProcessInstance, InventoryError> {
    tables
        .process_instances
        .get(id)
        .ok_or_else(|| InventoryError::not_found(format!("Process instance {id} could not be found")))
}

/// Instances of a definition, oldest first.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown definitions.
pub fn instances(tables: &Tables, definition_id: &str) -> Result<Vec<ProcessInstance>, InventoryError> {
    definition(tables, definition_id)?;
    let mut found: Vec<ProcessInstance> = tables
        .process_instances
        .values()
        .filter(|i| i.process_definition == definition_id)
        .cloned()
        .collect();
    found.sort_by(|a, b| a.creation_date.cmp(&b.creation_date).then_with(|| a.id.cmp(&b.id)));
    Ok(found)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown instances.
pub fn delete_instance(tables: &mut Tables, id: &str) -> Result<ProcessInstance, InventoryError> {
    tables
        .process_instances
        .remove(id)
        .ok_or_else(|| InventoryError::not_found(format!("Process instance {id} could not be found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(name: &str) -> NewProcessDefinition {
        NewProcessDefinition {
            name: name.to_owned(),
            version: "1.0".to_owned(),
            enabled: true,
            structure: general_purpose::STANDARD.encode("<process/>"),
            ..NewProcessDefinition::default()
        }
    }

    #[test]
    fn definitions_keep_their_instances() {
        let mut tables = Tables::default();
        let id = create_definition(&mut tables, enabled("Provisioning")).unwrap();
        let first = create_instance(&mut tables, &id, "order 1", "").unwrap();
        create_instance(&mut tables, &id, "order 2", "").unwrap();

        assert_eq!(instances(&tables, &id).unwrap().len(), 2);
        assert_eq!(instance(&tables, &first).unwrap().process_definition, id);
        assert!(matches!(delete_definition(&mut tables, &id), Err(InventoryError::OperationNotPermitted { .. })));

        for instance in instances(&tables, &id).unwrap() {
            delete_instance(&mut tables, &instance.id).unwrap();
        }
        delete_definition(&mut tables, &id).unwrap();
        assert!(matches!(instances(&tables, &id), Err(InventoryError::NotFound { .. })));
    }

    #[test]
    fn updates_check_properties() {
        let mut tables = Tables::default();
        let id = create_definition(&mut tables, enabled("Survey")).unwrap();

        let properties = BTreeMap::from([("enabled".to_owned(), "false".to_owned())]);
        update_definition(&mut tables, &id, &properties, None).unwrap();
        assert!(!definition(&tables, &id).unwrap().enabled);
        assert!(matches!(
            create_instance(&mut tables, &id, "site A", ""),
            Err(InventoryError::OperationNotPermitted { .. })
        ));

        let unknown = BTreeMap::from([("owner".to_owned(), "ops".to_owned())]);
        assert!(update_definition(&mut tables, &id, &unknown, None).is_err());
        assert!(update_definition(&mut tables, &id, &BTreeMap::new(), Some("not base64!")).is_err());
        let blank = BTreeMap::from([("name".to_owned(), " ".to_owned())]);
        assert!(update_definition(&mut tables, &id, &blank, None).is_err());
        assert_eq!(definition(&tables, &id).unwrap().name, "Survey");
        assert!(create_definition(&mut tables, NewProcessDefinition::default()).is_err());
    }
}
