//! Validator definitions. Their scripts are stored for clients, never run by the service.

use kw_database::Tables;
use kw_domain::model::application::ValidatorDefinition;
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use kw_metadata::schema;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank names.
/// * [`InventoryError::NotFound`] for unknown classes.
pub fn create_validator(
    tables: &mut Tables,
    name: &str,
    description: &str,
    class_name: &str,
    script: &str,
    enabled: bool,
) -> Result<Id, InventoryError> {
    let name = validation::not_blank(name, "The validator name")?.to_owned();
    let class_name = schema::class(tables, class_name)?.name.clone();
    let id = new_id();
    tables.validators.insert(
        id.clone(),
        ValidatorDefinition {
            id: id.clone(),
            name,
            description: description.to_owned(),
            class_name,
            script: script.to_owned(),
            enabled,
        },
    );
    Ok(id)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown validators or classes,
/// [`InventoryError::InvalidArgument`] for blank names.
pub fn update_validator(tables: &mut Tables, id: &str, update: ValidatorUpdate) -> Result<(), InventoryError> {
    let name = update.name.as_deref().map(|n| validation::not_blank(n, "The validator name")).transpose()?;
    let class_name = update.class_name.as_deref().map(|c| schema::class(tables, c).map(|c| c.name.clone())).transpose()?;
    let Some(validator) = tables.validators.get_mut(id) else {
        return Err(InventoryError::not_found(format!("Validator definition {id} could not be found")));
    };
    if let Some(name) = name {
        name.clone_into(&mut validator.name);
    }
    if let Some(class_name) = class_name {
        validator.class_name = class_name;
    }
    if let Some(description) = update.description {
        validator.description = description;
    }
    if let Some(script) = update.script {
        validator.script = script;
    }
    if let Some(enabled) = update.enabled {
        validator.enabled = enabled;
    }
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown validators.
pub fn delete_validator(tables: &mut Tables, id: &str) -> Result<(), InventoryError> {
    tables
        .validators
        .remove(id)
        .map(drop)
        .ok_or_else(|| InventoryError::not_found(format!("Validator definition {id} could not be found")))
}

/// Validators of `class_name` and of all its superclasses.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn validators_for_class(tables: &Tables, class_name: &str) -> Result<Vec<ValidatorDefinition>, InventoryError> {
    schema::class(tables, class_name)?;
    let lineage = tables.classes.lineage(class_name);
    let mut found: Vec<ValidatorDefinition> = tables
        .validators
        .values()
        .filter(|v| lineage.iter().any(|c| c.name == v.class_name))
        .cloned()
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

#[must_use]
pub fn all_validators(tables: &Tables) -> Vec<ValidatorDefinition> {
    let mut all: Vec<ValidatorDefinition> = tables.validators.values().cloned().collect();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superclass_validators_apply() {
        let mut tables = Tables::default();
        kw_metadata::bootstrap::seed_core_model(&mut tables);
        create_validator(&mut tables, "hasSerial", "", "GenericCommunicationsElement", "", true).unwrap();
        let own = create_validator(&mut tables, "hasVendor", "", "Router", "", true).unwrap();
        create_validator(&mut tables, "hasFloor", "", "Building", "", true).unwrap();
        assert!(create_validator(&mut tables, "x", "", "Spaceship", "", true).is_err());

        let names: Vec<String> = validators_for_class(&tables, "Router").unwrap().into_iter().map(|v| v.name).collect();
        assert_eq!(names, ["hasSerial", "hasVendor"]);

        let update = ValidatorUpdate { class_name: Some("Building".to_owned()), ..ValidatorUpdate::default() };
        update_validator(&mut tables, &own, update).unwrap();
        assert_eq!(validators_for_class(&tables, "Router").unwrap().len(), 1);
        delete_validator(&mut tables, &own).unwrap();
        assert_eq!(all_validators(&tables).len(), 2);
    }
}
