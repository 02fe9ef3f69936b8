//! Configuration variables, grouped in pools and addressed by their unique name.

use kw_database::Tables;
use kw_domain::model::application::{ConfigVariable, ConfigVariableType, NamedPool};
use kw_domain::model::Id;
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

const MASK: &str = "****";

/// Creates a pool in `pools`. Shared with the proxy pools.
pub(crate) fn create_named_pool(
    pools: &mut BTreeMap<Id, NamedPool>,
    name: &str,
    description: &str,
) -> Result<Id, InventoryError> {
    let name = validation::not_blank(name, "The pool name")?;
    let id = new_id();
    pools.insert(id.clone(), NamedPool { id: id.clone(), name: name.to_owned(), description: description.to_owned() });
    Ok(id)
}

/// Sets `name` or `description` of a pool in `pools`.
pub(crate) fn update_named_pool(
    pools: &mut BTreeMap<Id, NamedPool>,
    id: &str,
    property: &str,
    value: &str,
) -> Result<(), InventoryError> {
    let Some(pool) = pools.get_mut(id) else {
        return Err(InventoryError::not_found(format!("Pool {id} could not be found")));
    };
    match property {
        "name" => validation::not_blank(value, "The pool name")?.clone_into(&mut pool.name),
        "description" => value.clone_into(&mut pool.description),
        other => return Err(InventoryError::invalid(format!("Pools have no property named {other}"))),
    }
    Ok(())
}

pub(crate) fn sorted_pools(pools: &BTreeMap<Id, NamedPool>) -> Vec<NamedPool> {
    let mut all: Vec<NamedPool> = pools.values().cloned().collect();
    all.sort_by(|a, b| a.name.cmp(&b.name));
    all
}

/// # Errors
/// [`InventoryError::InvalidArgument`] for blank names.
pub fn create_pool(tables: &mut Tables, name: &str, description: &str) -> Result<Id, InventoryError> {
    create_named_pool(&mut tables.config_pools, name, description)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown pools, [`InventoryError::InvalidArgument`] for
/// unknown properties or blank names.
pub fn update_pool(tables: &mut Tables, id: &str, property: &str, value: &str) -> Result<(), InventoryError> {
    update_named_pool(&mut tables.config_pools, id, property, value)
}

/// Deletes a pool with its variables. Returns how many variables went away.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown pools.
pub fn delete_pool(tables: &mut Tables, id: &str) -> Result<usize, InventoryError> {
    if tables.config_pools.remove(id).is_none() {
        return Err(InventoryError::not_found(format!("Pool {id} could not be found")));
    }
    let before = tables.config_variables.len();
    tables.config_variables.retain(|_, v| v.pool_id != id);
    Ok(before - tables.config_variables.len())
}

#[must_use]
pub fn pools(tables: &Tables) -> Vec<NamedPool> {
    sorted_pools(&tables.config_pools)
}

/// A variable as clients see it: masked values are replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableInfo {
    pub id: Id,
    pub pool_id: Id,
    pub name: String,
    pub description: String,
    pub variable_type: ConfigVariableType,
    pub masked: bool,
    pub value: String,
}

impl From<&ConfigVariable> for VariableInfo {
    fn from(variable: &ConfigVariable) -> Self {
        Self {
            id: variable.id.clone(),
            pool_id: variable.pool_id.clone(),
            name: variable.name.clone(),
            description: variable.description.clone(),
            variable_type: variable.variable_type,
            masked: variable.masked,
            value: if variable.masked { MASK.to_owned() } else { variable.value.clone() },
        }
    }
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown pools.
pub fn variables_in_pool(tables: &Tables, pool_id: &str) -> Result<Vec<VariableInfo>, InventoryError> {
    if !tables.config_pools.contains_key(pool_id) {
        return Err(InventoryError::not_found(format!("Pool {pool_id} could not be found")));
    }
    let mut found: Vec<VariableInfo> =
        tables.config_variables.values().filter(|v| v.pool_id == pool_id).map(VariableInfo::from).collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariable {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `0` integer, `1` float, `2` string, `3` boolean, `4` array, `5` matrix.
    pub variable_type: i32,
    #[serde(default)]
    pub masked: bool,
    pub value_definition: String,
}

/// Parses a stored value into the JSON it stands for.
fn typed(variable_type: ConfigVariableType, text: &str) -> Result<Value, InventoryError> {
    let invalid = || InventoryError::invalid(format!("Value '{text}' is not a valid {variable_type:?} value"));
    let trimmed = text.trim();
    match variable_type {
        ConfigVariableType::String => Ok(Value::String(text.to_owned())),
        ConfigVariableType::Integer => trimmed.parse::<i64>().map(Value::from).map_err(|_| invalid()),
        ConfigVariableType::Float => trimmed.parse::<f64>().map(Value::from).map_err(|_| invalid()),
        ConfigVariableType::Boolean => trimmed.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
        ConfigVariableType::Array => match serde_json::from_str(trimmed) {
            Ok(value @ Value::Array(_)) => Ok(value),
            _ => Err(invalid()),
        },
        ConfigVariableType::Matrix => match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(rows)) if rows.iter().all(Value::is_array) => Ok(Value::Array(rows)),
            _ => Err(invalid()),
        },
    }
}

fn variable<'a>(tables: &'a Tables, name: &str) -> Result<&'a ConfigVariable, InventoryError> {
    tables
        .config_variable_by_name(name)
        .ok_or_else(|| InventoryError::not_found(format!("Configuration variable {name} could not be found")))
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown pools.
/// * [`InventoryError::InvalidArgument`] for blank names, unknown types or values that do not
///   parse as the type.
/// * [`InventoryError::OperationNotPermitted`] for names already in use.
pub fn create_variable(tables: &mut Tables, pool_id: &str, new: &NewVariable) -> Result<Id, InventoryError> {
    let name = validation::identifier(&new.name, "The variable name")?;
    if !tables.config_pools.contains_key(pool_id) {
        return Err(InventoryError::not_found(format!("Pool {pool_id} could not be found")));
    }
    let variable_type = ConfigVariableType::from_code(new.variable_type)
        .ok_or_else(|| InventoryError::invalid(format!("Unknown variable type {}", new.variable_type)))?;
    typed(variable_type, &new.value_definition)?;
    if tables.config_variable_by_name(name).is_some() {
        return Err(InventoryError::not_permitted(format!("A configuration variable named {name} already exists")));
    }
    let id = new_id();
    tables.config_variables.insert(
        id.clone(),
        ConfigVariable {
            id: id.clone(),
            pool_id: pool_id.to_owned(),
            name: name.to_owned(),
            description: new.description.clone(),
            variable_type,
            masked: new.masked,
            value: new.value_definition.clone(),
        },
    );
    Ok(id)
}

/// Sets `name`, `description`, `masked`, `type` or `value`. A new type must accept the
/// current value.
///
/// # Errors
/// As [`create_variable`], plus [`InventoryError::NotFound`] for unknown variables.
pub fn update_variable(tables: &mut Tables, name: &str, property: &str, value: &str) -> Result<(), InventoryError> {
    let current = variable(tables, name)?.clone();
    let mut updated = current.clone();
    match property {
        "name" => {
            let new_name = validation::identifier(value, "The variable name")?;
            if new_name != current.name && tables.config_variable_by_name(new_name).is_some() {
                return Err(InventoryError::not_permitted(format!(
                    "A configuration variable named {new_name} already exists"
                )));
            }
            new_name.clone_into(&mut updated.name);
        },
        "description" => value.clone_into(&mut updated.description),
        "masked" => {
            updated.masked = value
                .trim()
                .parse()
                .map_err(|_| InventoryError::invalid(format!("Value '{value}' of masked is not a boolean")))?;
        },
        "type" => {
            let code = value.trim().parse().unwrap_or(-1);
            updated.variable_type = ConfigVariableType::from_code(code)
                .ok_or_else(|| InventoryError::invalid(format!("Unknown variable type {value}")))?;
            typed(updated.variable_type, &updated.value)?;
        },
        "value" => {
            typed(updated.variable_type, value)?;
            value.clone_into(&mut updated.value);
        },
        other => {
            return Err(InventoryError::invalid(format!("Configuration variables have no property named {other}")));
        },
    }
    tables.config_variables.insert(current.id, updated);
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown variables.
pub fn delete_variable(tables: &mut Tables, name: &str) -> Result<(), InventoryError> {
    let id = variable(tables, name)?.id.clone();
    tables.config_variables.remove(&id);
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown variables.
pub fn variable_info(tables: &Tables, name: &str) -> Result<VariableInfo, InventoryError> {
    variable(tables, name).map(VariableInfo::from)
}

/// The value of a variable as typed JSON, masked or not.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown variables.
pub fn variable_value(tables: &Tables, name: &str) -> Result<Value, InventoryError> {
    let variable = variable(tables, name)?;
    typed(variable.variable_type, &variable.value)
}
