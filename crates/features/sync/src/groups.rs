use crate::providers;
use kw_database::Tables;
use kw_domain::model::Id;
use kw_domain::model::sync::SyncGroup;
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use std::collections::BTreeMap;

/// # Errors
/// [`InventoryError::NotFound`] for unknown groups.
pub fn group<'a>(tables: &'a Tables, id: &str) -> Result<&'a SyncGroup, InventoryError> {
    tables
        .sync_groups
        .get(id)
        .ok_or_else(|| InventoryError::not_found(format!("Synchronization group {id} could not be found")))
}

fn name_taken(tables: &Tables, name: &str, except: Option<&str>) -> bool {
    tables.sync_groups.values().any(|g| g.name == name && Some(g.id.as_str()) != except)
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank names and unknown providers.
/// * [`InventoryError::OperationNotPermitted`] for names already in use.
pub fn create_group(tables: &mut Tables, name: &str, provider: &str) -> Result<Id, InventoryError> {
    let name = validation::not_blank(name, "The synchronization group name")?;
    providers::check(provider)?;
    if name_taken(tables, name, None) {
        return Err(InventoryError::not_permitted(format!("There is already a synchronization group named {name}")));
    }
    let id = new_id();
    tables
        .sync_groups
        .insert(id.clone(), SyncGroup { id: id.clone(), name: name.to_owned(), provider: provider.to_owned() });
    Ok(id)
}

/// Sets `name` and `provider`. Returns what changed, for the activity log.
///
/// # Errors
/// As [`create_group`], plus [`InventoryError::NotFound`] for unknown groups and
/// [`InventoryError::InvalidArgument`] for other properties.
pub fn update_group(
    tables: &mut Tables,
    id: &str,
    properties: &BTreeMap<String, String>,
) -> Result<String, InventoryError> {
    let mut updated = group(tables, id)?.clone();
    for (property, value) in properties {
        match property.as_str() {
            "name" => {
                let name = validation::not_blank(value, "The synchronization group name")?;
                if name_taken(tables, name, Some(id)) {
                    return Err(InventoryError::not_permitted(format!(
                        "There is already a synchronization group named {name}"
                    )));
                }
                name.clone_into(&mut updated.name);
            },
            "provider" => {
                providers::check(value)?;
                value.clone_into(&mut updated.provider);
            },
            other => return Err(InventoryError::invalid(format!("Synchronization groups have no property named {other}"))),
        }
    }
    tables.sync_groups.insert(updated.id.clone(), updated);
    Ok(properties.keys().cloned().collect::<Vec<_>>().join(", "))
}

/// Deletes a group. Configurations left without any group go with it.
/// Returns how many configurations were deleted.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown groups.
pub fn delete_group(tables: &mut Tables, id: &str) -> Result<usize, InventoryError> {
    group(tables, id)?;
    tables.sync_groups.remove(id);
    for config in tables.sync_configs.values_mut() {
        config.groups.retain(|g| g != id);
    }
    let before = tables.sync_configs.len();
    tables.sync_configs.retain(|_, config| !config.groups.is_empty());
    Ok(before - tables.sync_configs.len())
}

#[must_use]
pub fn groups(tables: &Tables) -> Vec<SyncGroup> {
    let mut groups: Vec<SyncGroup> = tables.sync_groups.values().cloned().collect();
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    groups
}

/// Copies each group under a free `Copy of <name>` name. The copies hold the same
/// configurations as their source.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown groups; nothing is copied then.
pub fn copy_groups(tables: &mut Tables, ids: &[Id]) -> Result<Vec<SyncGroup>, InventoryError> {
    let sources = ids.iter().map(|id| group(tables, id).cloned()).collect::<Result<Vec<_>, _>>()?;
    let mut copies = Vec::with_capacity(sources.len());
    for source in sources {
        let mut name = format!("Copy of {}", source.name);
        let mut attempt = 1;
        while name_taken(tables, &name, None) {
            attempt += 1;
            name = format!("Copy of {} ({attempt})", source.name);
        }
        let copy = SyncGroup { id: new_id(), name, provider: source.provider.clone() };
        for config in tables.sync_configs.values_mut() {
            if config.groups.contains(&source.id) {
                config.groups.push(copy.id.clone());
            }
        }
        tables.sync_groups.insert(copy.id.clone(), copy.clone());
        copies.push(copy);
    }
    Ok(copies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut tables = Tables::default();
        let id = create_group(&mut tables, "Core", "").unwrap();
        assert!(matches!(create_group(&mut tables, "Core", ""), Err(InventoryError::OperationNotPermitted { .. })));
        assert!(matches!(create_group(&mut tables, "Edge", "Nope"), Err(InventoryError::InvalidArgument { .. })));

        let other = create_group(&mut tables, "Edge", "MplsSyncProvider").unwrap();
        let rename = BTreeMap::from([("name".to_owned(), "Core".to_owned())]);
        assert!(update_group(&mut tables, &other, &rename).is_err());
        assert_eq!(group(&tables, &other).unwrap().name, "Edge");

        let copies = copy_groups(&mut tables, &[id.clone(), id]).unwrap();
        let names: Vec<&str> = copies.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Copy of Core", "Copy of Core (2)"]);
    }
}
