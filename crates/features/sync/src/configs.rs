use crate::groups;
use kw_business::objects;
use kw_database::Tables;
use kw_domain::model::sync::SyncDataSourceConfig;
use kw_domain::model::{Id, ObjectKey};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use std::collections::BTreeMap;

/// # Errors
/// [`InventoryError::NotFound`] for unknown configurations.
pub fn config<'a>(tables: &'a Tables, id: &str) -> Result<&'a SyncDataSourceConfig, InventoryError> {
    tables.sync_configs.get(id).ok_or_else(|| {
        InventoryError::not_found(format!("Synchronization data source configuration {id} could not be found"))
    })
}

/// The configuration describing an inventory object.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects or objects without configuration.
pub fn config_for_object<'a>(
    tables: &'a Tables,
    class_name: &str,
    id: &str,
) -> Result<&'a SyncDataSourceConfig, InventoryError> {
    let object = objects::object(tables, class_name, id)?.key();
    tables.sync_configs.values().find(|c| c.object == object).ok_or_else(|| {
        InventoryError::not_found(format!("Object {object} has no synchronization data source configuration"))
    })
}

/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank names.
/// * [`InventoryError::NotFound`] for unknown groups and objects.
/// * [`InventoryError::OperationNotPermitted`] when the object already has a configuration.
pub fn create_config(
    tables: &mut Tables,
    object: &ObjectKey,
    group_id: &str,
    name: &str,
    parameters: BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    let name = validation::not_blank(name, "The configuration name")?.to_owned();
    groups::group(tables, group_id)?;
    let object = objects::object(tables, &object.class_name, &object.id)?.key();
    if tables.sync_configs.values().any(|c| c.object == object) {
        return Err(InventoryError::not_permitted(format!(
            "Object {object} already has a synchronization data source configuration"
        )));
    }
    let id = new_id();
    tables.sync_configs.insert(
        id.clone(),
        SyncDataSourceConfig { id: id.clone(), name, object, groups: vec![group_id.to_owned()], parameters },
    );
    Ok(id)
}

/// Merges `parameters` into the configuration. The `name` key renames it and a `None`
/// value removes the parameter.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown configurations, [`InventoryError::InvalidArgument`]
/// for blank names.
pub fn update_config(
    tables: &mut Tables,
    id: &str,
    parameters: &BTreeMap<String, Option<String>>,
) -> Result<(), InventoryError> {
    let mut updated = config(tables, id)?.clone();
    for (key, value) in parameters {
        match (key.as_str(), value) {
            ("name", Some(name)) => validation::not_blank(name, "The configuration name")?.clone_into(&mut updated.name),
            ("name", None) => return Err(InventoryError::invalid("The configuration name can not be removed")),
            (_, Some(value)) => {
                updated.parameters.insert(key.clone(), value.clone());
            },
            (_, None) => {
                updated.parameters.remove(key);
            },
        }
    }
    tables.sync_configs.insert(updated.id.clone(), updated);
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown configurations.
pub fn delete_config(tables: &mut Tables, id: &str) -> Result<SyncDataSourceConfig, InventoryError> {
    config(tables, id)?;
    tables.sync_configs.remove(id).ok_or_else(|| InventoryError::not_found(format!("Configuration {id}")))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown groups.
pub fn configs_in_group(tables: &Tables, group_id: &str) -> Result<Vec<SyncDataSourceConfig>, InventoryError> {
    groups::group(tables, group_id)?;
    let mut configs: Vec<SyncDataSourceConfig> =
        tables.sync_configs.values().filter(|c| c.groups.iter().any(|g| g == group_id)).cloned().collect();
    configs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(configs)
}

fn checked(tables: &Tables, group_ids: &[&str], ids: &[Id]) -> Result<(), InventoryError> {
    for group_id in group_ids {
        groups::group(tables, group_id)?;
    }
    for id in ids {
        config(tables, id)?;
    }
    Ok(())
}

/// Adds the configurations to one more group.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown groups or configurations; nothing changes then.
pub fn copy_to_group(tables: &mut Tables, group_id: &str, ids: &[Id]) -> Result<(), InventoryError> {
    checked(tables, &[group_id], ids)?;
    for id in ids {
        if let Some(config) = tables.sync_configs.get_mut(id)
            && !config.groups.iter().any(|g| g == group_id)
        {
            config.groups.push(group_id.to_owned());
        }
    }
    Ok(())
}

/// Takes the configurations out of a group.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown groups or configurations, or configurations
///   outside the group.
/// * [`InventoryError::OperationNotPermitted`] when a configuration would be left without group.
pub fn release_from_group(tables: &mut Tables, group_id: &str, ids: &[Id]) -> Result<(), InventoryError> {
    checked(tables, &[group_id], ids)?;
    for id in ids {
        let config = config(tables, id)?;
        if !config.groups.iter().any(|g| g == group_id) {
            return Err(InventoryError::not_found(format!(
                "Configuration {} does not belong to group {group_id}",
                config.name
            )));
        }
        if config.groups.len() == 1 {
            return Err(InventoryError::not_permitted(format!(
                "Configuration {} must belong to at least one synchronization group",
                config.name
            )));
        }
    }
    for id in ids {
        if let Some(config) = tables.sync_configs.get_mut(id) {
            config.groups.retain(|g| g != group_id);
        }
    }
    Ok(())
}

/// Moves the configurations from one group to another.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown groups or configurations, or configurations
/// outside `from`.
pub fn move_to_group(tables: &mut Tables, from: &str, to: &str, ids: &[Id]) -> Result<(), InventoryError> {
    checked(tables, &[from, to], ids)?;
    let outside = ids
        .iter()
        .filter_map(|id| tables.sync_configs.get(id))
        .find(|c| !c.groups.iter().any(|g| g == from));
    if let Some(outside) = outside {
        return Err(InventoryError::not_found(format!(
            "Configuration {} does not belong to group {from}",
            outside.name
        )));
    }
    for id in ids {
        if let Some(config) = tables.sync_configs.get_mut(id) {
            config.groups.retain(|g| g != from && g != to);
            config.groups.push(to.to_owned());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::inventory::{BusinessObject, ParentRef};

    fn tables_with_router() -> (Tables, ObjectKey) {
        let mut tables = Tables::default();
        kw_metadata::bootstrap::seed_core_model(&mut tables);
        tables.objects.insert(BusinessObject {
            id: "r1".to_owned(),
            class_name: "Router".to_owned(),
            name: "core".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        (tables, ObjectKey::new("Router", "r1"))
    }

    #[test]
    fn configurations_keep_at_least_one_group() {
        let (mut tables, router) = tables_with_router();
        let core = groups::create_group(&mut tables, "Core", "").unwrap();
        let edge = groups::create_group(&mut tables, "Edge", "").unwrap();
        let id = create_config(&mut tables, &router, &core, "snmp", BTreeMap::new()).unwrap();

        let twice = create_config(&mut tables, &router, &edge, "again", BTreeMap::new());
        assert!(matches!(twice, Err(InventoryError::OperationNotPermitted { .. })));

        let last = release_from_group(&mut tables, &core, std::slice::from_ref(&id));
        assert!(matches!(last, Err(InventoryError::OperationNotPermitted { .. })));

        copy_to_group(&mut tables, &edge, std::slice::from_ref(&id)).unwrap();
        release_from_group(&mut tables, &core, std::slice::from_ref(&id)).unwrap();
        assert_eq!(config(&tables, &id).unwrap().groups, [edge.clone()]);

        move_to_group(&mut tables, &edge, &core, std::slice::from_ref(&id)).unwrap();
        assert_eq!(config(&tables, &id).unwrap().groups, [core.clone()]);

        assert_eq!(groups::delete_group(&mut tables, &core).unwrap(), 1);
        assert!(tables.sync_configs.is_empty());
    }

    #[test]
    fn parameters_merge() {
        let (mut tables, router) = tables_with_router();
        let group = groups::create_group(&mut tables, "Core", "").unwrap();
        let parameters = BTreeMap::from([("ipAddress".to_owned(), "10.0.0.1".to_owned())]);
        let id = create_config(&mut tables, &router, &group, "snmp", parameters).unwrap();

        let changes = BTreeMap::from([
            ("ipAddress".to_owned(), None),
            ("port".to_owned(), Some("161".to_owned())),
            ("name".to_owned(), Some("snmp v2".to_owned())),
        ]);
        update_config(&mut tables, &id, &changes).unwrap();
        let updated = config_for_object(&tables, "Router", "r1").unwrap();
        assert_eq!(updated.name, "snmp v2");
        assert_eq!(updated.parameters, BTreeMap::from([("port".to_owned(), "161".to_owned())]));
    }
}
