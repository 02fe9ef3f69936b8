//! Warehouses keep spare and reserved equipment in pools they own, or directly inside
//! them. Each warehouse is tied to the physical node housing it through `warehouseHas`.

use crate::catalog;
use kw_application::pools;
use kw_business::objects::{self, Store};
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{CLASS_GENERIC_PHYSICAL_NODE, CLASS_GENERIC_WAREHOUSE, REL_WAREHOUSE_HAS};
use kw_domain::model::inventory::{ParentRef, Pool, PoolOwner};
use kw_domain::model::{ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;

fn warehouse_key(tables: &Tables, warehouse: &ObjectKey) -> Result<ObjectKey, InventoryError> {
    Ok(catalog::member(tables, CLASS_GENERIC_WAREHOUSE, &warehouse.class_name, &warehouse.id)?.key())
}

#[must_use]
pub fn root_pools(tables: &Tables) -> Vec<Pool> {
    catalog::root_pools(tables, CLASS_GENERIC_WAREHOUSE)
}

/// Ties physical nodes to a warehouse.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown warehouses or objects.
/// * [`InventoryError::InvalidArgument`] for objects that are not physical nodes.
/// * [`InventoryError::OperationNotPermitted`] for nodes already tied to it.
pub fn associate(
    tables: &mut Tables,
    warehouse: &ObjectKey,
    nodes: &[ObjectKey],
) -> Result<Vec<ObjectKey>, InventoryError> {
    let warehouse = warehouse_key(tables, warehouse)?;
    for node in nodes {
        let object = objects::object(tables, &node.class_name, &node.id)?;
        if !tables.classes.is_subclass_of(&object.class_name, CLASS_GENERIC_PHYSICAL_NODE) {
            return Err(InventoryError::invalid(format!("{} is not a physical node", object.key())));
        }
    }
    catalog::relate_all(tables, &warehouse, nodes, REL_WAREHOUSE_HAS)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown warehouses and nodes not tied to them.
pub fn release(tables: &mut Tables, warehouse: &ObjectKey, node_id: &str) -> Result<(), InventoryError> {
    let warehouse = warehouse_key(tables, warehouse)?;
    catalog::release(tables, &warehouse, node_id, REL_WAREHOUSE_HAS)
}

/// Moves objects into a pool owned by a warehouse.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown pools or objects.
/// * [`InventoryError::OperationNotPermitted`] for pools outside warehouses and objects the
///   pool class does not admit.
pub fn move_to_pool(tables: &mut Tables, pool_id: &str, targets: &[ObjectKey]) -> Result<(), InventoryError> {
    let pool = pools::pool(tables, pool_id)?;
    let in_warehouse = matches!(&pool.owner, PoolOwner::Object(owner)
        if tables.classes.is_subclass_of(&owner.class_name, CLASS_GENERIC_WAREHOUSE));
    if !in_warehouse {
        return Err(InventoryError::not_permitted(format!("Pool {} does not belong to a warehouse", pool.name)));
    }
    let mut moving = Vec::with_capacity(targets.len());
    for target in targets {
        let object = objects::object(tables, &target.class_name, &target.id)?;
        if !tables.classes.is_subclass_of(&object.class_name, &pool.class_name) {
            return Err(InventoryError::not_permitted(format!(
                "Pool {} holds {} objects, not {}",
                pool.name, pool.class_name, object.class_name
            )));
        }
        moving.push(object.id.clone());
    }
    for id in moving {
        tables.objects.edit(&id, |object| object.parent = ParentRef::Pool(pool_id.to_owned()));
    }
    Ok(())
}

/// Moves objects directly inside a warehouse, following the containment rules.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown warehouses, and whatever moving objects
/// reports.
pub fn move_to_warehouse(tables: &mut Tables, warehouse: &ObjectKey, targets: &[ObjectKey]) -> Result<(), InventoryError> {
    let warehouse = warehouse_key(tables, warehouse)?;
    objects::move_objects(tables, Store::Objects, &warehouse.class_name, &warehouse.id, targets, false)
}

/// The warehouse an object is stored in, either inside one of its pools or directly.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn warehouse_of(tables: &Tables, object: &ObjectKey) -> Result<Option<ObjectLight>, InventoryError> {
    let object = objects::object(tables, &object.class_name, &object.id)?;
    let holder = match &object.parent {
        ParentRef::Child(parent) => Some(parent.clone()),
        ParentRef::Pool(_) => catalog::pool_owner(tables, object),
        ParentRef::Root | ParentRef::Special(_) | ParentRef::Detached => None,
    };
    Ok(holder
        .filter(|key| tables.classes.is_subclass_of(&key.class_name, CLASS_GENERIC_WAREHOUSE))
        .and_then(|key| relationships::light(tables, &key)))
}

/// The physical node housing the warehouse an object is stored in.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn physical_node_of(tables: &Tables, object: &ObjectKey) -> Result<Option<ObjectLight>, InventoryError> {
    let Some(warehouse) = warehouse_of(tables, object)? else {
        return Ok(None);
    };
    let nodes = relationships::special_attribute(tables, &warehouse.key(), REL_WAREHOUSE_HAS)?;
    Ok(nodes.into_iter().find(|n| tables.classes.is_subclass_of(&n.class_name, CLASS_GENERIC_PHYSICAL_NODE)))
}
