//! Subnet pools. Each IP version has one module root pool; every other subnet pool hangs
//! from a root pool or from another subnet pool of the same version.

use kw_application::pools::{self, NewPool};
use kw_business::objects::Removed;
use kw_database::Tables;
use kw_domain::constants::{
    CLASS_GENERIC_SUBNET, CLASS_SUBNET_IPV4, CLASS_SUBNET_IPV6, IPV4_ROOT_POOL, IPV6_ROOT_POOL,
    POOL_TYPE_MODULE_COMPONENT, POOL_TYPE_MODULE_ROOT, ROOT_ID,
};
use kw_domain::model::Id;
use kw_domain::model::inventory::{Pool, PoolOwner};
use kw_kernel::error::InventoryError;

const ROOTS: [(&str, &str); 2] = [(IPV4_ROOT_POOL, CLASS_SUBNET_IPV4), (IPV6_ROOT_POOL, CLASS_SUBNET_IPV6)];

fn is_module_root(pool: &Pool) -> bool {
    pool.pool_type == POOL_TYPE_MODULE_ROOT && pool.owner == PoolOwner::Root
}

fn root_for<'a>(tables: &'a Tables, class_name: &str) -> Option<&'a Pool> {
    tables.pools_owned_by(&PoolOwner::Root).find(|p| is_module_root(p) && p.class_name == class_name)
}

/// Creates the `IPv4 Root` and `IPv6 Root` pools when missing. Returns how many were
/// created.
///
/// # Errors
/// [`InventoryError::NotFound`] when the subnet classes are missing from the class model.
pub fn ensure_root_pools(tables: &mut Tables) -> Result<usize, InventoryError> {
    let mut created = 0;
    for (name, class_name) in ROOTS {
        if root_for(tables, class_name).is_some() {
            continue;
        }
        let root = NewPool {
            name: name.to_owned(),
            description: format!("Root of every {class_name} pool"),
            class_name: class_name.to_owned(),
            pool_type: POOL_TYPE_MODULE_ROOT,
        };
        pools::create_root_pool(tables, &root)?;
        created += 1;
    }
    Ok(created)
}

/// Looks a subnet pool up, rejecting pools of other classes.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown pools.
/// * [`InventoryError::InvalidArgument`] for pools that do not hold subnets.
pub fn subnet_pool<'a>(tables: &'a Tables, id: &str) -> Result<&'a Pool, InventoryError> {
    let pool = pools::pool(tables, id)?;
    if !tables.classes.is_subclass_of(&pool.class_name, CLASS_GENERIC_SUBNET) {
        return Err(InventoryError::invalid(format!("Pool {} does not hold subnets", pool.name)));
    }
    Ok(pool)
}

/// Pools below `parent_id`. With `-1` as parent the module root pools are listed instead,
/// optionally only the one of `class_name`.
///
/// # Errors
/// See [`subnet_pool`].
pub fn subnet_pools(tables: &Tables, parent_id: &str, class_name: Option<&str>) -> Result<Vec<Pool>, InventoryError> {
    let class_name = class_name.filter(|c| !c.trim().is_empty());
    if parent_id.trim() == ROOT_ID {
        let mut roots: Vec<Pool> = ROOTS
            .iter()
            .filter(|(_, class)| class_name.is_none_or(|c| c == *class))
            .filter_map(|(_, class)| root_for(tables, class).cloned())
            .collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name));
        return Ok(roots);
    }
    let parent = subnet_pool(tables, parent_id)?;
    pools::pools_in_pool(tables, &parent.id, class_name)
}

/// Creates a subnet pool. `-1` as parent means the root pool of `class_name`.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown parents.
/// * [`InventoryError::InvalidArgument`] for blank names, or a class that is not the one of
///   the parent pool.
pub fn create_subnet_pool(
    tables: &mut Tables,
    parent_id: &str,
    name: &str,
    description: &str,
    class_name: &str,
) -> Result<Id, InventoryError> {
    let parent = if parent_id.trim() == ROOT_ID {
        root_for(tables, class_name)
            .ok_or_else(|| InventoryError::invalid(format!("{class_name} is not a subnet class")))?
    } else {
        subnet_pool(tables, parent_id)?
    };
    if parent.class_name != class_name {
        return Err(InventoryError::invalid(format!(
            "Pool {} holds {} subnets, not {class_name}",
            parent.name, parent.class_name
        )));
    }
    let parent_id = parent.id.clone();
    let new = NewPool {
        name: name.to_owned(),
        description: description.to_owned(),
        class_name: class_name.to_owned(),
        pool_type: POOL_TYPE_MODULE_COMPONENT,
    };
    pools::create_pool_in_pool(tables, &parent_id, &new)
}

/// Deletes subnet pools with their subpools, subnets and addresses.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown pools.
/// * [`InventoryError::InvalidArgument`] for pools that do not hold subnets.
/// * [`InventoryError::OperationNotPermitted`] for the root pools.
pub fn delete_subnet_pools(tables: &mut Tables, ids: &[Id]) -> Result<Removed, InventoryError> {
    for id in ids {
        let pool = subnet_pool(tables, id)?;
        if is_module_root(pool) {
            return Err(InventoryError::not_permitted(format!("The root pool {} can not be deleted", pool.name)));
        }
    }
    pools::delete_pools(tables, ids)
}
