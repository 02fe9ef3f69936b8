//! Inventory proxies: stand-ins for objects managed by an external system. They live in
//! proxy pools, outside the containment tree, and are linked to inventory objects through
//! `hasProxy`.

use crate::variables::{create_named_pool, sorted_pools, update_named_pool};
use kw_business::navigation::sorted;
use kw_business::{objects, relationships};
use kw_database::Tables;
use kw_domain::constants::{CLASS_GENERIC_PROXY, REL_HAS_PROXY};
use kw_domain::model::application::NamedPool;
use kw_domain::model::inventory::{BusinessObject, ParentRef};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, now_millis};
use kw_metadata::schema;
use kw_metadata::values::{RemoteObject, parse_attributes};
use std::collections::BTreeMap;

/// # Errors
/// [`InventoryError::InvalidArgument`] for blank names.
pub fn create_pool(tables: &mut Tables, name: &str, description: &str) -> Result<Id, InventoryError> {
    create_named_pool(&mut tables.proxy_pools, name, description)
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown pools, [`InventoryError::InvalidArgument`] for
/// unknown properties or blank names.
pub fn update_pool(tables: &mut Tables, id: &str, property: &str, value: &str) -> Result<(), InventoryError> {
    update_named_pool(&mut tables.proxy_pools, id, property, value)
}

#[must_use]
pub fn pools(tables: &Tables) -> Vec<NamedPool> {
    sorted_pools(&tables.proxy_pools)
}

fn remove_proxy(tables: &mut Tables, id: &str) {
    if let Some(proxy) = tables.proxies.remove(id) {
        tables.relationships.release_all(&proxy.key());
    }
}

/// Deletes a pool with its proxies. Returns how many proxies went away.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown pools.
pub fn delete_pool(tables: &mut Tables, id: &str) -> Result<usize, InventoryError> {
    if tables.proxy_pools.remove(id).is_none() {
        return Err(InventoryError::not_found(format!("Proxy pool {id} could not be found")));
    }
    let proxies: Vec<Id> =
        tables.proxies.children_of(&ParentRef::Pool(id.to_owned())).map(|p| p.id.clone()).collect();
    for proxy in &proxies {
        remove_proxy(tables, proxy);
    }
    Ok(proxies.len())
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown pools or classes.
/// * [`InventoryError::InvalidArgument`] for classes that are not proxies and bad attributes.
/// * [`InventoryError::OperationNotPermitted`] for abstract classes.
pub fn create_proxy(
    tables: &mut Tables,
    pool_id: &str,
    class_name: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    if !tables.proxy_pools.contains_key(pool_id) {
        return Err(InventoryError::not_found(format!("Proxy pool {pool_id} could not be found")));
    }
    schema::instanceable(tables, class_name, CLASS_GENERIC_PROXY)?;
    let changes = parse_attributes(tables, class_name, attributes)?;
    let mut proxy = BusinessObject {
        id: new_id(),
        class_name: class_name.to_owned(),
        name: String::new(),
        parent: ParentRef::Pool(pool_id.to_owned()),
        attributes: BTreeMap::new(),
        creation_date: now_millis(),
    };
    changes.apply(&mut proxy);
    let id = proxy.id.clone();
    tables.proxies.insert(proxy);
    Ok(id)
}

fn proxy<'a>(tables: &'a Tables, class_name: &str, id: &str) -> Result<&'a BusinessObject, InventoryError> {
    tables
        .proxies
        .get(id)
        .filter(|p| tables.classes.is_subclass_of(&p.class_name, class_name))
        .ok_or_else(|| InventoryError::not_found(format!("Proxy {id} of class {class_name} could not be found")))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown proxies, [`InventoryError::InvalidArgument`] for
/// bad attributes.
pub fn update_proxy(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<(), InventoryError> {
    let class_name = proxy(tables, class_name, id)?.class_name.clone();
    let changes = parse_attributes(tables, &class_name, attributes)?;
    tables.proxies.edit(id, |proxy| changes.apply(proxy));
    Ok(())
}

/// Deletes a proxy and releases the objects associated to it.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown proxies.
pub fn delete_proxy(tables: &mut Tables, class_name: &str, id: &str) -> Result<(), InventoryError> {
    proxy(tables, class_name, id)?;
    remove_proxy(tables, id);
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown pools.
pub fn proxies_in_pool(tables: &Tables, pool_id: &str) -> Result<Vec<RemoteObject>, InventoryError> {
    if !tables.proxy_pools.contains_key(pool_id) {
        return Err(InventoryError::not_found(format!("Proxy pool {pool_id} could not be found")));
    }
    let mut found: Vec<RemoteObject> =
        tables.proxies.children_of(&ParentRef::Pool(pool_id.to_owned())).map(RemoteObject::from).collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

#[must_use]
pub fn all_proxies(tables: &Tables) -> Vec<ObjectLight> {
    sorted(tables.proxies.iter().map(BusinessObject::light).collect(), 0)
}

/// Links an inventory object to a proxy.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects or proxies.
/// * [`InventoryError::OperationNotPermitted`] when they are already linked.
pub fn associate(tables: &mut Tables, object: &ObjectKey, proxy_key: &ObjectKey) -> Result<(), InventoryError> {
    let object = objects::object(tables, &object.class_name, &object.id)?.key();
    let proxy = proxy(tables, &proxy_key.class_name, &proxy_key.id)?.key();
    if tables.relationships.linked(&object, &proxy, REL_HAS_PROXY) {
        return Err(InventoryError::not_permitted(format!("{object} is already associated to proxy {proxy}")));
    }
    relationships::insert(tables, object, proxy, REL_HAS_PROXY, BTreeMap::new());
    Ok(())
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects or proxies and objects not associated to
/// the proxy.
pub fn release(tables: &mut Tables, object: &ObjectKey, proxy_key: &ObjectKey) -> Result<(), InventoryError> {
    let object = objects::object(tables, &object.class_name, &object.id)?.key();
    let proxy = proxy(tables, &proxy_key.class_name, &proxy_key.id)?.key();
    if tables.relationships.release(&object, REL_HAS_PROXY, Some(&proxy)).is_empty() {
        return Err(InventoryError::not_found(format!("{object} is not associated to proxy {proxy}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Tables {
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
        tables
    }

    fn named(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([("name".to_owned(), name.to_owned())])
    }

    #[test]
    fn proxies_live_in_their_pools() {
        let mut tables = tables();
        let pool = create_pool(&mut tables, "NMS", "").unwrap();
        let id = create_proxy(&mut tables, &pool, "InventoryProxy", &named("nms-1")).unwrap();
        assert!(create_proxy(&mut tables, &pool, "GenericProxy", &named("x")).is_err());
        assert!(create_proxy(&mut tables, &pool, "Router", &named("x")).is_err());
        assert!(create_proxy(&mut tables, "nowhere", "InventoryProxy", &named("x")).is_err());

        update_proxy(&mut tables, "GenericProxy", &id, &named("nms-primary")).unwrap();
        assert_eq!(proxies_in_pool(&tables, &pool).unwrap()[0].name, "nms-primary");
        assert_eq!(all_proxies(&tables).len(), 1);
        assert_eq!(tables.objects.len(), 1);
    }

    #[test]
    fn deleting_a_pool_releases_its_proxies() {
        let mut tables = tables();
        let pool = create_pool(&mut tables, "NMS", "").unwrap();
        let id = create_proxy(&mut tables, &pool, "InventoryProxy", &named("nms-1")).unwrap();
        let router = ObjectKey::new("Router", "r1");
        let proxy = ObjectKey::new("InventoryProxy", id);
        associate(&mut tables, &router, &proxy).unwrap();
        assert!(associate(&mut tables, &router, &proxy).is_err());
        release(&mut tables, &router, &proxy).unwrap();
        assert!(release(&mut tables, &router, &proxy).is_err());

        associate(&mut tables, &router, &proxy).unwrap();
        assert_eq!(delete_pool(&mut tables, &pool).unwrap(), 1);
        assert_eq!(tables.relationships.len(), 0);
        assert!(tables.proxies.iter().next().is_none());
    }
}
