//! Pools: named containers of objects of one class, hanging from the root, from an object
//! or from another pool.

use kw_business::navigation::sorted;
use kw_business::objects::{self, Removed, Store};
use kw_database::Tables;
use kw_domain::constants::{ATTRIBUTE_NAME, POOL_TYPE_GENERAL_PURPOSE, POOL_TYPE_MODULE_COMPONENT};
use kw_domain::model::inventory::{BusinessObject, ParentRef, Pool, PoolOwner};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, validation};
use kw_metadata::schema;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

const fn general_purpose() -> i32 {
    POOL_TYPE_GENERAL_PURPOSE
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub class_name: String,
    #[serde(default = "general_purpose")]
    pub pool_type: i32,
}

/// Looks a pool up.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown pools.
pub fn pool<'a>(tables: &'a Tables, id: &str) -> Result<&'a Pool, InventoryError> {
    tables.pools.get(id).ok_or_else(|| InventoryError::not_found(format!("Pool {id} could not be found")))
}

/// Creates a pool owned by `owner` after checking its fields.
///
/// # Errors
/// * [`InventoryError::InvalidArgument`] for blank names and unknown pool types.
/// * [`InventoryError::NotFound`] for unknown classes.
pub fn create_pool(tables: &mut Tables, owner: PoolOwner, new: &NewPool) -> Result<Id, InventoryError> {
    let name = validation::not_blank(&new.name, "The pool name")?;
    if !(POOL_TYPE_GENERAL_PURPOSE..=POOL_TYPE_MODULE_COMPONENT).contains(&new.pool_type) {
        return Err(InventoryError::invalid(format!("Unknown pool type {}", new.pool_type)));
    }
    schema::class(tables, &new.class_name)?;
    let id = new_id();
    tables.pools.insert(
        id.clone(),
        Pool {
            id: id.clone(),
            name: name.to_owned(),
            description: new.description.clone(),
            class_name: new.class_name.clone(),
            pool_type: new.pool_type,
            owner,
        },
    );
    Ok(id)
}

/// # Errors
/// See [`create_pool`].
pub fn create_root_pool(tables: &mut Tables, new: &NewPool) -> Result<Id, InventoryError> {
    create_pool(tables, PoolOwner::Root, new)
}

/// # Errors
/// See [`create_pool`], plus [`InventoryError::NotFound`] for unknown owners.
pub fn create_pool_in_object(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    new: &NewPool,
) -> Result<Id, InventoryError> {
    let owner = objects::object(tables, class_name, id)?.key();
    create_pool(tables, PoolOwner::Object(owner), new)
}

/// # Errors
/// See [`create_pool`], plus [`InventoryError::NotFound`] for unknown parent pools.
pub fn create_pool_in_pool(tables: &mut Tables, parent_id: &str, new: &NewPool) -> Result<Id, InventoryError> {
    let parent = pool(tables, parent_id)?.id.clone();
    create_pool(tables, PoolOwner::Pool(parent), new)
}

/// Creates an item in a pool, optionally from a template of the same class.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown pools, classes or templates.
/// * [`InventoryError::OperationNotPermitted`] for classes outside the pool class.
/// * Attribute errors as reported by object creation.
pub fn create_pool_item(
    tables: &mut Tables,
    pool_id: &str,
    class_name: &str,
    attributes: &BTreeMap<String, String>,
    template_id: Option<&str>,
) -> Result<Id, InventoryError> {
    let Some(template_id) = template_id.filter(|t| !t.trim().is_empty()) else {
        return objects::create_pool_item(tables, pool_id, class_name, attributes);
    };
    let template = objects::find(tables, Store::Templates, class_name, template_id)?;
    if template.class_name != class_name {
        return Err(InventoryError::invalid(format!("Template {template_id} is not a {class_name} template")));
    }
    let mut merged: BTreeMap<String, String> =
        template.attributes.iter().map(|(k, v)| (k.clone(), v.to_string())).collect();
    merged.insert(ATTRIBUTE_NAME.to_owned(), template.name.clone());
    merged.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
    let source = template.key();
    let id = objects::create_pool_item(tables, pool_id, class_name, &merged)?;
    objects::instantiate_template(tables, &source, &ObjectKey::new(class_name, id.clone()));
    Ok(id)
}

/// A pool and every pool below it, parents first.
fn pool_tree(tables: &Tables, root: &str) -> Vec<Id> {
    let mut found = Vec::new();
    let mut queue = VecDeque::from([root.to_owned()]);
    while let Some(id) = queue.pop_front() {
        queue.extend(tables.pools_owned_by(&PoolOwner::Pool(id.clone())).map(|p| p.id.clone()));
        found.push(id);
    }
    found
}

/// Deletes pools, their subpools and every item in them. Relationships of the items are
/// released.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown pools, before anything is deleted.
pub fn delete_pools(tables: &mut Tables, ids: &[Id]) -> Result<Removed, InventoryError> {
    let mut doomed = BTreeSet::new();
    for id in ids {
        pool(tables, id)?;
        doomed.extend(pool_tree(tables, id));
    }
    let items: Vec<ObjectKey> = doomed
        .iter()
        .flat_map(|id| tables.objects.children_of(&ParentRef::Pool(id.clone())).map(BusinessObject::key).collect::<Vec<_>>())
        .collect();
    let removed = if items.is_empty() {
        Removed::default()
    } else {
        objects::delete_objects(tables, Store::Objects, &items, true)?
    };
    for id in doomed {
        tables.pools.remove(&id);
    }
    Ok(removed)
}

fn matches_class(tables: &Tables, pool: &Pool, class_name: Option<&str>, include_subclasses: bool) -> bool {
    match class_name.filter(|c| !c.trim().is_empty()) {
        None => true,
        Some(class_name) if include_subclasses => tables.classes.is_subclass_of(&pool.class_name, class_name),
        Some(class_name) => pool.class_name == class_name,
    }
}

fn sorted_pools<'a>(pools: impl Iterator<Item = &'a Pool>) -> Vec<Pool> {
    let mut pools: Vec<Pool> = pools.cloned().collect();
    pools.sort_by(|a, b| a.name.cmp(&b.name));
    pools
}

/// Root pools of a class (or of its subclasses) and of a type. `pool_type` -1 means any.
#[must_use]
pub fn root_pools(tables: &Tables, class_name: Option<&str>, pool_type: i32, include_subclasses: bool) -> Vec<Pool> {
    sorted_pools(
        tables
            .pools_owned_by(&PoolOwner::Root)
            .filter(|p| pool_type < 0 || p.pool_type == pool_type)
            .filter(|p| matches_class(tables, p, class_name, include_subclasses)),
    )
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn pools_in_object(
    tables: &Tables,
    class_name: &str,
    id: &str,
    pool_class: Option<&str>,
) -> Result<Vec<Pool>, InventoryError> {
    let owner = PoolOwner::Object(objects::object(tables, class_name, id)?.key());
    Ok(sorted_pools(tables.pools_owned_by(&owner).filter(|p| matches_class(tables, p, pool_class, true))))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown pools.
pub fn pools_in_pool(tables: &Tables, parent_id: &str, pool_class: Option<&str>) -> Result<Vec<Pool>, InventoryError> {
    let owner = PoolOwner::Pool(pool(tables, parent_id)?.id.clone());
    Ok(sorted_pools(tables.pools_owned_by(&owner).filter(|p| matches_class(tables, p, pool_class, true))))
}

/// # Errors
/// [`InventoryError::NotFound`] for unknown pools.
pub fn pool_items(tables: &Tables, pool_id: &str, limit: i64) -> Result<Vec<ObjectLight>, InventoryError> {
    let parent = ParentRef::Pool(pool(tables, pool_id)?.id.clone());
    Ok(sorted(tables.objects.children_of(&parent).map(BusinessObject::light).collect(), limit))
}

/// Renames or redescribes a pool. Returns what changed, for the activity log.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown pools.
/// * [`InventoryError::InvalidArgument`] for blank names.
pub fn set_pool_properties(
    tables: &mut Tables,
    id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<String, InventoryError> {
    let name = name.map(|n| validation::not_blank(n, "The pool name")).transpose()?;
    let current = pool(tables, id)?;
    let mut notes = Vec::new();
    if let Some(name) = name.filter(|n| *n != current.name) {
        notes.push(format!("name: {} -> {name}", current.name));
    }
    if description.is_some_and(|d| d != current.description) {
        notes.push("description changed".to_owned());
    }
    if let Some(pool) = tables.pools.get_mut(id) {
        if let Some(name) = name {
            name.clone_into(&mut pool.name);
        }
        if let Some(description) = description {
            description.clone_into(&mut pool.description);
        }
    }
    Ok(notes.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_metadata::bootstrap::seed_core_model;

    fn new_pool(name: &str, class_name: &str) -> NewPool {
        NewPool {
            name: name.to_owned(),
            description: String::new(),
            class_name: class_name.to_owned(),
            pool_type: POOL_TYPE_GENERAL_PURPOSE,
        }
    }

    fn named(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())])
    }

    #[test]
    fn items_must_fit_the_pool_class() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let spares = create_root_pool(&mut tables, &new_pool("Spares", "GenericCommunicationsElement")).unwrap();

        create_pool_item(&mut tables, &spares, "Router", &named("spare-1"), None).unwrap();
        let wrong = create_pool_item(&mut tables, &spares, "OpticalPort", &named("sfp"), None);
        assert!(wrong.is_err());
        assert!(create_pool_item(&mut tables, "nope", "Router", &named("x"), None).is_err());

        let items = pool_items(&tables, &spares, 0).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "spare-1");
    }

    #[test]
    fn pools_nest_and_filter_by_class() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let root = create_root_pool(&mut tables, &new_pool("Equipment", "GenericCommunicationsElement")).unwrap();
        create_root_pool(&mut tables, &new_pool("Ports", "GenericPort")).unwrap();
        let routers = create_pool_in_pool(&mut tables, &root, &new_pool("Routers", "Router")).unwrap();
        create_pool_item(&mut tables, &routers, "Router", &named("r1"), None).unwrap();

        assert_eq!(root_pools(&tables, None, -1, false).len(), 2);
        assert_eq!(root_pools(&tables, Some("GenericPort"), -1, true).len(), 1);
        assert_eq!(root_pools(&tables, Some("InventoryObject"), -1, true).len(), 2);
        assert!(root_pools(&tables, Some("InventoryObject"), -1, false).is_empty());
        assert_eq!(pools_in_pool(&tables, &root, None).unwrap()[0].name, "Routers");

        let removed = delete_pools(&mut tables, &[root]).unwrap();
        assert_eq!(removed.objects.len(), 1);
        assert!(tables.pools.get(&routers).is_none());
        assert_eq!(tables.objects.len(), 0);
    }

    #[test]
    fn pools_reject_blank_names_and_bad_types() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        assert!(create_root_pool(&mut tables, &new_pool("  ", "Router")).is_err());
        let mut odd = new_pool("Odd", "Router");
        odd.pool_type = 9;
        assert!(create_root_pool(&mut tables, &odd).is_err());

        let id = create_root_pool(&mut tables, &new_pool("Core", "Router")).unwrap();
        let notes = set_pool_properties(&mut tables, &id, Some("Edge"), None).unwrap();
        assert_eq!(notes, "name: Core -> Edge");
        assert!(set_pool_properties(&mut tables, &id, Some(""), None).is_err());
    }
}
