//! Record level helpers shared by customers, services, contracts, projects and warehouses.
//!
//! Each of them is a family of classes below one abstract root (`GenericCustomer`,
//! `GenericContract` and so on) whose instances live as items of module pools, and most
//! tie other inventory objects to themselves through one named relationship.

use kw_application::pools::{self, NewPool};
use kw_business::navigation::sorted;
use kw_business::objects::{self, Removed, Store};
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{POOL_TYPE_MODULE_COMPONENT, POOL_TYPE_MODULE_ROOT};
use kw_domain::model::inventory::{BusinessObject, ParentRef, Pool, PoolOwner};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_kernel::{new_id, now_millis};
use kw_metadata::schema;
use std::collections::BTreeMap;

/// Checks that `class_name` belongs to the family rooted at `family`.
///
/// # Errors
/// [`InventoryError::NotFound`] for classes outside the family.
pub fn ensure_family(tables: &Tables, family: &str, class_name: &str) -> Result<(), InventoryError> {
    if tables.classes.is_subclass_of(class_name, family) {
        Ok(())
    } else {
        Err(InventoryError::not_found(format!("{class_name} is not a subclass of {family}")))
    }
}

/// Looks a family member up.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects and classes outside the family.
pub fn member<'a>(
    tables: &'a Tables,
    family: &str,
    class_name: &str,
    id: &str,
) -> Result<&'a BusinessObject, InventoryError> {
    ensure_family(tables, family, class_name)?;
    objects::object(tables, class_name, id)
}

/// Creates a module root pool for a family.
///
/// # Errors
/// See [`pools::create_pool`].
pub fn create_root_pool(tables: &mut Tables, family: &str, name: &str, description: &str) -> Result<Id, InventoryError> {
    let new = NewPool {
        name: name.to_owned(),
        description: description.to_owned(),
        class_name: family.to_owned(),
        pool_type: POOL_TYPE_MODULE_ROOT,
    };
    pools::create_root_pool(tables, &new)
}

/// Creates a pool of `family` items owned by an object.
///
/// # Errors
/// See [`pools::create_pool_in_object`].
pub fn create_pool_in_object(
    tables: &mut Tables,
    owner: &ObjectKey,
    family: &str,
    name: &str,
    description: &str,
) -> Result<Id, InventoryError> {
    let new = NewPool {
        name: name.to_owned(),
        description: description.to_owned(),
        class_name: family.to_owned(),
        pool_type: POOL_TYPE_MODULE_COMPONENT,
    };
    pools::create_pool_in_object(tables, &owner.class_name, &owner.id, &new)
}

#[must_use]
pub fn root_pools(tables: &Tables, family: &str) -> Vec<Pool> {
    pools::root_pools(tables, Some(family), POOL_TYPE_MODULE_ROOT, true)
}

/// Looks a pool up, rejecting pools of other families.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown pools and pools of other families.
pub fn family_pool<'a>(tables: &'a Tables, family: &str, pool_id: &str) -> Result<&'a Pool, InventoryError> {
    let pool = pools::pool(tables, pool_id)?;
    if !tables.classes.is_subclass_of(&pool.class_name, family) {
        return Err(InventoryError::not_found(format!("Pool {} does not hold {family} objects", pool.name)));
    }
    Ok(pool)
}

/// Deletes one family pool with everything in it.
///
/// # Errors
/// See [`family_pool`] and [`pools::delete_pools`].
pub fn delete_pool(tables: &mut Tables, family: &str, pool_id: &str) -> Result<Removed, InventoryError> {
    family_pool(tables, family, pool_id)?;
    pools::delete_pools(tables, &[pool_id.to_owned()])
}

/// Creates an item in a family pool, optionally from a template.
///
/// # Errors
/// See [`ensure_family`] and [`pools::create_pool_item`].
pub fn create_item(
    tables: &mut Tables,
    family: &str,
    pool_id: &str,
    class_name: &str,
    attributes: &BTreeMap<String, String>,
    template_id: Option<&str>,
) -> Result<Id, InventoryError> {
    ensure_family(tables, family, class_name)?;
    family_pool(tables, family, pool_id)?;
    pools::create_pool_item(tables, pool_id, class_name, attributes, template_id)
}

/// Items of a family pool, optionally only those of `class_name` and its subclasses.
///
/// # Errors
/// See [`family_pool`].
pub fn items_in_pool(
    tables: &Tables,
    family: &str,
    pool_id: &str,
    class_name: Option<&str>,
    limit: i64,
) -> Result<Vec<ObjectLight>, InventoryError> {
    let pool = family_pool(tables, family, pool_id)?;
    let class_name = class_name.filter(|c| !c.trim().is_empty());
    let lights = tables
        .objects
        .children_of(&ParentRef::Pool(pool.id.clone()))
        .filter(|o| class_name.is_none_or(|c| tables.classes.is_subclass_of(&o.class_name, c)))
        .map(BusinessObject::light)
        .collect();
    Ok(sorted(lights, limit))
}

/// Every instance of the family, wherever it is stored.
#[must_use]
pub fn all_of(tables: &Tables, family: &str, limit: i64) -> Vec<ObjectLight> {
    let lights = tables
        .objects
        .iter()
        .filter(|o| tables.classes.is_subclass_of(&o.class_name, family))
        .map(BusinessObject::light)
        .collect();
    sorted(lights, limit)
}

/// Deletes a family member with whatever hangs from it.
///
/// # Errors
/// See [`member`] and [`objects::delete_objects`].
pub fn delete_member(
    tables: &mut Tables,
    family: &str,
    class_name: &str,
    id: &str,
    release_relationships: bool,
) -> Result<Removed, InventoryError> {
    let key = member(tables, family, class_name, id)?.key();
    objects::delete_objects(tables, Store::Objects, &[key], release_relationships)
}

/// Links `holder` to each of `others` through `name`. Every link is checked before the
/// first one is stored.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::OperationNotPermitted`] for pairs already linked, repeated targets
///   and links the business rules forbid.
pub fn relate_all(
    tables: &mut Tables,
    holder: &ObjectKey,
    others: &[ObjectKey],
    name: &str,
) -> Result<Vec<ObjectKey>, InventoryError> {
    let mut checked: Vec<(ObjectKey, ObjectKey)> = Vec::with_capacity(others.len());
    for other in others {
        let (a, b) = relationships::validate(tables, holder, other, name, false)?;
        if tables.relationships.linked(&a, &b, name) || checked.iter().any(|(_, seen)| *seen == b) {
            return Err(InventoryError::not_permitted(format!("{b} is already related to {a} through {name}")));
        }
        checked.push((a, b));
    }
    Ok(checked
        .into_iter()
        .map(|(a, b)| {
            relationships::insert(tables, a, b.clone(), name, BTreeMap::new());
            b
        })
        .collect())
}

/// Releases the `name` link between `holder` and `other_id`.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects and pairs that are not linked.
pub fn release(tables: &mut Tables, holder: &ObjectKey, other_id: &str, name: &str) -> Result<(), InventoryError> {
    if relationships::release(tables, holder, other_id, name)? == 0 {
        return Err(InventoryError::not_found(format!("{holder} is not related to {other_id} through {name}")));
    }
    Ok(())
}

/// Family members linked to `object` through `name`.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn holders_of(tables: &Tables, object: &ObjectKey, family: &str, name: &str) -> Result<Vec<ObjectLight>, InventoryError> {
    let related = relationships::special_attribute(tables, object, name)?;
    Ok(related.into_iter().filter(|o| tables.classes.is_subclass_of(&o.class_name, family)).collect())
}

/// Copies a family member into another pool of the family. Unique attributes are left
/// behind. Returns the id of the copy.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown members or pools, or pools of other families.
/// * [`InventoryError::OperationNotPermitted`] when the pool class does not admit the
///   member class.
pub fn copy_to_pool(
    tables: &mut Tables,
    family: &str,
    pool_id: &str,
    class_name: &str,
    id: &str,
) -> Result<Id, InventoryError> {
    let mut copy = admit(tables, family, pool_id, class_name, id)?.clone();
    let unique: Vec<String> = schema::effective_attributes(tables, &copy.class_name)
        .into_iter()
        .filter(|a| a.unique || a.no_copy)
        .map(|a| a.name)
        .collect();
    copy.attributes.retain(|name, _| !unique.contains(name));
    copy.id = new_id();
    copy.parent = ParentRef::Pool(pool_id.to_owned());
    copy.creation_date = now_millis();
    let id = copy.id.clone();
    tables.objects.insert(copy);
    Ok(id)
}

/// Moves a family member into another pool of the family.
///
/// # Errors
/// See [`copy_to_pool`].
pub fn move_to_pool(
    tables: &mut Tables,
    family: &str,
    pool_id: &str,
    class_name: &str,
    id: &str,
) -> Result<(), InventoryError> {
    let id = admit(tables, family, pool_id, class_name, id)?.id.clone();
    tables.objects.edit(&id, |object| object.parent = ParentRef::Pool(pool_id.to_owned()));
    Ok(())
}

fn admit<'a>(
    tables: &'a Tables,
    family: &str,
    pool_id: &str,
    class_name: &str,
    id: &str,
) -> Result<&'a BusinessObject, InventoryError> {
    let object = member(tables, family, class_name, id)?;
    let pool = family_pool(tables, family, pool_id)?;
    if !tables.classes.is_subclass_of(&object.class_name, &pool.class_name) {
        return Err(InventoryError::not_permitted(format!(
            "Pool {} holds {} objects, not {}",
            pool.name, pool.class_name, object.class_name
        )));
    }
    Ok(object)
}

/// The module pool an item lives in and the object owning that pool, if any.
#[must_use]
pub fn pool_owner(tables: &Tables, object: &BusinessObject) -> Option<ObjectKey> {
    let ParentRef::Pool(pool_id) = &object.parent else {
        return None;
    };
    match &tables.pools.get(pool_id)?.owner {
        PoolOwner::Object(owner) => Some(owner.clone()),
        PoolOwner::Root | PoolOwner::Pool(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::constants::{ATTRIBUTE_NAME, CLASS_GENERIC_CONTRACT, CLASS_GENERIC_PROJECT};
    use kw_metadata::bootstrap::seed_core_model;

    fn named(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())])
    }

    #[test]
    fn items_stay_in_their_family() {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let contracts = create_root_pool(&mut tables, CLASS_GENERIC_CONTRACT, "Contracts", "").unwrap();
        let projects = create_root_pool(&mut tables, CLASS_GENERIC_PROJECT, "Projects", "").unwrap();

        let id = create_item(&mut tables, CLASS_GENERIC_CONTRACT, &contracts, "SupportContract", &named("c-1"), None)
            .unwrap();
        assert!(create_item(&mut tables, CLASS_GENERIC_CONTRACT, &contracts, "GeneralProject", &named("p"), None).is_err());
        assert!(create_item(&mut tables, CLASS_GENERIC_CONTRACT, &projects, "SupportContract", &named("c"), None).is_err());
        assert!(move_to_pool(&mut tables, CLASS_GENERIC_CONTRACT, &projects, "SupportContract", &id).is_err());

        let archive = create_root_pool(&mut tables, CLASS_GENERIC_CONTRACT, "Archive", "").unwrap();
        let copy = copy_to_pool(&mut tables, CLASS_GENERIC_CONTRACT, &archive, "SupportContract", &id).unwrap();
        assert_ne!(copy, id);
        move_to_pool(&mut tables, CLASS_GENERIC_CONTRACT, &archive, "SupportContract", &id).unwrap();
        assert!(items_in_pool(&tables, CLASS_GENERIC_CONTRACT, &contracts, None, 0).unwrap().is_empty());
        assert_eq!(items_in_pool(&tables, CLASS_GENERIC_CONTRACT, &archive, None, 0).unwrap().len(), 2);
        assert_eq!(all_of(&tables, CLASS_GENERIC_CONTRACT, 0).len(), 2);
        assert_eq!(root_pools(&tables, CLASS_GENERIC_CONTRACT).len(), 2);
    }
}
