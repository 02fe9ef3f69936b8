//! Subnets. A subnet is named after its block in CIDR notation and lives either in a subnet
//! pool or as a special child of a wider subnet of the same version. Its network address,
//! broadcast address and host count are derived from the name on creation.

use crate::cidr::{Cidr, Span, parse_address};
use crate::pools;
use kw_business::navigation::sorted;
use kw_business::objects::{self, NewObject, Removed, Store};
use kw_database::Tables;
use kw_domain::constants::{
    ATTRIBUTE_BROADCAST_IP, ATTRIBUTE_HOSTS, ATTRIBUTE_NAME, ATTRIBUTE_NETWORK_IP, CLASS_GENERIC_SUBNET,
    CLASS_IP_ADDRESS, CLASS_SUBNET_IPV4, CLASS_SUBNET_IPV6, IPV4_TYPE, IPV6_TYPE,
};
use kw_domain::model::inventory::{BusinessObject, ParentRef};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_metadata::values::RemoteObject;
use std::collections::BTreeMap;

/// The IP version a concrete subnet class stands for.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for anything but `SubnetIPv4` and `SubnetIPv6`.
pub fn version_of(class_name: &str) -> Result<i32, InventoryError> {
    match class_name {
        CLASS_SUBNET_IPV4 => Ok(IPV4_TYPE),
        CLASS_SUBNET_IPV6 => Ok(IPV6_TYPE),
        other => Err(InventoryError::invalid(format!("{other} is not a subnet class"))),
    }
}

/// The block a stored subnet covers.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] when the name is not a block in CIDR notation.
pub fn block(subnet: &BusinessObject) -> Result<Cidr, InventoryError> {
    Cidr::parse(&subnet.name)
}

/// Looks a subnet up, accepting either subnet class.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown subnets.
pub fn find<'a>(tables: &'a Tables, class_name: &str, id: &str) -> Result<&'a BusinessObject, InventoryError> {
    let subnet = objects::object(tables, class_name, id)?;
    if !tables.classes.is_subclass_of(&subnet.class_name, CLASS_GENERIC_SUBNET) {
        return Err(InventoryError::not_found(format!("Subnet {id} could not be found")));
    }
    Ok(subnet)
}

fn nested_subnets<'a>(tables: &'a Tables, parent: &ParentRef) -> impl Iterator<Item = &'a BusinessObject> + use<'a> {
    tables
        .objects
        .children_of(parent)
        .filter(|o| tables.classes.is_subclass_of(&o.class_name, CLASS_GENERIC_SUBNET))
}

/// Creates a subnet under a subnet pool or under a subnet. `parent_id` is tried as a pool
/// first.
///
/// The `name` attribute carries the block. Host bits are dropped from it, and the derived
/// attributes override whatever the caller sent for them.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown parents.
/// * [`InventoryError::InvalidArgument`] for a missing or malformed block, a block of the
///   wrong version, or a nested block that is not strictly inside its parent.
/// * [`InventoryError::OperationNotPermitted`] when the block overlaps a sibling.
pub fn create_subnet(
    tables: &mut Tables,
    parent_id: &str,
    class_name: &str,
    attributes: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    let version = version_of(class_name)?;
    let name = attributes
        .get(ATTRIBUTE_NAME)
        .ok_or_else(|| InventoryError::invalid("A subnet needs its block in CIDR notation as name"))?;
    let cidr = Cidr::parse(name)?;
    if cidr.version() != version {
        return Err(InventoryError::invalid(format!("{cidr} does not fit a {class_name}")));
    }

    let in_pool = tables.pools.contains_key(parent_id);
    let siblings = if in_pool {
        pools::subnet_pool(tables, parent_id)?;
        ParentRef::Pool(parent_id.to_owned())
    } else {
        let parent = find(tables, class_name, parent_id)?;
        let outer = block(parent)?;
        if cidr.prefix() <= outer.prefix() || !outer.span().contains(&cidr.span()) {
            return Err(InventoryError::invalid(format!("{cidr} does not lie inside {outer}")));
        }
        ParentRef::Special(parent.key())
    };
    if let Some(taken) = nested_subnets(tables, &siblings)
        .find(|s| block(s).is_ok_and(|other| other.span().overlaps(&cidr.span())))
    {
        return Err(InventoryError::not_permitted(format!("{cidr} overlaps {}", taken.name)));
    }

    let mut attributes = attributes.clone();
    attributes.insert(ATTRIBUTE_NAME.to_owned(), cidr.to_string());
    attributes.insert(ATTRIBUTE_NETWORK_IP.to_owned(), cidr.network().to_string());
    attributes.insert(ATTRIBUTE_BROADCAST_IP.to_owned(), cidr.broadcast().to_string());
    let hosts = i32::try_from(cidr.hosts()).unwrap_or(i32::MAX);
    attributes.insert(ATTRIBUTE_HOSTS.to_owned(), hosts.to_string());

    if in_pool {
        return objects::create_pool_item(tables, parent_id, class_name, &attributes);
    }
    let new = NewObject {
        class_name: class_name.to_owned(),
        parent_class_name: class_name.to_owned(),
        parent_id: parent_id.to_owned(),
        attributes,
        template_id: None,
    };
    objects::create_object(tables, Store::Objects, &new, true)
}

/// Subnets stored directly in a pool.
///
/// # Errors
/// See [`pools::subnet_pool`].
pub fn subnets_in_pool(tables: &Tables, pool_id: &str, limit: i64) -> Result<Vec<ObjectLight>, InventoryError> {
    let pool = pools::subnet_pool(tables, pool_id)?;
    let lights = nested_subnets(tables, &ParentRef::Pool(pool.id.clone())).map(BusinessObject::light).collect();
    Ok(sorted(lights, limit))
}

/// # Errors
/// See [`find`].
pub fn subnet(tables: &Tables, class_name: &str, id: &str) -> Result<RemoteObject, InventoryError> {
    find(tables, class_name, id).map(RemoteObject::from)
}

/// Subnets nested directly in a subnet.
///
/// # Errors
/// See [`find`].
pub fn subnets_in_subnet(
    tables: &Tables,
    class_name: &str,
    id: &str,
    limit: i64,
) -> Result<Vec<ObjectLight>, InventoryError> {
    let parent = ParentRef::Special(find(tables, class_name, id)?.key());
    Ok(sorted(nested_subnets(tables, &parent).map(BusinessObject::light).collect(), limit))
}

/// Addresses taken in a subnet.
///
/// # Errors
/// See [`find`].
pub fn used_ips(tables: &Tables, class_name: &str, id: &str, limit: i64) -> Result<Vec<ObjectLight>, InventoryError> {
    let parent = ParentRef::Special(find(tables, class_name, id)?.key());
    let lights = tables
        .objects
        .children_of(&parent)
        .filter(|o| o.class_name == CLASS_IP_ADDRESS)
        .map(BusinessObject::light)
        .collect();
    Ok(sorted(lights, limit))
}

/// Deletes subnets with the subnets and addresses inside them.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown subnets, before anything is deleted.
/// * [`InventoryError::OperationNotPermitted`] for subnets or addresses holding
///   relationships when `release_relationships` is not set.
pub fn delete_subnets(
    tables: &mut Tables,
    class_name: &str,
    ids: &[Id],
    release_relationships: bool,
) -> Result<Removed, InventoryError> {
    let keys = ids.iter().map(|id| find(tables, class_name, id).map(BusinessObject::key)).collect::<Result<Vec<ObjectKey>, _>>()?;
    objects::delete_objects(tables, Store::Objects, &keys, release_relationships)
}

/// Whether the range from `network_ip` to `broadcast_ip` overlaps any stored subnet.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for malformed addresses, mixed versions or reversed
/// bounds.
pub fn overlaps(tables: &Tables, network_ip: &str, broadcast_ip: &str) -> Result<bool, InventoryError> {
    let range = Span::between(parse_address(network_ip)?, parse_address(broadcast_ip)?)?;
    Ok([CLASS_SUBNET_IPV4, CLASS_SUBNET_IPV6]
        .into_iter()
        .flat_map(|class| tables.objects.of_class(class))
        .filter_map(|subnet| block(subnet).ok())
        .any(|cidr| cidr.span().overlaps(&range)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pools::{create_subnet_pool, ensure_root_pools};
    use kw_domain::constants::ROOT_ID;
    use kw_metadata::bootstrap::seed_core_model;

    fn named(name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), name.to_owned())])
    }

    fn with_pool() -> (Tables, Id) {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        ensure_root_pools(&mut tables).unwrap();
        let pool = create_subnet_pool(&mut tables, ROOT_ID, "Core", "", CLASS_SUBNET_IPV4).unwrap();
        (tables, pool)
    }

    #[test]
    fn derived_attributes_follow_the_block() {
        let (mut tables, pool) = with_pool();
        let id = create_subnet(&mut tables, &pool, CLASS_SUBNET_IPV4, &named("10.1.2.3/24")).unwrap();
        let stored = subnet(&tables, CLASS_SUBNET_IPV4, &id).unwrap();
        assert_eq!(stored.name, "10.1.2.0/24");
        assert_eq!(stored.attributes[ATTRIBUTE_NETWORK_IP], "10.1.2.0");
        assert_eq!(stored.attributes[ATTRIBUTE_BROADCAST_IP], "10.1.2.255");
        assert_eq!(stored.attributes[ATTRIBUTE_HOSTS], "254");
        assert!(create_subnet(&mut tables, &pool, CLASS_SUBNET_IPV4, &named("2001:db8::/32")).is_err());
        assert!(create_subnet(&mut tables, &pool, CLASS_SUBNET_IPV4, &BTreeMap::new()).is_err());
    }

    #[test]
    fn siblings_never_overlap() {
        let (mut tables, pool) = with_pool();
        let wide = create_subnet(&mut tables, &pool, CLASS_SUBNET_IPV4, &named("10.0.0.0/16")).unwrap();
        let clash = create_subnet(&mut tables, &pool, CLASS_SUBNET_IPV4, &named("10.0.4.0/24"));
        assert!(matches!(clash, Err(InventoryError::OperationNotPermitted { .. })));

        create_subnet(&mut tables, &wide, CLASS_SUBNET_IPV4, &named("10.0.4.0/24")).unwrap();
        assert!(create_subnet(&mut tables, &wide, CLASS_SUBNET_IPV4, &named("10.0.4.128/25")).is_err());
        assert!(create_subnet(&mut tables, &wide, CLASS_SUBNET_IPV4, &named("10.0.0.0/16")).is_err());
        assert!(create_subnet(&mut tables, &wide, CLASS_SUBNET_IPV4, &named("10.9.0.0/24")).is_err());
        assert_eq!(subnets_in_subnet(&tables, CLASS_GENERIC_SUBNET, &wide, 0).unwrap().len(), 1);

        assert!(overlaps(&tables, "10.0.200.0", "10.0.200.255").unwrap());
        assert!(!overlaps(&tables, "10.1.0.0", "10.1.0.255").unwrap());
        assert!(overlaps(&tables, "10.1.0.0", "10.0.0.1").is_err());
    }

    #[test]
    fn deleting_a_subnet_takes_nested_ones() {
        let (mut tables, pool) = with_pool();
        let wide = create_subnet(&mut tables, &pool, CLASS_SUBNET_IPV4, &named("172.16.0.0/12")).unwrap();
        create_subnet(&mut tables, &wide, CLASS_SUBNET_IPV4, &named("172.16.1.0/24")).unwrap();
        let removed = delete_subnets(&mut tables, CLASS_SUBNET_IPV4, &[wide], false).unwrap();
        assert_eq!(removed.objects.len(), 2);
        assert!(subnets_in_pool(&tables, &pool, 0).unwrap().is_empty());
    }
}
