//! Mirror relationships between the two faces of a port.

use kw_business::{objects, relationships};
use kw_database::Tables;
use kw_domain::constants::{CLASS_GENERIC_PORT, REL_MIRROR, REL_MIRROR_MULTIPLE};
use kw_domain::model::ObjectKey;
use kw_kernel::error::InventoryError;
use std::collections::BTreeMap;

fn port(tables: &Tables, key: &ObjectKey) -> Result<ObjectKey, InventoryError> {
    let object = objects::object(tables, &key.class_name, &key.id)?;
    if !tables.classes.is_subclass_of(&object.class_name, CLASS_GENERIC_PORT) {
        return Err(InventoryError::invalid(format!("Object {key} is not a port")));
    }
    Ok(object.key())
}

/// Makes `b` the mirror of `a`. Each port has one mirror at most.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown ports.
/// * [`InventoryError::InvalidArgument`] for objects that are no port.
/// * [`InventoryError::OperationNotPermitted`] for self mirrors and ports already mirrored.
pub fn connect(tables: &mut Tables, a: &ObjectKey, b: &ObjectKey) -> Result<(), InventoryError> {
    let (a, b) = (port(tables, a)?, port(tables, b)?);
    if a.id == b.id {
        return Err(InventoryError::not_permitted("A port can not be mirror to itself"));
    }
    for side in [&a, &b] {
        if tables.relationships.named(side, REL_MIRROR).next().is_some() {
            return Err(InventoryError::not_permitted(format!("Object {side} already has a mirror port")));
        }
    }
    let (a, b) = relationships::validate(tables, &a, &b, REL_MIRROR, true)?;
    relationships::insert(tables, a, b, REL_MIRROR, BTreeMap::new());
    Ok(())
}

/// Mirrors one port onto several others, as splitters do.
///
/// # Errors
/// As [`connect`], plus [`InventoryError::OperationNotPermitted`] for targets already
/// mirrored to `a`.
pub fn connect_multiple(tables: &mut Tables, a: &ObjectKey, targets: &[ObjectKey]) -> Result<usize, InventoryError> {
    let a = port(tables, a)?;
    let mut planned: Vec<ObjectKey> = Vec::with_capacity(targets.len());
    for target in targets {
        let target = port(tables, target)?;
        if target.id == a.id {
            return Err(InventoryError::not_permitted("A port can not be mirror to itself"));
        }
        if planned.contains(&target) || tables.relationships.linked(&a, &target, REL_MIRROR_MULTIPLE) {
            return Err(InventoryError::not_permitted(format!("Object {target} is already a mirror of {a}")));
        }
        relationships::validate(tables, &a, &target, REL_MIRROR_MULTIPLE, false)?;
        planned.push(target);
    }
    let count = planned.len();
    for target in planned {
        relationships::insert(tables, a.clone(), target, REL_MIRROR_MULTIPLE, BTreeMap::new());
    }
    Ok(count)
}

/// Releases every `name` mirror of a port. Returns how many were released.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown ports.
/// * [`InventoryError::InvalidArgument`] for objects that are no port.
pub fn release(tables: &mut Tables, key: &ObjectKey, name: &str) -> Result<usize, InventoryError> {
    let key = port(tables, key)?;
    Ok(tables.relationships.release(&key, name, None).len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::inventory::{BusinessObject, ParentRef};
    use kw_metadata::bootstrap::seed_core_model;

    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        for (class_name, id) in [("OpticalPort", "front"), ("OpticalPort", "back"), ("OpticalPort", "tap"), ("Router", "r1")] {
            tables.objects.insert(BusinessObject {
                id: id.to_owned(),
                class_name: class_name.to_owned(),
                name: id.to_owned(),
                parent: ParentRef::Root,
                attributes: BTreeMap::new(),
                creation_date: 0,
            });
        }
        tables
    }

    fn port_key(id: &str) -> ObjectKey {
        ObjectKey::new("OpticalPort", id)
    }

    #[test]
    fn a_port_has_one_mirror() {
        let mut tables = tables();
        connect(&mut tables, &port_key("front"), &port_key("back")).unwrap();
        assert!(connect(&mut tables, &port_key("tap"), &port_key("back")).is_err());
        assert!(connect(&mut tables, &port_key("tap"), &port_key("tap")).is_err());
        assert!(matches!(
            connect(&mut tables, &port_key("tap"), &ObjectKey::new("Router", "r1")),
            Err(InventoryError::InvalidArgument { .. })
        ));

        assert_eq!(release(&mut tables, &port_key("back"), REL_MIRROR).unwrap(), 1);
        connect(&mut tables, &port_key("tap"), &port_key("back")).unwrap();
    }

    #[test]
    fn multiple_mirrors_are_all_or_nothing() {
        let mut tables = tables();
        assert_eq!(connect_multiple(&mut tables, &port_key("front"), &[port_key("back"), port_key("tap")]).unwrap(), 2);
        assert!(connect_multiple(&mut tables, &port_key("front"), &[port_key("back")]).is_err());

        assert!(connect_multiple(&mut tables, &port_key("tap"), &[port_key("back"), port_key("tap")]).is_err());
        assert_eq!(tables.relationships.len(), 2);
        assert_eq!(release(&mut tables, &port_key("front"), REL_MIRROR_MULTIPLE).unwrap(), 2);
    }
}
