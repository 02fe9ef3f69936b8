//! Physical links and containers as objects of the inventory.

use crate::path;
use crate::wiring::{self, ConnectionKind};
use kw_business::objects::{self, NewObject, Removed, Store};
use kw_business::{navigation, relationships};
use kw_database::Tables;
use kw_domain::constants::{
    ATTRIBUTE_NAME, CLASS_DUMMY_ROOT, CLASS_GENERIC_PHYSICAL_CONTAINER, CLASS_GENERIC_PHYSICAL_LINK,
    CLASS_GENERIC_PORT, POOL_CLASS, REL_ENDPOINT_A, REL_ENDPOINT_B,
};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_metadata::schema;
use kw_metadata::values::RemoteObject;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Parameters of `createPhysicalConnection`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConnection {
    pub class_name: String,
    pub endpoint_a: ObjectKey,
    pub endpoint_b: ObjectKey,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub template_id: Option<Id>,
}

/// Creates a link or container between two endpoints, as a special child of the closest
/// object both endpoints hang from.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown classes or endpoints.
/// * [`InventoryError::InvalidArgument`] for non connection classes, endpoints of the wrong
///   class or a missing name.
/// * [`InventoryError::OperationNotPermitted`] for occupied ports, endpoints that only share
///   the root, and whatever the containment and relationship rules refuse.
pub fn create(tables: &mut Tables, new: &NewConnection) -> Result<Id, InventoryError> {
    let kind = ConnectionKind::of(tables, &new.class_name)?;
    if !ConnectionKind::PHYSICAL.contains(&kind) {
        return Err(InventoryError::invalid(format!("Class {} is not a physical connection", new.class_name)));
    }
    if new.attributes.get(ATTRIBUTE_NAME).is_none_or(|name| name.trim().is_empty()) {
        return Err(InventoryError::invalid("The name of a connection can not be empty"));
    }
    let a = wiring::endpoint(tables, kind, &new.endpoint_a)?;
    let b = wiring::endpoint(tables, kind, &new.endpoint_b)?;
    if a == b {
        return Err(InventoryError::not_permitted("Can not connect an object to itself"));
    }
    let parent = navigation::common_parent(tables, &a, &b)?
        .filter(|p| p.class_name != CLASS_DUMMY_ROOT && p.class_name != POOL_CLASS)
        .ok_or_else(|| {
            InventoryError::not_permitted(format!("{a} and {b} share no parent the connection could hang from"))
        })?;

    let object = NewObject {
        class_name: new.class_name.clone(),
        parent_class_name: parent.class_name,
        parent_id: parent.id,
        attributes: new.attributes.clone(),
        template_id: new.template_id.clone(),
    };
    let id = objects::create_object(tables, Store::Objects, &object, true)?;
    let key = ObjectKey::new(new.class_name.clone(), id.clone());

    let wired = relationships::validate(tables, &key, &a, REL_ENDPOINT_A, true)
        .and_then(|_| relationships::validate(tables, &key, &b, REL_ENDPOINT_B, true));
    if let Err(error) = wired {
        objects::delete_objects(tables, Store::Objects, &[key], true)?;
        return Err(error);
    }
    relationships::insert(tables, key.clone(), a, REL_ENDPOINT_A, BTreeMap::new());
    relationships::insert(tables, key, b, REL_ENDPOINT_B, BTreeMap::new());
    Ok(id)
}

/// Deletes a link or container with whatever it carries, releasing its relationships.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown connections.
/// * [`InventoryError::InvalidArgument`] for objects that are no physical connection.
pub fn delete(tables: &mut Tables, class_name: &str, id: &str) -> Result<Removed, InventoryError> {
    let (key, _) = wiring::resolve(tables, class_name, id, ConnectionKind::PHYSICAL)?;
    objects::delete_objects(tables, Store::Objects, &[key], true)
}

/// The link ending at a port, if any.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown ports.
/// * [`InventoryError::InvalidArgument`] for objects that are no port.
pub fn link_connected_to_port(tables: &Tables, class_name: &str, id: &str) -> Result<Option<RemoteObject>, InventoryError> {
    schema::subclass_of(tables, class_name, CLASS_GENERIC_PORT)?;
    let port = objects::object(tables, class_name, id)?.key();
    Ok([REL_ENDPOINT_A, REL_ENDPOINT_B]
        .into_iter()
        .flat_map(|name| tables.relationships.incoming(&port, name))
        .filter(|link| tables.classes.is_subclass_of(&link.class_name, CLASS_GENERIC_PHYSICAL_LINK))
        .find_map(|link| tables.objects.get_by_key(&link))
        .map(RemoteObject::from))
}

/// Containers of class `container_class` (or a subclass) running between `a` and `b`, in
/// either direction.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects or classes.
/// * [`InventoryError::InvalidArgument`] when `container_class` is no container class.
pub fn containers_between(
    tables: &Tables,
    a: &ObjectKey,
    b: &ObjectKey,
    container_class: &str,
) -> Result<Vec<ObjectLight>, InventoryError> {
    schema::subclass_of(tables, container_class, CLASS_GENERIC_PHYSICAL_CONTAINER)?;
    let a = objects::object(tables, &a.class_name, &a.id)?.key();
    let b = objects::object(tables, &b.class_name, &b.id)?.key();
    let ends_at_b = |container: &ObjectKey| {
        tables.relationships.linked(container, &b, REL_ENDPOINT_A) || tables.relationships.linked(container, &b, REL_ENDPOINT_B)
    };
    let found: BTreeSet<ObjectLight> = [REL_ENDPOINT_A, REL_ENDPOINT_B]
        .into_iter()
        .flat_map(|name| tables.relationships.incoming(&a, name))
        .filter(|container| tables.classes.is_subclass_of(&container.class_name, container_class))
        .filter(|container| ends_at_b(container))
        .filter_map(|container| relationships::light(tables, &container))
        .collect();
    Ok(found.into_iter().collect())
}

/// The physical paths leaving the ports found anywhere below an object. Each connected
/// port contributes one path unless an earlier path already runs through it.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn connections_in_object(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<Vec<ObjectLight>>, InventoryError> {
    let root = objects::object(tables, class_name, id)?;
    let mut covered = BTreeSet::new();
    let mut paths = Vec::new();
    for port in objects::subtree(tables, Store::Objects, root).objects {
        if covered.contains(&port.id)
            || !tables.classes.is_subclass_of(&port.class_name, CLASS_GENERIC_PORT)
            || !wiring::is_connected(tables, ConnectionKind::Link, &port)
        {
            continue;
        }
        let trace = path::physical_path(tables, &port.class_name, &port.id)?;
        covered.extend(trace.iter().map(|hop| hop.id.clone()));
        paths.push(trace);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::inventory::{BusinessObject, ParentRef};
    use kw_metadata::bootstrap::seed_core_model;

    fn add(tables: &mut Tables, class_name: &str, id: &str, parent: ParentRef) -> ObjectKey {
        tables.objects.insert(BusinessObject {
            id: id.to_owned(),
            class_name: class_name.to_owned(),
            name: id.to_owned(),
            parent,
            attributes: BTreeMap::new(),
            creation_date: 0,
        });
        ObjectKey::new(class_name, id)
    }

    /// One city, two routers with two ports each.
    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        let country = add(&mut tables, "Country", "pe", ParentRef::Root);
        let city = add(&mut tables, "City", "lima", ParentRef::Child(country));
        add(&mut tables, "Country", "cl", ParentRef::Root);
        for router in ["r1", "r2"] {
            let key = add(&mut tables, "Router", router, ParentRef::Child(city.clone()));
            for port in ["p1", "p2"] {
                add(&mut tables, "OpticalPort", &format!("{router}-{port}"), ParentRef::Child(key.clone()));
            }
        }
        tables
    }

    fn link(a: &str, b: &str) -> NewConnection {
        NewConnection {
            class_name: "OpticalLink".to_owned(),
            endpoint_a: ObjectKey::new("OpticalPort", a),
            endpoint_b: ObjectKey::new("OpticalPort", b),
            attributes: BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), format!("{a}~{b}"))]),
            template_id: None,
        }
    }

    #[test]
    fn links_hang_from_the_common_parent() {
        let mut tables = tables();
        let id = create(&mut tables, &link("r1-p1", "r2-p1")).unwrap();
        let object = tables.objects.get(&id).unwrap();
        assert_eq!(object.parent, ParentRef::Special(ObjectKey::new("City", "lima")));

        let found = link_connected_to_port(&tables, "OpticalPort", "r2-p1").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(link_connected_to_port(&tables, "OpticalPort", "r2-p2").unwrap().is_none());
        assert!(link_connected_to_port(&tables, "Router", "r1").is_err());
    }

    #[test]
    fn occupied_ports_and_bad_requests_are_refused() {
        let mut tables = tables();
        create(&mut tables, &link("r1-p1", "r2-p1")).unwrap();
        assert!(matches!(
            create(&mut tables, &link("r1-p1", "r2-p2")),
            Err(InventoryError::OperationNotPermitted { .. })
        ));
        assert!(create(&mut tables, &link("r1-p2", "r1-p2")).is_err());

        let mut unnamed = link("r1-p2", "r2-p2");
        unnamed.attributes.clear();
        assert!(matches!(create(&mut tables, &unnamed), Err(InventoryError::InvalidArgument { .. })));

        let mut wrong = link("r1-p2", "r2-p2");
        wrong.class_name = "Router".to_owned();
        assert!(create(&mut tables, &wrong).is_err());
        assert_eq!(tables.relationships.len(), 2);
    }

    #[test]
    fn endpoints_sharing_only_the_root_can_not_be_connected() {
        let mut tables = tables();
        let container = NewConnection {
            class_name: "WireContainer".to_owned(),
            endpoint_a: ObjectKey::new("Country", "pe"),
            endpoint_b: ObjectKey::new("Country", "cl"),
            attributes: BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), "border".to_owned())]),
            template_id: None,
        };
        assert!(matches!(create(&mut tables, &container), Err(InventoryError::OperationNotPermitted { .. })));
        assert_eq!(tables.objects.len(), 9);
    }

    #[test]
    fn containers_between_objects() {
        let mut tables = tables();
        let duct = NewConnection {
            class_name: "WireContainer".to_owned(),
            endpoint_a: ObjectKey::new("Router", "r1"),
            endpoint_b: ObjectKey::new("Router", "r2"),
            attributes: BTreeMap::from([(ATTRIBUTE_NAME.to_owned(), "duct".to_owned())]),
            template_id: None,
        };
        let first = create(&mut tables, &duct).unwrap();
        let second = create(&mut tables, &duct).unwrap();

        let (r1, r2) = (ObjectKey::new("Router", "r1"), ObjectKey::new("Router", "r2"));
        let found = containers_between(&tables, &r2, &r1, "GenericPhysicalContainer").unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|c| c.id == first) && found.iter().any(|c| c.id == second));
        assert!(containers_between(&tables, &r1, &r2, "OpticalLink").is_err());

        delete(&mut tables, "WireContainer", &first).unwrap();
        assert_eq!(containers_between(&tables, &r1, &r2, "WireContainer").unwrap().len(), 1);
        assert!(delete(&mut tables, "Router", "r1").is_err());
    }

    #[test]
    fn connections_in_a_building_are_listed_once() {
        let mut tables = tables();
        create(&mut tables, &link("r1-p1", "r2-p1")).unwrap();
        let paths = connections_in_object(&tables, "City", "lima").unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 3);
        assert!(connections_in_object(&tables, "Country", "cl").unwrap().is_empty());
    }
}
