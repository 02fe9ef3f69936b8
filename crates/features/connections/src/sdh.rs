//! SDH transport, container and tributary links.
//!
//! Transport links (`STMn`) join ports of two communications elements. Container links
//! (`VCn`) ride on numbered positions of transport links, or of high order containers,
//! between two elements. A tributary link ends on two ports and is always delivered by a
//! container of the matching class, created along with it. None of them sits in the
//! containment tree; the structure lives entirely in special relationships:
//!
//! * `sdhTransportLink` and `sdhContainerLink` tie elements to the links leaving them, so
//!   routes can be searched element to element.
//! * `sdhTransports` (transport link to container) and `sdhContains` (high order container
//!   to low order container) carry the position as the `sdhPosition` property.
//! * `sdhDelivers` ties a container to its tributary link.

use crate::mpls;
use kw_business::objects::{self, Removed, Store};
use kw_business::relationships;
use kw_database::Tables;
use kw_domain::constants::{
    ATTRIBUTE_NAME, CLASS_GENERIC_COMMUNICATIONS_ELEMENT, CLASS_GENERIC_PORT, CLASS_GENERIC_SDH_CONTAINER_LINK,
    CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK, CLASS_GENERIC_SDH_HIGH_ORDER_TRIBUTARY_LINK,
    CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK, CLASS_GENERIC_SDH_TRANSPORT_LINK, CLASS_GENERIC_SDH_TRIBUTARY_LINK,
    REL_SDH_CONTAINER_LINK, REL_SDH_CONTAINS, REL_SDH_DELIVERS, REL_SDH_TL_ENDPOINT_A, REL_SDH_TL_ENDPOINT_B,
    REL_SDH_TRANSPORT_LINK, REL_SDH_TRANSPORTS, REL_SDH_TTL_ENDPOINT_A, REL_SDH_TTL_ENDPOINT_B,
};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relationship property holding the position a container takes on its carrier.
pub const PROPERTY_SDH_POSITION: &str = "sdhPosition";

/// Routes longer than this many hops are not explored.
const MAX_ROUTE_HOPS: usize = 30;

/// Relationships deleted along with the links they describe.
const STRUCTURE: &[&str] = &[
    REL_SDH_TL_ENDPOINT_A,
    REL_SDH_TL_ENDPOINT_B,
    REL_SDH_TTL_ENDPOINT_A,
    REL_SDH_TTL_ENDPOINT_B,
    REL_SDH_TRANSPORT_LINK,
    REL_SDH_CONTAINER_LINK,
    REL_SDH_TRANSPORTS,
    REL_SDH_CONTAINS,
    REL_SDH_DELIVERS,
];

/// A position taken on a transport link or a high order container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdhPosition {
    pub link_class_name: String,
    pub link_id: Id,
    pub position: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSdhLink {
    pub endpoint_a: ObjectKey,
    pub endpoint_b: ObjectKey,
    pub link_type: String,
    /// Ignored for transport links.
    #[serde(default)]
    pub positions: Vec<SdhPosition>,
    #[serde(default)]
    pub default_name: String,
}

impl NewSdhLink {
    fn attributes(&self) -> BTreeMap<String, String> {
        let mut attributes = BTreeMap::new();
        if !self.default_name.trim().is_empty() {
            attributes.insert(ATTRIBUTE_NAME.to_owned(), self.default_name.trim().to_owned());
        }
        attributes
    }
}

/// A container found on a carrier. `positions` only holds the position on that carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub container: ObjectLight,
    /// `true` for containers holding other containers instead of delivering a tributary.
    pub structured: bool,
    pub positions: Vec<SdhPosition>,
}

/// Positions an `STMn` transport link offers, `None` for classes not named that way.
#[must_use]
pub fn transport_capacity(class_name: &str) -> Option<u32> {
    class_name.strip_prefix("STM")?.parse().ok()
}

fn member(tables: &Tables, family: &str, class_name: &str, id: &str) -> Result<ObjectKey, InventoryError> {
    if !tables.classes.is_subclass_of(class_name, family) {
        return Err(InventoryError::invalid(format!("Class {class_name} is not a subclass of {family}")));
    }
    Ok(objects::object(tables, class_name, id)?.key())
}

fn communications_element(tables: &Tables, key: &ObjectKey) -> Result<ObjectKey, InventoryError> {
    let key = objects::object(tables, &key.class_name, &key.id)?.key();
    if !tables.classes.is_subclass_of(&key.class_name, CLASS_GENERIC_COMMUNICATIONS_ELEMENT) {
        return Err(InventoryError::invalid(format!(
            "Class {} is not a subclass of {CLASS_GENERIC_COMMUNICATIONS_ELEMENT}",
            key.class_name
        )));
    }
    Ok(key)
}

/// Resolves both endpoint ports. A port ends at most one link through `ends`.
fn free_ports(tables: &Tables, new: &NewSdhLink, ends: [&str; 2]) -> Result<(ObjectKey, ObjectKey), InventoryError> {
    let port = |side: &ObjectKey| -> Result<ObjectKey, InventoryError> {
        let port = objects::object(tables, &side.class_name, &side.id)?.key();
        if !tables.classes.is_subclass_of(&port.class_name, CLASS_GENERIC_PORT) {
            return Err(InventoryError::invalid(format!("The endpoint {port} is not a port")));
        }
        if let Some(name) = ends.iter().find(|&&name| tables.relationships.named(&port, name).next().is_some()) {
            return Err(InventoryError::not_permitted(format!("The port {port} already ends a link ({name})")));
        }
        Ok(port)
    };
    let (a, b) = (port(&new.endpoint_a)?, port(&new.endpoint_b)?);
    if a == b {
        return Err(InventoryError::not_permitted("Can not connect a port to itself"));
    }
    Ok((a, b))
}

/// Checks that every position names a free slot on a link of class `carrier`.
fn checked_positions(
    tables: &Tables,
    positions: &[SdhPosition],
    carrier: &str,
    name: &str,
) -> Result<Vec<(ObjectKey, u32)>, InventoryError> {
    if positions.is_empty() {
        return Err(InventoryError::invalid("At least one position is required"));
    }
    let mut checked: Vec<(ObjectKey, u32)> = Vec::with_capacity(positions.len());
    for requested in positions {
        let link = member(tables, carrier, &requested.link_class_name, &requested.link_id)?;
        let position = requested.position;
        if position == 0 || transport_capacity(&link.class_name).is_some_and(|capacity| position > capacity) {
            return Err(InventoryError::invalid(format!("Position {position} is out of range for {link}")));
        }
        if checked.iter().any(|(other, _)| other == &link) {
            return Err(InventoryError::invalid(format!("The link {link} is listed more than once")));
        }
        let value = position.to_string();
        let taken = tables.relationships.named(&link, name).any(|r| {
            r.a == link && r.properties.get(PROPERTY_SDH_POSITION).map(String::as_str) == Some(value.as_str())
        });
        if taken {
            return Err(InventoryError::not_permitted(format!("Position {position} of {link} is already taken")));
        }
        checked.push((link, position));
    }
    Ok(checked)
}

fn position_property(position: u32) -> BTreeMap<String, String> {
    BTreeMap::from([(PROPERTY_SDH_POSITION.to_owned(), position.to_string())])
}

/// Creates a transport link between two ports of communications elements.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown ports or link classes.
/// * [`InventoryError::InvalidArgument`] for endpoints that are no port or lie outside any
///   communications element, and for classes outside `GenericSDHTransportLink`.
/// * [`InventoryError::OperationNotPermitted`] for ports already ending a transport link.
pub fn create_transport_link(tables: &mut Tables, new: &NewSdhLink) -> Result<Id, InventoryError> {
    let (a, b) = free_ports(tables, new, [REL_SDH_TL_ENDPOINT_A, REL_SDH_TL_ENDPOINT_B])?;
    let device_a = mpls::require_device(tables, &a)?;
    let device_b = mpls::require_device(tables, &b)?;
    let id = objects::create_detached_object(tables, &new.link_type, CLASS_GENERIC_SDH_TRANSPORT_LINK, &new.attributes())?;
    let link = ObjectKey::new(new.link_type.clone(), id.clone());
    relationships::insert(tables, link.clone(), a, REL_SDH_TL_ENDPOINT_A, BTreeMap::new());
    relationships::insert(tables, link.clone(), b, REL_SDH_TL_ENDPOINT_B, BTreeMap::new());
    relationships::insert(tables, device_a, link.clone(), REL_SDH_TRANSPORT_LINK, BTreeMap::new());
    relationships::insert(tables, link, device_b, REL_SDH_TRANSPORT_LINK, BTreeMap::new());
    Ok(id)
}

/// Creates a container link between two communications elements, riding on the given
/// positions of transport links.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown elements, links or classes.
/// * [`InventoryError::InvalidArgument`] for endpoints that are no communications element,
///   missing or out of range positions, and classes outside `GenericSDHContainerLink`.
/// * [`InventoryError::OperationNotPermitted`] for taken positions and equal endpoints.
pub fn create_container_link(tables: &mut Tables, new: &NewSdhLink) -> Result<Id, InventoryError> {
    let a = communications_element(tables, &new.endpoint_a)?;
    let b = communications_element(tables, &new.endpoint_b)?;
    if a == b {
        return Err(InventoryError::not_permitted("A container link needs two different endpoints"));
    }
    let positions = checked_positions(tables, &new.positions, CLASS_GENERIC_SDH_TRANSPORT_LINK, REL_SDH_TRANSPORTS)?;
    let id = objects::create_detached_object(tables, &new.link_type, CLASS_GENERIC_SDH_CONTAINER_LINK, &new.attributes())?;
    let container = ObjectKey::new(new.link_type.clone(), id.clone());
    relationships::insert(tables, a, container.clone(), REL_SDH_CONTAINER_LINK, BTreeMap::new());
    relationships::insert(tables, container.clone(), b, REL_SDH_CONTAINER_LINK, BTreeMap::new());
    for (link, position) in positions {
        relationships::insert(tables, link, container.clone(), REL_SDH_TRANSPORTS, position_property(position));
    }
    Ok(id)
}

/// Creates a tributary link between two ports with the container delivering it. The
/// container class is the tributary class without its `TributaryLink` suffix. High order
/// containers ride on transport links, low order ones on high order containers.
///
/// Returns the id of the tributary link.
///
/// # Errors
/// As [`create_container_link`], plus [`InventoryError::InvalidArgument`] for tributary
/// classes that are neither high nor low order or have no matching container class, and
/// [`InventoryError::OperationNotPermitted`] for ports already ending a tributary link.
pub fn create_tributary_link(tables: &mut Tables, new: &NewSdhLink) -> Result<Id, InventoryError> {
    let link_type = new.link_type.as_str();
    let (carried_by, carrier) = if tables.classes.is_subclass_of(link_type, CLASS_GENERIC_SDH_HIGH_ORDER_TRIBUTARY_LINK) {
        (REL_SDH_TRANSPORTS, CLASS_GENERIC_SDH_TRANSPORT_LINK)
    } else if tables.classes.is_subclass_of(link_type, CLASS_GENERIC_SDH_LOW_ORDER_TRIBUTARY_LINK) {
        (REL_SDH_CONTAINS, CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK)
    } else {
        return Err(InventoryError::invalid(format!(
            "Class {link_type} is neither a high nor a low order tributary link"
        )));
    };
    let container_class = link_type
        .strip_suffix("TributaryLink")
        .filter(|class| tables.classes.is_subclass_of(class, CLASS_GENERIC_SDH_CONTAINER_LINK))
        .ok_or_else(|| InventoryError::invalid(format!("No container class can deliver {link_type}")))?
        .to_owned();
    let (a, b) = free_ports(tables, new, [REL_SDH_TTL_ENDPOINT_A, REL_SDH_TTL_ENDPOINT_B])?;
    let positions = checked_positions(tables, &new.positions, carrier, carried_by)?;

    let attributes = new.attributes();
    let container_id =
        objects::create_detached_object(tables, &container_class, CLASS_GENERIC_SDH_CONTAINER_LINK, &attributes)?;
    let container = ObjectKey::new(container_class, container_id);
    let id = match objects::create_detached_object(tables, link_type, CLASS_GENERIC_SDH_TRIBUTARY_LINK, &attributes) {
        Ok(id) => id,
        Err(error) => {
            objects::delete_objects(tables, Store::Objects, &[container], true)?;
            return Err(error);
        },
    };
    let tributary = ObjectKey::new(link_type, id.clone());
    relationships::insert(tables, tributary.clone(), a, REL_SDH_TTL_ENDPOINT_A, BTreeMap::new());
    relationships::insert(tables, tributary.clone(), b, REL_SDH_TTL_ENDPOINT_B, BTreeMap::new());
    relationships::insert(tables, container.clone(), tributary, REL_SDH_DELIVERS, BTreeMap::new());
    for (link, position) in positions {
        relationships::insert(tables, link, container.clone(), carried_by, position_property(position));
    }
    Ok(id)
}

/// Adds a container and everything it delivers or holds to `doomed`.
fn collect_container(tables: &Tables, container: &ObjectKey, doomed: &mut Vec<ObjectKey>) {
    if doomed.contains(container) {
        return;
    }
    doomed.push(container.clone());
    for tributary in tables.relationships.outgoing(container, REL_SDH_DELIVERS) {
        if !doomed.contains(&tributary) {
            doomed.push(tributary);
        }
    }
    for inner in tables.relationships.outgoing(container, REL_SDH_CONTAINS) {
        collect_container(tables, &inner, doomed);
    }
}

/// Deletes `doomed` with its structural relationships. Without `force`, any other
/// relationship keeps everything in place.
fn remove(tables: &mut Tables, doomed: &[ObjectKey], force: bool) -> Result<Removed, InventoryError> {
    if !force {
        for key in doomed {
            let foreign = tables.relationships.of_object(key).find(|r| !STRUCTURE.contains(&r.name.as_str()));
            if let Some(relationship) = foreign {
                return Err(InventoryError::not_permitted(format!(
                    "Object {key} has a {} relationship; release it first",
                    relationship.name
                )));
            }
        }
    }
    objects::delete_objects(tables, Store::Objects, doomed, true)
}

/// Deletes a transport link with every container riding on it, and the tributaries those
/// containers deliver.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown links.
/// * [`InventoryError::InvalidArgument`] for classes outside `GenericSDHTransportLink`.
/// * [`InventoryError::OperationNotPermitted`] without `force` while any of them holds a
///   relationship other than the SDH structure.
pub fn delete_transport_link(tables: &mut Tables, class_name: &str, id: &str, force: bool) -> Result<Removed, InventoryError> {
    let link = member(tables, CLASS_GENERIC_SDH_TRANSPORT_LINK, class_name, id)?;
    let mut doomed = Vec::new();
    for container in tables.relationships.outgoing(&link, REL_SDH_TRANSPORTS) {
        collect_container(tables, &container, &mut doomed);
    }
    doomed.push(link);
    remove(tables, &doomed, force)
}

/// Deletes a container link with the containers it holds and the tributaries delivered.
///
/// # Errors
/// As [`delete_transport_link`], for classes outside `GenericSDHContainerLink`.
pub fn delete_container_link(tables: &mut Tables, class_name: &str, id: &str, force: bool) -> Result<Removed, InventoryError> {
    let container = member(tables, CLASS_GENERIC_SDH_CONTAINER_LINK, class_name, id)?;
    let mut doomed = Vec::new();
    collect_container(tables, &container, &mut doomed);
    remove(tables, &doomed, force)
}

/// Deletes a tributary link together with the container delivering it.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown links.
/// * [`InventoryError::InvalidArgument`] for classes outside `GenericSDHTributaryLink`.
pub fn delete_tributary_link(tables: &mut Tables, class_name: &str, id: &str) -> Result<Removed, InventoryError> {
    let tributary = member(tables, CLASS_GENERIC_SDH_TRIBUTARY_LINK, class_name, id)?;
    let mut doomed = Vec::new();
    for container in tables.relationships.incoming(&tributary, REL_SDH_DELIVERS) {
        collect_container(tables, &container, &mut doomed);
    }
    if !doomed.contains(&tributary) {
        doomed.push(tributary);
    }
    remove(tables, &doomed, true)
}

fn walk(tables: &Tables, target: &ObjectKey, name: &str, path: &mut Vec<ObjectKey>, found: &mut Vec<Vec<ObjectKey>>) {
    let Some(current) = path.last().cloned() else {
        return;
    };
    if &current == target {
        found.push(path.clone());
        return;
    }
    if path.len() > MAX_ROUTE_HOPS {
        return;
    }
    for next in tables.relationships.related(&current, name) {
        if path.contains(&next) {
            continue;
        }
        path.push(next);
        walk(tables, target, name, path, found);
        path.pop();
    }
}

/// Simple paths from `a` to `b` hopping through `name`, shortest first. Every route
/// alternates elements and links, both ends included.
fn routes(tables: &Tables, a: &ObjectKey, b: &ObjectKey, name: &str) -> Result<Vec<Vec<ObjectLight>>, InventoryError> {
    let a = communications_element(tables, a)?;
    let b = communications_element(tables, b)?;
    let mut found = Vec::new();
    walk(tables, &b, name, &mut vec![a], &mut found);
    found.sort_by_key(Vec::len);
    Ok(found
        .iter()
        .map(|route| route.iter().filter_map(|key| relationships::light(tables, key)).collect())
        .collect())
}

/// Routes between two communications elements over transport links.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown elements.
/// * [`InventoryError::InvalidArgument`] for objects that are no communications element.
pub fn routes_using_transport_links(
    tables: &Tables,
    a: &ObjectKey,
    b: &ObjectKey,
) -> Result<Vec<Vec<ObjectLight>>, InventoryError> {
    routes(tables, a, b, REL_SDH_TRANSPORT_LINK)
}

/// Routes between two communications elements over container links.
///
/// # Errors
/// See [`routes_using_transport_links`].
pub fn routes_using_container_links(
    tables: &Tables,
    a: &ObjectKey,
    b: &ObjectKey,
) -> Result<Vec<Vec<ObjectLight>>, InventoryError> {
    routes(tables, a, b, REL_SDH_CONTAINER_LINK)
}

fn structure(tables: &Tables, carrier: &ObjectKey, name: &str) -> Result<Vec<ContainerDefinition>, InventoryError> {
    let mut definitions = Vec::new();
    for relationship in tables.relationships.named(carrier, name).filter(|r| &r.a == carrier) {
        let Some(container) = relationships::light(tables, &relationship.b) else {
            continue;
        };
        let position = relationship
            .properties
            .get(PROPERTY_SDH_POSITION)
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| {
                InventoryError::not_found(format!(
                    "The container {} rides on {carrier} without a position",
                    container.name
                ))
            })?;
        definitions.push(ContainerDefinition {
            structured: tables.relationships.outgoing(&relationship.b, REL_SDH_DELIVERS).is_empty(),
            positions: vec![SdhPosition {
                link_class_name: carrier.class_name.clone(),
                link_id: carrier.id.clone(),
                position,
            }],
            container,
        });
    }
    definitions.sort_by_key(|d| d.positions.first().map(|p| p.position));
    Ok(definitions)
}

/// The containers riding on a transport link, by position.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown links and containers without a position.
/// * [`InventoryError::InvalidArgument`] for classes outside `GenericSDHTransportLink`.
pub fn transport_link_structure(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<ContainerDefinition>, InventoryError> {
    let link = member(tables, CLASS_GENERIC_SDH_TRANSPORT_LINK, class_name, id)?;
    structure(tables, &link, REL_SDH_TRANSPORTS)
}

/// The low order containers inside a high order container, by position.
///
/// # Errors
/// As [`transport_link_structure`], for classes outside `GenericSDHHighOrderContainerLink`.
pub fn container_link_structure(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<ContainerDefinition>, InventoryError> {
    let container = member(tables, CLASS_GENERIC_SDH_HIGH_ORDER_CONTAINER_LINK, class_name, id)?;
    structure(tables, &container, REL_SDH_CONTAINS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::constants::REL_USES;
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

    /// Three routers with three optical ports each.
    fn tables() -> Tables {
        let mut tables = Tables::default();
        seed_core_model(&mut tables);
        for router in ["r1", "r2", "r3"] {
            let device = add(&mut tables, "Router", router, ParentRef::Root);
            for port in ["p1", "p2", "p3"] {
                add(&mut tables, "OpticalPort", &format!("{router}-{port}"), ParentRef::Child(device.clone()));
            }
        }
        tables
    }

    fn port(id: &str) -> ObjectKey {
        ObjectKey::new("OpticalPort", id)
    }

    fn router(id: &str) -> ObjectKey {
        ObjectKey::new("Router", id)
    }

    fn link(a: ObjectKey, b: ObjectKey, link_type: &str, positions: Vec<SdhPosition>) -> NewSdhLink {
        NewSdhLink { endpoint_a: a, endpoint_b: b, link_type: link_type.to_owned(), positions, default_name: String::new() }
    }

    fn at(class_name: &str, id: &str, position: u32) -> SdhPosition {
        SdhPosition { link_class_name: class_name.to_owned(), link_id: id.to_owned(), position }
    }

    /// r1 -STM1- r2 -STM4- r3
    fn backbone(tables: &mut Tables) -> (Id, Id) {
        let first = create_transport_link(tables, &link(port("r1-p1"), port("r2-p1"), "STM1", vec![])).unwrap();
        let second = create_transport_link(tables, &link(port("r2-p2"), port("r3-p1"), "STM4", vec![])).unwrap();
        (first, second)
    }

    #[test]
    fn transport_links_join_devices_into_routes() {
        let mut tables = tables();
        let (first, second) = backbone(&mut tables);

        let routes = routes_using_transport_links(&tables, &router("r1"), &router("r3")).unwrap();
        assert_eq!(routes.len(), 1);
        let hops: Vec<&str> = routes[0].iter().map(|o| o.id.as_str()).collect();
        assert_eq!(hops, ["r1", first.as_str(), "r2", second.as_str(), "r3"]);
        assert!(routes_using_container_links(&tables, &router("r1"), &router("r3")).unwrap().is_empty());
        assert!(routes_using_transport_links(&tables, &port("r1-p1"), &router("r3")).is_err());

        let taken = create_transport_link(&mut tables, &link(port("r1-p1"), port("r3-p3"), "STM1", vec![]));
        assert!(matches!(taken, Err(InventoryError::OperationNotPermitted { .. })));
        assert!(create_transport_link(&mut tables, &link(port("r1-p3"), port("r3-p3"), "VC4", vec![])).is_err());
        assert!(create_transport_link(&mut tables, &link(port("r1-p3"), router("r3"), "STM1", vec![])).is_err());
        assert_eq!(transport_capacity("STM16"), Some(16));
        assert_eq!(transport_capacity("VC4"), None);
    }

    #[test]
    fn containers_take_positions_and_cascade_on_deletion() {
        let mut tables = tables();
        let (first, second) = backbone(&mut tables);

        let out_of_range = link(router("r1"), router("r2"), "VC4", vec![at("STM1", &first, 2)]);
        assert!(matches!(create_container_link(&mut tables, &out_of_range), Err(InventoryError::InvalidArgument { .. })));

        let positions = vec![at("STM1", &first, 1), at("STM4", &second, 1)];
        let vc4 = create_container_link(&mut tables, &link(router("r1"), router("r3"), "VC4", positions)).unwrap();
        let again = link(router("r1"), router("r2"), "VC4", vec![at("STM1", &first, 1)]);
        assert!(matches!(create_container_link(&mut tables, &again), Err(InventoryError::OperationNotPermitted { .. })));

        let on_second = transport_link_structure(&tables, "STM4", &second).unwrap();
        assert_eq!(on_second.len(), 1);
        assert_eq!(on_second[0].container.id, vc4);
        assert_eq!(on_second[0].positions, [at("STM4", &second, 1)]);
        assert!(on_second[0].structured);

        let tributary = create_tributary_link(
            &mut tables,
            &link(port("r1-p2"), port("r3-p2"), "VC12TributaryLink", vec![at("VC4", &vc4, 5)]),
        )
        .unwrap();
        let inside = container_link_structure(&tables, "VC4", &vc4).unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].container.class_name, "VC12");
        assert!(!inside[0].structured);
        assert!(transport_link_structure(&tables, "STM1", &first).unwrap()[0].structured);

        let routes = routes_using_container_links(&tables, &router("r1"), &router("r3")).unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].len(), 3);

        let removed = delete_transport_link(&mut tables, "STM1", &first, false).unwrap();
        assert_eq!(removed.objects.len(), 4);
        assert!(tables.objects.get(&tributary).is_none());
        assert!(tables.objects.get(&vc4).is_none());
        assert!(transport_link_structure(&tables, "STM4", &second).unwrap().is_empty());
        assert!(tables.relationships.iter().all(|r| r.name != REL_SDH_DELIVERS && r.name != REL_SDH_CONTAINS));
    }

    #[test]
    fn tributaries_go_with_their_container() {
        let mut tables = tables();
        let (first, _) = backbone(&mut tables);

        let tributary = create_tributary_link(
            &mut tables,
            &link(port("r1-p2"), port("r2-p3"), "VC4TributaryLink", vec![at("STM1", &first, 1)]),
        )
        .unwrap();
        let riding = transport_link_structure(&tables, "STM1", &first).unwrap();
        assert_eq!(riding.len(), 1);
        assert_eq!(riding[0].container.class_name, "VC4");
        assert!(!riding[0].structured);
        let reused = link(port("r1-p2"), port("r3-p2"), "VC4TributaryLink", vec![at("STM1", &first, 1)]);
        assert!(create_tributary_link(&mut tables, &reused).is_err());
        let unordered = link(port("r1-p3"), port("r3-p3"), "VC4", vec![at("STM1", &first, 1)]);
        assert!(matches!(create_tributary_link(&mut tables, &unordered), Err(InventoryError::InvalidArgument { .. })));

        let container = riding[0].container.key();
        relationships::insert(&mut tables, ObjectKey::new("DataService", "svc"), container.clone(), REL_USES, BTreeMap::new());
        assert!(matches!(
            delete_container_link(&mut tables, "VC4", &container.id, false),
            Err(InventoryError::OperationNotPermitted { .. })
        ));

        let removed = delete_tributary_link(&mut tables, "VC4TributaryLink", &tributary).unwrap();
        assert_eq!(removed.objects.len(), 2);
        assert!(transport_link_structure(&tables, "STM1", &first).unwrap().is_empty());
        assert!(tables.objects.get(&first).is_some());
        assert!(delete_tributary_link(&mut tables, "STM1", &first).is_err());
    }
}
