//! MPLS links between ports of communications elements.
//!
//! Besides its endpoint relationships, an MPLS link is related to the communications
//! elements holding its endpoints through `mplsLink`, which keeps device level maps cheap.

use crate::wiring::{self, ConnectionKind, Endpoints, Planned, Side, Wiring};
use kw_business::objects::{self, Removed, Store};
use kw_business::{navigation, relationships};
use kw_database::Tables;
use kw_domain::constants::{
    CLASS_DUMMY_ROOT, CLASS_GENERIC_COMMUNICATIONS_ELEMENT, CLASS_GENERIC_LOGICAL_CONNECTION, CLASS_MPLS_LINK,
    POOL_CLASS, REL_MPLS_ENDPOINT_A, REL_MPLS_ENDPOINT_B, REL_MPLS_LINK,
};
use kw_domain::model::{Id, ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_metadata::values::RemoteObject;
use serde::Serialize;
use std::collections::BTreeMap;

const MPLS: &[ConnectionKind] = &[ConnectionKind::Mpls];

/// The communications element a port belongs to.
pub(crate) fn device_of(tables: &Tables, port: &ObjectKey) -> Result<Option<ObjectKey>, InventoryError> {
    Ok(navigation::parents(tables, &port.class_name, &port.id)?
        .into_iter()
        .take_while(|a| a.class_name != POOL_CLASS && a.class_name != CLASS_DUMMY_ROOT)
        .find(|a| tables.classes.is_subclass_of(&a.class_name, CLASS_GENERIC_COMMUNICATIONS_ELEMENT))
        .map(|a| a.key()))
}

pub(crate) fn require_device(tables: &Tables, port: &ObjectKey) -> Result<ObjectKey, InventoryError> {
    device_of(tables, port)?.ok_or_else(|| {
        InventoryError::invalid(format!("The port {port} does not seem to be located in a communications equipment"))
    })
}

/// Relates the link to the devices of the endpoints just attached.
fn link_devices(tables: &mut Tables, attached: &[Planned]) -> Result<(), InventoryError> {
    for (link, port, _) in attached {
        let device = require_device(tables, port)?;
        if !tables.relationships.linked(&device, link, REL_MPLS_LINK) {
            relationships::insert(tables, device, link.clone(), REL_MPLS_LINK, BTreeMap::new());
        }
    }
    Ok(())
}

/// Drops device relationships no endpoint supports any more.
fn unlink_stale_devices(tables: &mut Tables, link: &ObjectKey) -> Result<(), InventoryError> {
    let mut supported = Vec::new();
    for name in [REL_MPLS_ENDPOINT_A, REL_MPLS_ENDPOINT_B] {
        for port in tables.relationships.outgoing(link, name) {
            supported.extend(device_of(tables, &port)?);
        }
    }
    for device in tables.relationships.related(link, REL_MPLS_LINK) {
        if !supported.contains(&device) {
            tables.relationships.release(link, REL_MPLS_LINK, Some(&device));
        }
    }
    Ok(())
}

/// Creates an MPLS link with one or both endpoints.
///
/// # Errors
/// * [`InventoryError::InvalidArgument`] without endpoints, for endpoints that are no port
///   or lie outside any communications element, and for bad attribute values.
/// * [`InventoryError::NotFound`] for unknown endpoints.
/// * [`InventoryError::OperationNotPermitted`] for ports already ending an MPLS link.
pub fn create(
    tables: &mut Tables,
    endpoint_a: Option<&ObjectKey>,
    endpoint_b: Option<&ObjectKey>,
    attributes: &BTreeMap<String, String>,
) -> Result<Id, InventoryError> {
    if endpoint_a.is_none() && endpoint_b.is_none() {
        return Err(InventoryError::invalid("An MPLS link needs at least one endpoint"));
    }
    let mut ends = Vec::new();
    for (side, name) in [(endpoint_a, REL_MPLS_ENDPOINT_A), (endpoint_b, REL_MPLS_ENDPOINT_B)] {
        if let Some(side) = side {
            let port = wiring::endpoint(tables, ConnectionKind::Mpls, side)?;
            require_device(tables, &port)?;
            ends.push((port, name));
        }
    }
    if let [(a, _), (b, _)] = ends.as_slice()
        && a == b
    {
        return Err(InventoryError::not_permitted("Can not connect a port to itself"));
    }

    let id = objects::create_detached_object(tables, CLASS_MPLS_LINK, CLASS_GENERIC_LOGICAL_CONNECTION, attributes)?;
    let link = ObjectKey::new(CLASS_MPLS_LINK, id.clone());
    let attached: Vec<Planned> = ends.into_iter().map(|(port, name)| (link.clone(), port, name)).collect();
    for (link, port, name) in &attached {
        relationships::insert(tables, link.clone(), port.clone(), name, BTreeMap::new());
    }
    link_devices(tables, &attached)?;
    Ok(id)
}

/// A logical link with its endpoints and the devices holding them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalLinkDetails {
    pub link: RemoteObject,
    pub endpoint_a: Option<ObjectLight>,
    pub endpoint_b: Option<ObjectLight>,
    pub device_a: Option<ObjectLight>,
    pub device_b: Option<ObjectLight>,
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown links.
/// * [`InventoryError::InvalidArgument`] for objects that are no MPLS link.
pub fn details(tables: &Tables, id: &str) -> Result<LogicalLinkDetails, InventoryError> {
    let Endpoints { endpoint_a, endpoint_b } = wiring::endpoints(tables, CLASS_MPLS_LINK, id, MPLS)?;
    Ok(LogicalLinkDetails {
        link: RemoteObject::from(objects::object(tables, CLASS_MPLS_LINK, id)?),
        device_a: endpoint_device(tables, endpoint_a.as_ref())?,
        device_b: endpoint_device(tables, endpoint_b.as_ref())?,
        endpoint_a,
        endpoint_b,
    })
}

/// The communications element behind a link endpoint. Endpoints that are devices
/// themselves stand for their own device.
pub(crate) fn endpoint_device(tables: &Tables, end: Option<&ObjectLight>) -> Result<Option<ObjectLight>, InventoryError> {
    let Some(end) = end else {
        return Ok(None);
    };
    if tables.classes.is_subclass_of(&end.class_name, CLASS_GENERIC_COMMUNICATIONS_ELEMENT) {
        return Ok(Some(end.clone()));
    }
    Ok(device_of(tables, &end.key())?.and_then(|device| relationships::light(tables, &device)))
}

/// Attaches endpoints to existing MPLS links.
///
/// # Errors
/// Everything [`wiring::connect`] reports, and [`InventoryError::InvalidArgument`] for
/// ports outside any communications element.
pub fn connect(tables: &mut Tables, wirings: &[Wiring]) -> Result<Vec<Planned>, InventoryError> {
    for port in wirings.iter().flat_map(|w| w.side_a.iter().chain(w.side_b.iter())) {
        let port = objects::object(tables, &port.class_name, &port.id)?.key();
        require_device(tables, &port)?;
    }
    let attached = wiring::connect(tables, wirings, MPLS)?;
    link_devices(tables, &attached)?;
    Ok(attached)
}

/// # Errors
/// * [`InventoryError::NotFound`] for unknown links.
/// * [`InventoryError::InvalidArgument`] for objects that are no MPLS link.
pub fn disconnect(tables: &mut Tables, id: &str, side: Side) -> Result<Vec<ObjectKey>, InventoryError> {
    let released = wiring::disconnect(tables, CLASS_MPLS_LINK, id, side, MPLS)?;
    unlink_stale_devices(tables, &ObjectKey::new(CLASS_MPLS_LINK, id))?;
    Ok(released)
}

/// Deletes an MPLS link. Without `force`, a link still related to anything is kept.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown links.
/// * [`InventoryError::InvalidArgument`] for objects that are no MPLS link.
/// * [`InventoryError::OperationNotPermitted`] for related links deleted without `force`.
pub fn delete(tables: &mut Tables, id: &str, force: bool) -> Result<Removed, InventoryError> {
    let (key, _) = wiring::resolve(tables, CLASS_MPLS_LINK, id, MPLS)?;
    if key.class_name != CLASS_MPLS_LINK {
        return Err(InventoryError::invalid(format!(
            "Only links of class {CLASS_MPLS_LINK} can be deleted here, not {}",
            key.class_name
        )));
    }
    objects::delete_objects(tables, Store::Objects, &[key], force)
}
