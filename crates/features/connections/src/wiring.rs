//! Attaching connections to their endpoints and detaching them again.

use kw_business::{objects, relationships};
use kw_database::Tables;
use kw_domain::constants::{
    CLASS_GENERIC_PHYSICAL_CONTAINER, CLASS_GENERIC_PHYSICAL_LINK, CLASS_GENERIC_PHYSICAL_NODE,
    CLASS_GENERIC_PORT, CLASS_MPLS_LINK, REL_ENDPOINT_A, REL_ENDPOINT_B, REL_MPLS_ENDPOINT_A,
    REL_MPLS_ENDPOINT_B,
};
use kw_domain::model::{ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use kw_metadata::schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The families of connections and what their endpoints may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Joins two free ports.
    Link,
    /// Joins any two physical nodes; a node may end many containers.
    Container,
    /// Logical link between two ports, outside the containment tree.
    Mpls,
}

impl ConnectionKind {
    pub const PHYSICAL: &'static [Self] = &[Self::Link, Self::Container];

    /// # Errors
    /// * [`InventoryError::NotFound`] for unknown classes.
    /// * [`InventoryError::InvalidArgument`] for classes that are no connection at all.
    pub fn of(tables: &Tables, class_name: &str) -> Result<Self, InventoryError> {
        schema::class(tables, class_name)?;
        [
            (CLASS_GENERIC_PHYSICAL_LINK, Self::Link),
            (CLASS_GENERIC_PHYSICAL_CONTAINER, Self::Container),
            (CLASS_MPLS_LINK, Self::Mpls),
        ]
        .into_iter()
        .find(|(ancestor, _)| tables.classes.is_subclass_of(class_name, ancestor))
        .map(|(_, kind)| kind)
        .ok_or_else(|| InventoryError::invalid(format!("Class {class_name} is not a connection")))
    }

    /// Relationship names of the A and B sides.
    #[must_use]
    pub const fn sides(self) -> (&'static str, &'static str) {
        match self {
            Self::Link | Self::Container => (REL_ENDPOINT_A, REL_ENDPOINT_B),
            Self::Mpls => (REL_MPLS_ENDPOINT_A, REL_MPLS_ENDPOINT_B),
        }
    }

    #[must_use]
    pub const fn endpoint_class(self) -> &'static str {
        match self {
            Self::Link | Self::Mpls => CLASS_GENERIC_PORT,
            Self::Container => CLASS_GENERIC_PHYSICAL_NODE,
        }
    }

    /// Whether an endpoint can end one connection of this family at most.
    #[must_use]
    pub const fn exclusive(self) -> bool {
        !matches!(self, Self::Container)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Link => "physical link",
            Self::Container => "physical container",
            Self::Mpls => "MPLS link",
        }
    }
}

/// Which ends of a connection to release: `1` is A, `2` is B, `3` both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
    Both,
}

impl TryFrom<i32> for Side {
    type Error = InventoryError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::A),
            2 => Ok(Self::B),
            3 => Ok(Self::Both),
            other => Err(InventoryError::invalid(format!("Wrong side to disconnect option {other}"))),
        }
    }
}

/// One connection and the endpoints to attach to it. A missing side is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wiring {
    #[serde(default)]
    pub side_a: Option<ObjectKey>,
    pub connection: ObjectKey,
    #[serde(default)]
    pub side_b: Option<ObjectKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub endpoint_a: Option<ObjectLight>,
    pub endpoint_b: Option<ObjectLight>,
}

/// Finds a connection and checks its family is one of `accepted`.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown connections.
/// * [`InventoryError::InvalidArgument`] for objects of another family.
pub fn resolve(
    tables: &Tables,
    class_name: &str,
    id: &str,
    accepted: &[ConnectionKind],
) -> Result<(ObjectKey, ConnectionKind), InventoryError> {
    let kind = ConnectionKind::of(tables, class_name)?;
    let key = objects::object(tables, class_name, id)?.key();
    let kind = if key.class_name == class_name { kind } else { ConnectionKind::of(tables, &key.class_name)? };
    if !accepted.contains(&kind) {
        return Err(InventoryError::invalid(format!("{key} is a {}", kind.label())));
    }
    Ok((key, kind))
}

/// Whether `key` already ends a connection of the given family.
#[must_use]
pub fn is_connected(tables: &Tables, kind: ConnectionKind, key: &ObjectKey) -> bool {
    let (a, b) = kind.sides();
    tables.relationships.named(key, a).chain(tables.relationships.named(key, b)).any(|r| &r.b == key)
}

/// Checks that `key` can end a connection of the given family.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::InvalidArgument`] for objects of the wrong class.
/// * [`InventoryError::OperationNotPermitted`] for ports already connected.
pub fn endpoint(tables: &Tables, kind: ConnectionKind, key: &ObjectKey) -> Result<ObjectKey, InventoryError> {
    let object = objects::object(tables, &key.class_name, &key.id)?;
    if !tables.classes.is_subclass_of(&object.class_name, kind.endpoint_class()) {
        return Err(InventoryError::invalid(format!(
            "{key} is not a {} and can not end a {}",
            kind.endpoint_class(),
            kind.label()
        )));
    }
    let key = object.key();
    if kind.exclusive() && is_connected(tables, kind, &key) {
        return Err(InventoryError::not_permitted(format!("The selected endpoint {key} is already connected")));
    }
    Ok(key)
}

/// # Errors
/// See [`resolve`].
pub fn endpoints(
    tables: &Tables,
    class_name: &str,
    id: &str,
    accepted: &[ConnectionKind],
) -> Result<Endpoints, InventoryError> {
    let (key, kind) = resolve(tables, class_name, id, accepted)?;
    let (a, b) = kind.sides();
    let end = |name: &str| {
        tables.relationships.outgoing(&key, name).first().and_then(|other| relationships::light(tables, other))
    };
    Ok(Endpoints { endpoint_a: end(a), endpoint_b: end(b) })
}

/// A relationship waiting to be stored: connection, endpoint and side name.
pub type Planned = (ObjectKey, ObjectKey, &'static str);

/// Attaches endpoints to existing connections. Every wiring is checked before the first
/// one is stored. Returns what was stored.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown connections or endpoints.
/// * [`InventoryError::InvalidArgument`] for connections outside `accepted` and endpoints
///   of the wrong class.
/// * [`InventoryError::OperationNotPermitted`] for a port connected to itself, occupied
///   sides or ports, and links the relationship rules forbid.
pub fn connect(
    tables: &mut Tables,
    wirings: &[Wiring],
    accepted: &[ConnectionKind],
) -> Result<Vec<Planned>, InventoryError> {
    let mut planned: Vec<Planned> = Vec::new();
    for wiring in wirings {
        let (connection, kind) = resolve(tables, &wiring.connection.class_name, &wiring.connection.id, accepted)?;
        if let (Some(a), Some(b)) = (&wiring.side_a, &wiring.side_b)
            && a.id == b.id
        {
            return Err(InventoryError::not_permitted("Can not connect an object to itself"));
        }
        let (name_a, name_b) = kind.sides();
        for (side, name) in [(&wiring.side_a, name_a), (&wiring.side_b, name_b)] {
            let Some(side) = side else {
                continue;
            };
            let endpoint = endpoint(tables, kind, side)?;
            let claimed = planned.iter().any(|(c, e, _)| e == &endpoint && (kind.exclusive() || c == &connection));
            if claimed || tables.relationships.linked(&connection, &endpoint, name_a)
                || tables.relationships.linked(&connection, &endpoint, name_b)
            {
                return Err(InventoryError::not_permitted(format!(
                    "{connection} is already related to {endpoint}"
                )));
            }
            if !tables.relationships.outgoing(&connection, name).is_empty()
                || planned.iter().any(|(c, _, n)| c == &connection && *n == name)
            {
                return Err(InventoryError::not_permitted(format!("{connection} already has an {name}")));
            }
            relationships::validate(tables, &connection, &endpoint, name, true)?;
            planned.push((connection.clone(), endpoint, name));
        }
    }
    for (connection, endpoint, name) in &planned {
        relationships::insert(tables, connection.clone(), endpoint.clone(), name, BTreeMap::new());
    }
    Ok(planned)
}

/// Releases one or both ends of a connection. Returns the endpoints let go.
///
/// # Errors
/// See [`resolve`].
pub fn disconnect(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    side: Side,
    accepted: &[ConnectionKind],
) -> Result<Vec<ObjectKey>, InventoryError> {
    let (key, kind) = resolve(tables, class_name, id, accepted)?;
    let (a, b) = kind.sides();
    let names = match side {
        Side::A => vec![a],
        Side::B => vec![b],
        Side::Both => vec![a, b],
    };
    let mut released = Vec::new();
    for name in names {
        released.extend(tables.relationships.release(&key, name, None).into_iter().filter_map(|r| r.other(&key).cloned()));
    }
    Ok(released)
}

/// Moves the ends of a connection to new endpoints. A missing side, or one naming the
/// endpoint it already has, is left alone.
///
/// # Errors
/// Everything [`resolve`] and [`endpoint`] report, and
/// [`InventoryError::OperationNotPermitted`] when both ends would meet on one object or
/// the relationship rules forbid the new end.
pub fn reconnect(
    tables: &mut Tables,
    class_name: &str,
    id: &str,
    new_a: Option<&ObjectKey>,
    new_b: Option<&ObjectKey>,
    accepted: &[ConnectionKind],
) -> Result<Vec<Planned>, InventoryError> {
    let (key, kind) = resolve(tables, class_name, id, accepted)?;
    let (name_a, name_b) = kind.sides();

    let mut moves: Vec<Planned> = Vec::new();
    for (side, name) in [(new_a, name_a), (new_b, name_b)] {
        let Some(side) = side else {
            continue;
        };
        if tables.relationships.outgoing(&key, name).iter().any(|current| current.id == side.id) {
            continue;
        }
        let endpoint = endpoint(tables, kind, side)?;
        relationships::validate(tables, &key, &endpoint, name, false)?;
        moves.push((key.clone(), endpoint, name));
    }

    let final_end = |name: &str| {
        moves
            .iter()
            .find(|(_, _, n)| *n == name)
            .map(|(_, e, _)| e.clone())
            .or_else(|| tables.relationships.outgoing(&key, name).into_iter().next())
    };
    if let (Some(a), Some(b)) = (final_end(name_a), final_end(name_b))
        && a == b
    {
        return Err(InventoryError::not_permitted("Both ends of a connection can not meet on one object"));
    }

    for (connection, endpoint, name) in &moves {
        tables.relationships.release(connection, name, None);
        relationships::insert(tables, connection.clone(), endpoint.clone(), name, BTreeMap::new());
    }
    Ok(moves)
}
