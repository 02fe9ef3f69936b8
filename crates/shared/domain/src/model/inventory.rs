use super::metadata::AttributeValue;
use super::{Id, ObjectKey, ObjectLight, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an object hangs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentRef {
    /// Directly under the containment root (`DummyRoot`).
    Root,
    /// Regular containment.
    Child(ObjectKey),
    /// Special containment (connections, MPLS links, subnets inside subnets, activities).
    Special(ObjectKey),
    /// Item of a pool.
    Pool(Id),
    /// Outside the containment tree, reachable through relationships only (contacts).
    Detached,
}

impl ParentRef {
    #[must_use]
    pub const fn object(&self) -> Option<&ObjectKey> {
        match self {
            Self::Child(key) | Self::Special(key) => Some(key),
            _ => None,
        }
    }
}

/// An inventory object, a template element, a list type item or a proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessObject {
    pub id: Id,
    pub class_name: String,
    pub name: String,
    pub parent: ParentRef,
    pub attributes: BTreeMap<String, AttributeValue>,
    pub creation_date: Timestamp,
}

impl BusinessObject {
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.class_name.clone(), self.id.clone())
    }

    #[must_use]
    pub fn light(&self) -> ObjectLight {
        ObjectLight { id: self.id.clone(), class_name: self.class_name.clone(), name: self.name.clone() }
    }
}

/// A named link between two objects outside the containment tree. The link has no
/// direction for navigation; `a` is the side it was created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: Id,
    pub name: String,
    pub a: ObjectKey,
    pub b: ObjectKey,
    pub properties: BTreeMap<String, String>,
}

impl Relationship {
    /// The side opposite to `key`, when `key` is one of the ends.
    #[must_use]
    pub fn other(&self, key: &ObjectKey) -> Option<&ObjectKey> {
        if &self.a == key {
            Some(&self.b)
        } else if &self.b == key {
            Some(&self.a)
        } else {
            None
        }
    }

    #[must_use]
    pub fn touches(&self, key: &ObjectKey) -> bool {
        &self.a == key || &self.b == key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PoolOwner {
    Root,
    Object(ObjectKey),
    Pool(Id),
}

/// A container of objects of one class (and its subclasses).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub class_name: String,
    pub pool_type: i32,
    pub owner: PoolOwner,
}
