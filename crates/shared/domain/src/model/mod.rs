//! Records kept in the inventory tables.
//!
//! Every record serializes with camelCase field names for the web service and stays
//! self-describing-free so it can also travel through the binary snapshot codec: no
//! `flatten`, no `untagged`, no skipped fields.

pub mod application;
pub mod audit;
pub mod inventory;
pub mod metadata;
pub mod sync;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of any stored record.
pub type Id = String;

/// Epoch milliseconds.
pub type Timestamp = i64;

/// Class and id of an object, enough to find it in any object table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectKey {
    pub class_name: String,
    pub id: Id,
}

impl ObjectKey {
    pub fn new(class_name: impl Into<String>, id: impl Into<Id>) -> Self {
        Self { class_name: class_name.into(), id: id.into() }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class_name, self.id)
    }
}

/// The minimal description of an object returned by list operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectLight {
    pub id: Id,
    pub class_name: String,
    pub name: String,
}

impl ObjectLight {
    #[must_use]
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.class_name.clone(), self.id.clone())
    }
}

impl PartialOrd for ObjectLight {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Lists are sorted by name, then class and id so equal names stay stable.
impl Ord for ObjectLight {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.class_name.cmp(&other.class_name))
            .then_with(|| self.id.cmp(&other.id))
    }
}
