use super::{Id, ObjectKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A synchronization group. Data source configurations may belong to several groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncGroup {
    pub id: Id,
    pub name: String,
    pub provider: String,
}

/// How to reach the external system describing `object`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDataSourceConfig {
    pub id: Id,
    pub name: String,
    pub object: ObjectKey,
    pub groups: Vec<Id>,
    pub parameters: BTreeMap<String, String>,
}

/// A synchronization provider known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProvider {
    pub id: String,
    pub display_name: String,
}
