use super::{Id, ObjectKey, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    CreateInventoryObject,
    UpdateInventoryObject,
    DeleteInventoryObject,
    CreateApplicationObject,
    UpdateApplicationObject,
    DeleteApplicationObject,
    CreateMetadataObject,
    UpdateMetadataObject,
    DeleteMetadataObject,
    CreateRelationship,
    ReleaseRelationship,
    MoveObject,
    Login,
    Logout,
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: Id,
    pub timestamp: Timestamp,
    pub user_name: String,
    pub activity_type: ActivityType,
    pub object: Option<ObjectKey>,
    pub operation: String,
    pub notes: String,
}
