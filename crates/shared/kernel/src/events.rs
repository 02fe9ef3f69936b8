//! Events exchanged between slices through the event bus.

use kw_domain::model::audit::ActivityType;
use kw_domain::model::{ObjectKey, Timestamp};
use std::net::IpAddr;

/// Session lifecycle, published by the session slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened { user_name: String, session_type: i32, ip: IpAddr },
    Closed { user_name: String, reason: CloseReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client logged out.
    Logout,
    /// A newer session of the same type replaced it.
    Replaced,
    /// The idle timeout elapsed.
    Expired,
    /// The user was deleted or disabled.
    Revoked,
}

/// A successful write worth keeping in the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEvent {
    pub timestamp: Timestamp,
    pub user_name: String,
    pub activity_type: ActivityType,
    pub object: Option<ObjectKey>,
    pub operation: String,
    pub notes: String,
}

/// Latest committed database revision, published on a watch channel after every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InventoryRevision(pub u64);
