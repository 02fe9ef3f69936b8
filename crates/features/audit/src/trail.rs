//! Reading and appending activity log entries.
//!
//! The log is kept oldest first; readers get it newest first.

use kw_database::Tables;
use kw_domain::model::audit::{ActivityLogEntry, ActivityType};
use kw_domain::model::{ObjectKey, Timestamp};
use kw_kernel::error::InventoryError;
use kw_kernel::events::{ActivityEvent, CloseReason, SessionEvent};
use kw_kernel::new_id;
use kw_kernel::validation;
use serde::Deserialize;

/// Optional narrowing of the general trail. Absent fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrailFilter {
    pub activity_type: Option<ActivityType>,
    pub user_name: Option<String>,
    /// Inclusive lower bound, epoch milliseconds.
    pub from: Option<Timestamp>,
    /// Inclusive upper bound, epoch milliseconds.
    pub to: Option<Timestamp>,
}

impl TrailFilter {
    fn matches(&self, entry: &ActivityLogEntry) -> bool {
        self.activity_type.is_none_or(|t| t == entry.activity_type)
            && self.user_name.as_deref().is_none_or(|u| u == entry.user_name)
            && self.from.is_none_or(|from| entry.timestamp >= from)
            && self.to.is_none_or(|to| entry.timestamp <= to)
    }
}

#[must_use]
pub fn from_activity(event: &ActivityEvent) -> ActivityLogEntry {
    ActivityLogEntry {
        id: new_id(),
        timestamp: event.timestamp,
        user_name: event.user_name.clone(),
        activity_type: event.activity_type,
        object: event.object.clone(),
        operation: event.operation.clone(),
        notes: event.notes.clone(),
    }
}

#[must_use]
pub fn from_session(event: &SessionEvent, timestamp: Timestamp) -> ActivityLogEntry {
    let (user_name, activity_type, notes) = match event {
        SessionEvent::Opened { user_name, session_type, ip } => {
            (user_name, ActivityType::Login, format!("Session type {session_type} from {ip}"))
        },
        SessionEvent::Closed { user_name, reason } => {
            let reason = match reason {
                CloseReason::Logout => "Logged out",
                CloseReason::Replaced => "Replaced by a newer session",
                CloseReason::Expired => "Idle timeout",
                CloseReason::Revoked => "Account revoked",
            };
            (user_name, ActivityType::Logout, reason.to_owned())
        },
    };
    ActivityLogEntry {
        id: new_id(),
        timestamp,
        user_name: user_name.clone(),
        activity_type,
        object: None,
        operation: String::new(),
        notes,
    }
}

/// Appends an entry, dropping the oldest ones past `max_entries`. Returns how many were
/// dropped. A zero `max_entries` keeps everything.
pub fn append(tables: &mut Tables, entry: ActivityLogEntry, max_entries: usize) -> usize {
    tables.activity_log.push_back(entry);
    if max_entries == 0 {
        return 0;
    }
    let excess = tables.activity_log.len().saturating_sub(max_entries);
    tables.activity_log.drain(..excess);
    excess
}

/// One page of the general trail, newest first. Pages start at 1; without a limit every
/// matching entry is returned.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for pages below 1 when a limit is set.
pub fn general_trail(
    tables: &Tables,
    page: i64,
    limit: i64,
    filter: &TrailFilter,
) -> Result<Vec<ActivityLogEntry>, InventoryError> {
    let matching = tables.activity_log.iter().rev().filter(|e| filter.matches(e));
    validation::paginate(matching.cloned(), page, limit)
}

/// The latest entries about one object, newest first. Entries survive the object, so
/// only the class has to exist.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown classes.
pub fn object_trail(
    tables: &Tables,
    class_name: &str,
    id: &str,
    limit: i64,
) -> Result<Vec<ActivityLogEntry>, InventoryError> {
    if !tables.classes.contains(class_name) {
        return Err(InventoryError::not_found(format!("Class {class_name} is not defined")));
    }
    let key = ObjectKey::new(class_name, id);
    let limit = usize::try_from(limit).ok().filter(|l| *l > 0).unwrap_or(usize::MAX);
    Ok(tables
        .activity_log
        .iter()
        .rev()
        .filter(|e| e.object.as_ref() == Some(&key))
        .take(limit)
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn entry(user_name: &str, activity_type: ActivityType, timestamp: Timestamp) -> ActivityLogEntry {
        from_activity(&ActivityEvent {
            timestamp,
            user_name: user_name.to_owned(),
            activity_type,
            object: Some(ObjectKey::new("Router", "r1")),
            operation: "updateObject".to_owned(),
            notes: String::new(),
        })
    }

    #[test]
    fn retention_drops_the_oldest() {
        let mut tables = Tables::default();
        for ts in 1..=5 {
            append(&mut tables, entry("admin", ActivityType::UpdateInventoryObject, ts), 3);
        }
        let stamps: Vec<Timestamp> = tables.activity_log.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, [3, 4, 5]);
        assert_eq!(append(&mut tables, entry("admin", ActivityType::Login, 6), 0), 0);
        assert_eq!(tables.activity_log.len(), 4);
    }

    #[test]
    fn pages_run_newest_first() {
        let mut tables = Tables::default();
        for ts in 1..=5 {
            let user = if ts % 2 == 0 { "ops" } else { "admin" };
            append(&mut tables, entry(user, ActivityType::UpdateInventoryObject, ts), 0);
        }
        let all = TrailFilter::default();
        let page: Vec<Timestamp> = general_trail(&tables, 2, 2, &all).unwrap().iter().map(|e| e.timestamp).collect();
        assert_eq!(page, [3, 2]);
        assert_eq!(general_trail(&tables, 0, 0, &all).unwrap().len(), 5);
        assert!(general_trail(&tables, 4, 2, &all).unwrap().is_empty());
        assert!(matches!(general_trail(&tables, 0, 2, &all), Err(InventoryError::InvalidArgument { .. })));
        assert!(general_trail(&tables, -1, 2, &all).is_err());

        let ops = TrailFilter { user_name: Some("ops".to_owned()), ..TrailFilter::default() };
        assert_eq!(general_trail(&tables, 0, 0, &ops).unwrap().len(), 2);
        let window = TrailFilter { from: Some(2), to: Some(3), ..TrailFilter::default() };
        assert_eq!(general_trail(&tables, 0, 0, &window).unwrap().len(), 2);
    }

    #[test]
    fn session_events_become_logins_and_logouts() {
        let opened = SessionEvent::Opened {
            user_name: "admin".to_owned(),
            session_type: 1,
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let entry = from_session(&opened, 7);
        assert_eq!(entry.activity_type, ActivityType::Login);
        assert_eq!(entry.notes, "Session type 1 from 127.0.0.1");

        let closed = SessionEvent::Closed { user_name: "admin".to_owned(), reason: CloseReason::Expired };
        assert_eq!(from_session(&closed, 8).activity_type, ActivityType::Logout);
    }
}
