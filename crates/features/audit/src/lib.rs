//! Audit feature slice.
//!
//! Operations never write the activity log themselves. They publish an
//! [`ActivityEvent`] once their change is committed, the session slice publishes
//! [`SessionEvent`]s, and the listener started by [`AuditInner::listen`] appends both.

pub mod trail;
mod ws;

pub use trail::TrailFilter;
pub use ws::AuditCall;

use kw_database::Database;
use kw_domain::config::AuditConfig;
use kw_event_bus::{EventBus, EventReceiverExt};
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;
use kw_kernel::events::{ActivityEvent, SessionEvent};
use kw_kernel::now_millis;
use std::convert::Infallible;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Audit feature state
#[kw_derive::kw_slice(name = "audit")]
pub struct Audit {
    database: Database,
    max_entries: usize,
}

impl AuditInner {
    /// Starts appending activity and session events to the log. Both are read from
    /// lossless queues, so bursts wait in memory instead of being skipped. The task ends
    /// once the bus shuts down.
    ///
    /// # Errors
    /// [`InventoryError::Internal`] when the event channels can not be subscribed.
    pub fn listen(&self, events: &EventBus) -> Result<JoinHandle<()>, InventoryError> {
        let subscribe_error = |error: kw_event_bus::EventBusError| InventoryError::Internal {
            message: format!("Audit listener: {error}").into(),
            context: None,
        };
        let mut activities = events.subscribe_lossless::<ActivityEvent>().map_err(subscribe_error)?;
        let mut sessions = events.subscribe_lossless::<SessionEvent>().map_err(subscribe_error)?;
        let database = self.database.clone();
        let max_entries = self.max_entries;

        Ok(tokio::spawn(async move {
            loop {
                let entry = tokio::select! {
                    Some(event) = EventReceiverExt::recv(&mut activities) => trail::from_activity(&event),
                    Some(event) = EventReceiverExt::recv(&mut sessions) => trail::from_session(&event, now_millis()),
                    else => break,
                };
                let Ok(dropped) = database.write(|t| Ok::<_, Infallible>(trail::append(t, entry, max_entries)));
                if dropped > 0 {
                    debug!(dropped, "Activity log trimmed");
                }
            }
            info!("Audit listener stopped");
        }))
    }
}

/// Initialize the audit slice.
pub fn init(database: &Database, config: &AuditConfig) -> Result<InitializedSlice, InventoryError> {
    let entries = database.read(|t| t.activity_log.len());
    let slice = Audit::new(AuditInner { database: database.clone(), max_entries: config.max_entries });
    info!(entries, max_entries = config.max_entries, "Audit slice initialized");
    Ok(InitializedSlice::new(slice))
}
