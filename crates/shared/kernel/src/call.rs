//! Who is calling and what for.

use crate::error::InventoryError;
use crate::events::ActivityEvent;
use crate::now_millis;
use kw_domain::model::audit::ActivityType;
use kw_domain::model::{Id, ObjectKey};
use kw_domain::privileges::{Access, FeatureSet};
use kw_domain::registry::FeatureSlice;
use kw_event_bus::EventBus;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::warn;

/// Privilege an operation demands from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub feature: FeatureSet,
    pub access: Access,
}

impl Requirement {
    #[must_use]
    pub const fn read(feature: FeatureSet) -> Self {
        Self { feature, access: Access::Read }
    }

    #[must_use]
    pub const fn write(feature: FeatureSet) -> Self {
        Self { feature, access: Access::Write }
    }
}

/// The operations one slice serves, decoded from `{ "operation": .., "params": .. }`.
pub trait SliceCall: DeserializeOwned + AsRef<str> + Send {
    type Slice: FeatureSlice + Clone;

    /// Every operation name this enum decodes.
    fn operations() -> &'static [&'static str];

    fn requirement(&self) -> Requirement;

    fn execute(
        self,
        slice: &Self::Slice,
        ctx: &CallContext,
    ) -> impl Future<Output = Result<serde_json::Value, InventoryError>> + Send;
}

/// Serializes an operation result for the wire.
///
/// # Errors
/// [`InventoryError::Internal`] when `value` can not be represented as JSON.
pub fn reply<T: Serialize>(value: T) -> Result<serde_json::Value, InventoryError> {
    serde_json::to_value(value).map_err(|error| InventoryError::Internal {
        message: error.to_string().into(),
        context: Some("Serializing reply".into()),
    })
}

/// The authenticated user behind a call, resolved from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Id,
    pub user_name: String,
    pub session_type: i32,
}

impl Caller {
    /// Identity used for bootstrap work that no user asked for.
    #[must_use]
    pub fn system() -> Self {
        Self { user_id: String::new(), user_name: "system".to_owned(), session_type: 0 }
    }
}

/// Everything an operation needs besides its parameters.
#[derive(Debug, Clone)]
pub struct CallContext {
    caller: Caller,
    operation: String,
    events: Option<EventBus>,
}

impl CallContext {
    pub fn new(caller: Caller, operation: impl Into<String>, events: EventBus) -> Self {
        Self { caller, operation: operation.into(), events: Some(events) }
    }

    /// A context whose activity is not recorded anywhere.
    pub fn detached(caller: Caller, operation: impl Into<String>) -> Self {
        Self { caller, operation: operation.into(), events: None }
    }

    #[must_use]
    pub const fn caller(&self) -> &Caller {
        &self.caller
    }

    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Announces a committed change for the activity log.
    pub fn record(
        &self,
        activity_type: ActivityType,
        object: Option<&ObjectKey>,
        notes: impl Into<String>,
    ) {
        let Some(events) = &self.events else {
            return;
        };
        let event = ActivityEvent {
            timestamp: now_millis(),
            user_name: self.caller.user_name.clone(),
            activity_type,
            object: object.cloned(),
            operation: self.operation.clone(),
            notes: notes.into(),
        };
        if let Err(error) = events.publish(event) {
            warn!(%error, operation = %self.operation, "Activity event dropped");
        }
    }
}
