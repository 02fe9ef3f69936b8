//! Facade crate for the inventory service.
//! Re-exports domain/kernel primitives, initializes every feature slice and routes web
//! service calls to them.
//! Keep this crate thin: it composes the slices, it does not implement inventory logic.
//!
//! ## Usage
//! - Call [`init`] once the database is open to get the initialized slices.
//! - Hand them to a [`dispatch::Registry`], or to the `ApiState` of the `server` feature,
//!   and pass every `{ sessionId, operation, params }` request to [`dispatch::dispatch`].

pub mod dispatch;
#[cfg(feature = "server")]
pub mod server;

pub use kw_domain as domain;
pub use kw_kernel as kernel;

use kw_database::Database;
use kw_domain::config::ApiConfig;
use kw_domain::registry::InitializedSlice;
use kw_event_bus::EventBus;
use kw_kernel::error::InventoryError;
use kw_storage::{NamespacedStorage, Storage};
use tracing::info;

/// Feature registry for runtime introspection.
pub mod features {
    pub use kw_application as application;
    pub use kw_audit as audit;
    pub use kw_business as business;
    pub use kw_connections as connections;
    pub use kw_ipam as ipam;
    pub use kw_metadata as metadata;
    pub use kw_services as services;
    pub use kw_session as session;
    pub use kw_sync as sync;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "server")]
        "server",
        "session",
        "metadata",
        "business",
        "connections",
        "application",
        "sync",
        "ipam",
        "services",
        "audit",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Namespace of attachment contents inside the storage root.
pub const ATTACHMENTS_NAMESPACE: &str = "attachments";

/// Initialize every feature slice. The metadata slice goes first: the others read the
/// class model it seeds.
///
/// Without `storage`, attachments can be listed but their contents can not be stored.
///
/// # Errors
/// Returns the first slice initialization failure.
pub fn init(
    config: &ApiConfig,
    database: &Database,
    events: &EventBus,
    storage: Option<&Storage>,
) -> Result<Vec<InitializedSlice>, InventoryError> {
    let attachments: Option<NamespacedStorage> =
        storage.map(|s| s.namespace(ATTACHMENTS_NAMESPACE)).transpose()?;

    let slices = vec![
        features::metadata::init(database)?,
        features::session::init(database, config, events)?,
        features::business::init(database, attachments.clone())?,
        features::connections::init(database, attachments.clone())?,
        features::application::init(database, attachments.clone(), &config.attachments)?,
        features::sync::init(database)?,
        features::ipam::init(database, attachments.clone())?,
        features::services::init(database, attachments)?,
        features::audit::init(database, &config.audit)?,
    ];
    info!(slices = slices.len(), operations = dispatch::operations().len(), "Inventory service initialized");
    Ok(slices)
}
