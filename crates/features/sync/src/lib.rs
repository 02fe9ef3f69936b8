//! Synchronization feature slice.
//!
//! Sync groups bundle data source configurations, each describing how to reach the external
//! system behind one inventory object. A configuration may belong to several groups but
//! never to none. The providers that would run a group are only listed here.

pub mod configs;
pub mod groups;
pub mod providers;
mod ws;

pub use ws::SyncCall;

use kw_database::Database;
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;

/// Synchronization feature state
#[kw_derive::kw_slice(name = "sync")]
pub struct Synchronization {
    database: Database,
}

/// Initialize the synchronization slice.
pub fn init(database: &Database) -> Result<InitializedSlice, InventoryError> {
    let (groups, configs) = database.read(|t| (t.sync_groups.len(), t.sync_configs.len()));
    let slice = Synchronization::new(SynchronizationInner { database: database.clone() });
    tracing::info!(groups, configs, providers = providers::PROVIDERS.len(), "Sync slice initialized");
    Ok(InitializedSlice::new(slice))
}
