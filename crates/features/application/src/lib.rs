//! Application feature slice.
//!
//! Everything the inventory keeps around its objects without being inventory itself:
//! pools, templates, favorites, views, saved queries, tasks, reports, configuration
//! variables, proxies, validator definitions, business rules, process definitions and
//! file attachments.
//!
//! The record level functions are public so the IPAM and services slices can build their
//! pools on the same rules.

pub mod favorites;
pub mod files;
pub mod pools;
pub mod processes;
pub mod proxies;
pub mod queries;
pub mod reports;
pub mod rules;
pub mod tasks;
pub mod templates;
pub mod validators;
pub mod variables;
pub mod views;
mod ws;

pub use ws::{
    FavoritesCall, FilesCall, PoolsCall, ProcessesCall, ProxiesCall, QueriesCall, ReportsCall, RulesCall, TasksCall,
    TemplatesCall, VariablesCall, ViewsCall,
};

use kw_database::Database;
use kw_domain::config::AttachmentsConfig;
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;
use kw_storage::NamespacedStorage;

/// Application feature state
#[kw_derive::kw_slice(name = "application")]
pub struct Application {
    database: Database,
    /// Attachment content. Without it, files can be listed but not attached or read.
    attachments: Option<NamespacedStorage>,
    max_attachment_size: u64,
}

/// Initialize the application slice.
pub fn init(
    database: &Database,
    attachments: Option<NamespacedStorage>,
    config: &AttachmentsConfig,
) -> Result<InitializedSlice, InventoryError> {
    let (pools, templates) = database.read(|t| (t.pools.len(), t.templates.len()));
    let slice = Application::new(ApplicationInner {
        database: database.clone(),
        attachments,
        max_attachment_size: config.max_size_bytes,
    });
    tracing::info!(pools, templates, "Application slice initialized");
    Ok(InitializedSlice::new(slice))
}
