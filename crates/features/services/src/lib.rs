//! Services feature slice: customers and the services provided to them, contacts,
//! contracts, projects and warehouses.
//!
//! All of them are module objects kept in pools of their own family. Contacts are the
//! exception: they live outside any pool and hang from their customer. The impact module
//! answers which customers a failing device or port affects.

pub mod catalog;
pub mod contacts;
pub mod contracts;
pub mod customers;
pub mod impact;
pub mod projects;
pub mod warehouses;
mod ws;

pub use ws::{ContractsCall, ProjectsCall, ServicesCall, WarehousesCall};

use kw_database::Database;
use kw_domain::constants::{
    CLASS_GENERIC_CONTRACT, CLASS_GENERIC_CUSTOMER, CLASS_GENERIC_PROJECT, CLASS_GENERIC_WAREHOUSE,
};
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;
use kw_storage::NamespacedStorage;

/// Services feature state
#[kw_derive::kw_slice(name = "services")]
pub struct Services {
    database: Database,
    attachments: Option<NamespacedStorage>,
}

/// Initialize the services slice.
///
/// # Errors
/// [`InventoryError::NotFound`] when the class model lacks the module root classes.
pub fn init(database: &Database, attachments: Option<NamespacedStorage>) -> Result<InitializedSlice, InventoryError> {
    let pools_of = |root: &str| {
        database.read(|t| {
            t.classes
                .get(root)
                .map(|_| catalog::root_pools(t, root).len())
                .ok_or_else(|| InventoryError::not_found(format!("Class {root} is not defined")))
        })
    };
    let customer_pools = pools_of(CLASS_GENERIC_CUSTOMER)?;
    let contract_pools = pools_of(CLASS_GENERIC_CONTRACT)?;
    let project_pools = pools_of(CLASS_GENERIC_PROJECT)?;
    let warehouse_pools = pools_of(CLASS_GENERIC_WAREHOUSE)?;
    let slice = Services::new(ServicesInner { database: database.clone(), attachments });
    tracing::info!(customer_pools, contract_pools, project_pools, warehouse_pools, "Services slice initialized");
    Ok(InitializedSlice::new(slice))
}
