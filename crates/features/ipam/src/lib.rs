//! IPAM feature slice.
//!
//! Subnets are organized in pools below one root pool per IP version and may nest inside
//! wider subnets. Addresses are special children of the subnet they belong to. Ports,
//! VLANs, VRF instances and logical interfaces are tied to them through relationships.

pub mod addresses;
pub mod cidr;
pub mod pools;
pub mod subnets;
mod ws;

pub use cidr::{Cidr, Span};
pub use ws::IpamCall;

use kw_database::Database;
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;
use kw_storage::NamespacedStorage;

/// IPAM feature state
#[kw_derive::kw_slice(name = "ipam")]
pub struct Ipam {
    database: Database,
    attachments: Option<NamespacedStorage>,
}

/// Initialize the IPAM slice, creating the root pools on first start.
///
/// # Errors
/// [`InventoryError::NotFound`] when the class model lacks the subnet classes.
pub fn init(database: &Database, attachments: Option<NamespacedStorage>) -> Result<InitializedSlice, InventoryError> {
    let created = database.write(pools::ensure_root_pools)?;
    let slice = Ipam::new(IpamInner { database: database.clone(), attachments });
    tracing::info!(root_pools_created = created, "IPAM slice initialized");
    Ok(InitializedSlice::new(slice))
}
