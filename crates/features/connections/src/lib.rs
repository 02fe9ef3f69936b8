//! Connection feature slice.
//!
//! Physical links join two ports, physical containers join two physical nodes and carry
//! links or other containers inside. Both hang as special children of the closest object
//! their endpoints share. Mirror relationships tie the front and back of a port so paths
//! can be traced through patch panels. MPLS links are logical connections between ports of
//! communications elements and live outside the containment tree, as do the SDH transport,
//! container and tributary links and the BGP links drawn on the routing map.

pub mod bgp;
pub mod mirror;
pub mod mpls;
pub mod path;
pub mod physical;
pub mod sdh;
pub mod wiring;
mod ws;

pub use wiring::{ConnectionKind, Side, Wiring};
pub use ws::{ConnectionsCall, SdhCall};

use kw_database::Database;
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;
use kw_storage::NamespacedStorage;

/// Connection feature state
#[kw_derive::kw_slice(name = "connections")]
pub struct Connections {
    database: Database,
    /// Attachment content of deleted connections goes with them.
    attachments: Option<NamespacedStorage>,
}

/// Initialize the connection slice.
pub fn init(database: &Database, attachments: Option<NamespacedStorage>) -> Result<InitializedSlice, InventoryError> {
    let slice = Connections::new(ConnectionsInner { database: database.clone(), attachments });
    tracing::info!("Connections slice initialized");
    Ok(InitializedSlice::new(slice))
}
