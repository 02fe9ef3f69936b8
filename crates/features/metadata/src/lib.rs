//! Class model feature slice: classes, attributes, containment rules and list types.
//!
//! The [`schema`] and [`values`] modules are the read side other slices use to validate
//! objects against the model.

mod attributes;
pub mod bootstrap;
mod classes;
mod containment;
mod list_types;
pub mod schema;
pub mod values;
mod ws;

pub use attributes::{AttributeUpdate, NewAttribute};
pub use classes::{ClassUpdate, NewClass};
pub use ws::MetadataCall;

use kw_database::Database;
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;

/// Class model feature state
#[kw_derive::kw_slice(name = "metadata")]
pub struct Metadata {
    database: Database,
}

/// Initialize the metadata slice, seeding the core class model into an empty database.
pub fn init(database: &Database) -> Result<InitializedSlice, InventoryError> {
    let seeded = database.write(|tables| Ok::<_, InventoryError>(bootstrap::seed_core_model(tables)))?;
    if seeded > 0 {
        tracing::info!(classes = seeded, "Core class model seeded");
    }

    let slice = Metadata::new(MetadataInner { database: database.clone() });
    tracing::info!("Metadata slice initialized");
    Ok(InitializedSlice::new(slice))
}
