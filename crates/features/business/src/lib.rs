//! Business object feature slice.
//!
//! Objects live in a containment tree rooted at `DummyRoot`. Regular children follow the
//! possible-children rules of the class model, special children (connections, nested
//! subnets, activities) follow the possible-special-children rules. Special relationships
//! link objects across the tree.
//!
//! The [`objects`] module is shared with the slices that create objects on their own
//! terms: templates, connections, IPAM and services.

pub mod naming;
pub mod navigation;
pub mod objects;
pub mod relationships;
pub mod search;
mod ws;

pub use objects::{NewObject, Store};
pub use ws::BusinessCall;

use kw_database::Database;
use kw_domain::model::application::FileObject;
use kw_kernel::domain::registry::InitializedSlice;
use kw_kernel::error::InventoryError;
use kw_storage::NamespacedStorage;

/// Business object feature state
#[kw_derive::kw_slice(name = "business")]
pub struct Business {
    database: Database,
    /// Where attachment content lives, so deleted objects take their files along.
    attachments: Option<NamespacedStorage>,
}

/// Initialize the business slice.
pub fn init(database: &Database, attachments: Option<NamespacedStorage>) -> Result<InitializedSlice, InventoryError> {
    let objects = database.read(|tables| tables.objects.len());
    let slice = Business::new(BusinessInner { database: database.clone(), attachments });
    tracing::info!(objects, "Business slice initialized");
    Ok(InitializedSlice::new(slice))
}

/// Deletes the stored content of attachments whose objects are gone. Failures only leave
/// orphaned content behind, so they are logged and skipped.
pub async fn discard_attachments(attachments: Option<&NamespacedStorage>, files: &[FileObject]) {
    let Some(attachments) = attachments else {
        return;
    };
    for file in files {
        if let Err(error) = attachments.delete(&file.id).await {
            tracing::warn!(%error, file = %file.id, "Attachment content left behind");
        }
    }
}
