//! # Storage
//!
//! Sandboxed file store behind the inventory snapshot and the attachment repository.
//!
//! * Paths are confined to the root. Absolute paths, climbing `..` and symlinks leading out
//!   are rejected with [`StorageError::OutsideSandbox`].
//! * Writes go through a temporary sibling, `fsync` and `rename`, so readers never see a
//!   torn file. Leftovers from a crash are swept when the store connects.
//! * Optional LZ4 compression is invisible to callers.
//! * [`NamespacedStorage`] groups files such as attachments under their own directory with
//!   two levels of fan-out.

mod builder;
mod engine;
mod error;
mod namespace;
mod sandbox;
mod sweep;

pub use builder::StorageBuilder;
pub use engine::{Compression, Storage};
pub use error::{StorageError, StorageErrorExt};
pub use namespace::{NamespaceName, NamespacedStorage};
