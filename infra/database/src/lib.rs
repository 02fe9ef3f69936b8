//! # Inventory Database
//!
//! Holds every inventory table in memory behind a single lock and persists them as one
//! postcard snapshot through [`kw_storage`].
//!
//! ## Key Features
//! - **Atomic writes**: a [`Database::write`] closure either returns `Ok` and its changes
//!   become visible with a new revision, or returns `Err` before touching the tables.
//! - **Indexed stores**: objects, classes and relationships keep parent, class and
//!   endpoint indexes that are rebuilt after every snapshot load.
//! - **Two generations**: each flush keeps the previous snapshot next to the current one,
//!   and loading falls back to it when the current file is unreadable.
//!
//! ## Example
//!
//! ```rust
//! use kw_database::{Database, DatabaseError};
//!
//! # fn main() -> Result<(), DatabaseError> {
//! let db = Database::in_memory();
//! let users = db.write(|tables| Ok::<_, DatabaseError>(tables.users.len()))?;
//! assert_eq!(users, 0);
//! assert_eq!(db.revision(), 1);
//! # Ok(())
//! # }
//! ```

mod classes;
mod error;
mod objects;
mod relationships;
mod snapshot;
mod tables;

pub use classes::ClassStore;
pub use error::{DatabaseError, DatabaseErrorExt};
pub use objects::ObjectStore;
pub use relationships::RelationshipStore;
pub use tables::Tables;

use kw_storage::Storage;
use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument, warn};

/// Default snapshot file name, relative to the storage root.
pub const DEFAULT_SNAPSHOT: &str = "inventory.snapshot";

#[derive(Debug)]
struct SnapshotTarget {
    storage: Storage,
    current: String,
    previous: String,
}

/// Inner state of the [`Database`] wrapper.
#[derive(Debug)]
pub struct DatabaseInner {
    tables: RwLock<Tables>,
    revision: AtomicU64,
    persisted: AtomicU64,
    target: Option<SnapshotTarget>,
    flush_lock: tokio::sync::Mutex<()>,
}

/// Cheaply cloneable handle to the inventory tables.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Deref for Database {
    type Target = DatabaseInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// A database that never touches disk. [`Database::flush`] is a no-op.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::assemble(Tables::default(), 0, None)
    }

    fn assemble(tables: Tables, revision: u64, target: Option<SnapshotTarget>) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                tables: RwLock::new(tables),
                revision: AtomicU64::new(revision),
                persisted: AtomicU64::new(revision),
                target,
                flush_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

impl DatabaseInner {
    /// Runs `query` against a consistent view of the tables.
    pub fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> R {
        query(&self.tables.read())
    }

    /// Runs `change` under the write lock.
    ///
    /// The closure must validate everything it needs before its first mutation: an `Err`
    /// is propagated as is and does not advance the revision, but nothing is rolled back.
    ///
    /// # Errors
    /// Whatever `change` returns.
    pub fn write<R, E>(&self, change: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E> {
        let mut tables = self.tables.write();
        let result = change(&mut tables)?;
        self.revision.fetch_add(1, Ordering::AcqRel);
        Ok(result)
    }

    /// Monotonic counter of successful writes, restored from the snapshot on open.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Whether some write has not reached the snapshot yet.
    pub fn is_dirty(&self) -> bool {
        self.target.is_some() && self.revision() != self.persisted.load(Ordering::Acquire)
    }

    /// Writes the tables to the snapshot if anything changed since the last flush.
    ///
    /// Returns `true` when a snapshot was written. Concurrent callers are serialized.
    ///
    /// # Errors
    /// [`DatabaseError::Codec`] when encoding fails and [`DatabaseError::Storage`] when the
    /// file cannot be written. The in-memory state stays dirty in both cases.
    pub async fn flush(&self) -> Result<bool, DatabaseError> {
        let Some(target) = &self.target else {
            return Ok(false);
        };
        let _guard = self.flush_lock.lock().await;

        let (revision, bytes) = {
            let tables = self.tables.read();
            let revision = self.revision();
            if revision == self.persisted.load(Ordering::Acquire) {
                return Ok(false);
            }
            (revision, snapshot::encode(revision, &tables)?)
        };

        if target.storage.exists(&target.current)? {
            target
                .storage
                .copy(&target.current, &target.previous)
                .await
                .context("Keeping previous snapshot")?;
        }
        target.storage.write(&target.current, &bytes).await.context("Writing snapshot")?;

        self.persisted.store(revision, Ordering::Release);
        debug!(revision, bytes = bytes.len(), "Snapshot flushed");
        Ok(true)
    }
}

/// A fluent builder for opening a [`Database`].
#[must_use = "builders do nothing unless you call .open()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    storage: Option<Storage>,
    snapshot: Option<String>,
}

impl DatabaseBuilder {
    /// Creates a new [`DatabaseBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Persists snapshots through `storage`. Without it the database is memory only.
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Snapshot file name relative to the storage root. Defaults to [`DEFAULT_SNAPSHOT`].
    pub fn snapshot(mut self, name: impl Into<String>) -> Self {
        self.snapshot = Some(name.into());
        self
    }

    /// Loads the latest readable snapshot generation, or starts empty when there is none.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] for an empty snapshot name.
    /// * [`DatabaseError::Storage`], [`DatabaseError::Codec`] or [`DatabaseError::Format`]
    ///   when a snapshot exists but neither generation can be loaded.
    #[instrument(skip(self), fields(snapshot = self.snapshot))]
    pub async fn open(self) -> Result<Database, DatabaseError> {
        let Some(storage) = self.storage else {
            info!("Inventory database opened in memory");
            return Ok(Database::in_memory());
        };
        let current = self.snapshot.unwrap_or_else(|| DEFAULT_SNAPSHOT.to_owned());
        if current.trim().is_empty() {
            return Err(DatabaseError::Validation {
                message: "Snapshot name must not be empty".into(),
                context: None,
            });
        }
        let target = SnapshotTarget { previous: format!("{current}.previous"), current, storage };

        let (revision, tables) = load(&target).await?;
        info!(revision, records = tables.record_count(), "Inventory database opened");
        Ok(Database::assemble(tables, revision, Some(target)))
    }
}

async fn load(target: &SnapshotTarget) -> Result<(u64, Tables), DatabaseError> {
    let current = read_generation(&target.storage, &target.current).await;
    let error = match current {
        Ok(Some(loaded)) => return Ok(loaded),
        Ok(None) => None,
        Err(error) => {
            warn!(%error, "Current snapshot unreadable, trying previous generation");
            Some(error)
        },
    };

    match read_generation(&target.storage, &target.previous).await {
        Ok(Some(loaded)) => {
            warn!(revision = loaded.0, "Recovered inventory from previous snapshot");
            Ok(loaded)
        },
        Ok(None) => error.map_or_else(|| Ok((0, Tables::default())), Err),
        Err(previous_error) => Err(error.unwrap_or(previous_error)),
    }
}

async fn read_generation(
    storage: &Storage,
    name: &str,
) -> Result<Option<(u64, Tables)>, DatabaseError> {
    if !storage.exists(name)? {
        return Ok(None);
    }
    let bytes = storage.read(name).await.context(format!("Reading {name}"))?;
    snapshot::decode(&bytes).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_writes_keep_the_revision() {
        let db = Database::in_memory();
        let result: Result<(), DatabaseError> = db.write(|_| Err("rejected".into()));
        assert!(result.is_err());
        assert_eq!(db.revision(), 0);

        db.write(|_| Ok::<_, DatabaseError>(())).unwrap();
        assert_eq!(db.revision(), 1);
    }

    #[tokio::test]
    async fn memory_databases_never_flush() {
        let db = Database::in_memory();
        db.write(|_| Ok::<_, DatabaseError>(())).unwrap();
        assert!(!db.is_dirty());
        assert!(!db.flush().await.unwrap());
    }
}
