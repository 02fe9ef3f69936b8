use crate::engine::{Compression, Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

/// Builder of a [`Storage`]; `connect` is only available once a root is set.
#[derive(Debug, Default)]
pub struct StorageBuilder<S: Sealed = NoRoot> {
    state: S,
    compression: Compression,
    must_exist: bool,
}

impl<S: Sealed> StorageBuilder<S> {
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Refuse to create a missing root directory.
    #[must_use]
    pub const fn must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = must_exist;
        self
    }
}

impl StorageBuilder<NoRoot> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<WithRoot> {
        StorageBuilder {
            state: WithRoot(path.into()),
            compression: self.compression,
            must_exist: self.must_exist,
        }
    }
}

impl StorageBuilder<WithRoot> {
    /// Creates (unless `must_exist`) and canonicalizes the root, then sweeps temporary files
    /// left by an earlier crash.
    ///
    /// # Errors
    /// [`StorageError::Io`] when the root cannot be created or resolved.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let root = self.state.0;
        if !self.must_exist {
            fs::create_dir_all(&root)
                .await
                .context(format!("creating storage root {}", root.display()))?;
        }
        let canonical = fs::canonicalize(&root)
            .await
            .context(format!("resolving storage root {}", root.display()))?;

        let storage = Storage {
            inner: Arc::new(StorageInner {
                root: canonical,
                compression: self.compression,
                tmp_counter: AtomicU64::new(1),
            }),
        };
        storage.sweep().await;
        info!(root = %storage.root().display(), compression = ?self.compression, "Storage ready");
        Ok(storage)
    }
}
