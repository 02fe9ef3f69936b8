use crate::builder::StorageBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::namespace::{NamespaceName, NamespacedStorage};
use crate::sandbox;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Marker inside the name of in-flight files. Anything carrying it after a crash is junk.
pub(crate) const TMP_MARKER: &str = ".kwtmp.";

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    fn encode(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::None => data.to_vec(),
            Self::Lz4 => lz4_flex::compress_prepend_size(data),
        }
    }

    fn decode(self, data: Vec<u8>) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::None => Ok(data),
            Self::Lz4 => lz4_flex::decompress_size_prepended(&data).context("LZ4 block"),
        }
    }
}

#[derive(Debug)]
pub struct StorageInner {
    pub(crate) root: PathBuf,
    pub(crate) compression: Compression,
    pub(crate) tmp_counter: AtomicU64,
}

/// Handle to a sandboxed directory tree.
///
/// Every path is relative to the root and can never leave it. Writes are atomic: a crash
/// leaves either the previous or the new content, never a mix. With [`Compression::Lz4`]
/// contents are compressed on disk and transparently restored on read.
///
/// ```rust
/// use kw_storage::{Compression, Storage, StorageError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let storage = Storage::builder()
///         .root(tmp.path().join("data"))
///         .compression(Compression::Lz4)
///         .connect()
///         .await?;
///
///     storage.write("inventory.snapshot", b"tables").await?;
///     assert_eq!(storage.read("inventory.snapshot").await?, b"tables");
///
///     let attachments = storage.namespace("attachments")?;
///     attachments.write("2f9c41.bin", b"rack photo").await?;
///     assert_eq!(attachments.list().await?, vec!["2f9c41.bin".to_owned()]);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// Canonical root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scoped view whose files live under `<root>/<name>/` with fan-out directories.
    ///
    /// # Errors
    /// [`StorageError::InvalidNamespace`] unless the name is lowercase ASCII letters, digits
    /// or underscores.
    pub fn namespace<N>(&self, name: N) -> Result<NamespacedStorage, StorageError>
    where
        N: TryInto<NamespaceName, Error = StorageError>,
    {
        Ok(NamespacedStorage::new(self.clone(), name.try_into()?))
    }

    /// Physical path of `path`, proven to be inside the root.
    ///
    /// # Errors
    /// [`StorageError::OutsideSandbox`] for absolute paths, climbing `..` or symlinks that
    /// point elsewhere.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        sandbox::locate(&self.root, None, path)
    }

    /// # Errors
    /// [`StorageError::FileNotFound`] when absent, [`StorageError::Decompress`] when the
    /// stored bytes were not written with the configured compression.
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        self.read_at(sandbox::locate(&self.root, None, path)?).await
    }

    /// Atomically replaces the content of `path`, creating parent directories.
    pub async fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        self.write_at(sandbox::locate(&self.root, None, path)?, data).await
    }

    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        self.delete_at(sandbox::locate(&self.root, None, path)?).await
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(sandbox::locate(&self.root, None, path)?.is_file())
    }

    /// Copies `from` over `to` atomically. Used to keep the previous snapshot generation.
    pub async fn copy(
        &self,
        from: impl AsRef<Path>,
        to: impl AsRef<Path>,
    ) -> Result<(), StorageError> {
        let source = sandbox::locate(&self.root, None, from)?;
        let raw = read_raw(&source).await?;
        let target = sandbox::locate(&self.root, None, to)?;
        self.write_raw(target, &raw).await
    }

    /// Size on disk, after compression.
    pub async fn stored_len(&self, path: impl AsRef<Path>) -> Result<u64, StorageError> {
        let resolved = sandbox::locate(&self.root, None, path)?;
        match fs::metadata(&resolved).await {
            Ok(meta) => Ok(meta.len()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(not_found(&resolved)),
            Err(source) => Err(StorageError::Io {
                source,
                context: Some(format!("metadata of {}", resolved.display()).into()),
            }),
        }
    }

    /// Removes in-flight files older than five minutes and empty directories.
    pub async fn sweep(&self) -> (usize, usize) {
        crate::sweep::sweep(&self.root).await
    }

    pub(crate) async fn read_at(&self, resolved: PathBuf) -> Result<Vec<u8>, StorageError> {
        let raw = read_raw(&resolved).await?;
        self.compression.decode(raw).context(resolved.display().to_string())
    }

    pub(crate) async fn write_at(&self, resolved: PathBuf, data: &[u8]) -> Result<(), StorageError> {
        let encoded = self.compression.encode(data);
        self.write_raw(resolved, &encoded).await
    }

    pub(crate) async fn delete_at(&self, resolved: PathBuf) -> Result<(), StorageError> {
        match fs::remove_file(&resolved).await {
            Ok(()) => {
                debug!(path = %resolved.display(), "File removed");
                Ok(())
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(not_found(&resolved)),
            Err(source) => Err(StorageError::Io {
                source,
                context: Some(format!("removing {}", resolved.display()).into()),
            }),
        }
    }

    /// tmp file, fsync, rename, then fsync of the directory.
    async fn write_raw(&self, resolved: PathBuf, bytes: &[u8]) -> Result<(), StorageError> {
        let parent = resolved.parent().map(Path::to_path_buf).ok_or_else(|| {
            StorageError::Internal {
                message: "resolved path has no parent".into(),
                context: Some(resolved.display().to_string().into()),
            }
        })?;
        fs::create_dir_all(&parent).await.context(format!("creating {}", parent.display()))?;

        let tmp = self.tmp_sibling(&resolved);
        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&tmp)
                .await
                .context(format!("opening {}", tmp.display()))?;
            file.write_all(bytes).await.context(format!("writing {}", tmp.display()))?;
            file.sync_all().await.context(format!("syncing {}", tmp.display()))?;
        }

        if let Err(err) = fs::rename(&tmp, &resolved).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::Io {
                source: err,
                context: Some(format!("moving into {}", resolved.display()).into()),
            });
        }

        match fs::File::open(&parent).await {
            Ok(dir) => {
                if let Err(err) = dir.sync_all().await {
                    warn!(path = %parent.display(), error = %err, "Directory sync failed");
                }
            },
            Err(err) => warn!(path = %parent.display(), error = %err, "Directory open failed"),
        }

        debug!(path = %resolved.display(), bytes = bytes.len(), "File written");
        Ok(())
    }

    fn tmp_sibling(&self, target: &Path) -> PathBuf {
        let sequence = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let name = target.file_name().and_then(|s| s.to_str()).unwrap_or("file");
        target.with_file_name(format!("{name}{TMP_MARKER}{}.{sequence}", std::process::id()))
    }
}

async fn read_raw(resolved: &Path) -> Result<Vec<u8>, StorageError> {
    match fs::read(resolved).await {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(not_found(resolved)),
        Err(source) => Err(StorageError::Io {
            source,
            context: Some(format!("reading {}", resolved.display()).into()),
        }),
    }
}

fn not_found(path: &Path) -> StorageError {
    StorageError::FileNotFound { message: path.display().to_string().into(), context: None }
}
