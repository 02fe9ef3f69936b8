use crate::engine::{Storage, TMP_MARKER};
use crate::error::{StorageError, StorageErrorExt};
use crate::sandbox;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Validated namespace directory name: lowercase ASCII letters, digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(Arc<str>);

impl TryFrom<&str> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        let name = value.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(StorageError::InvalidNamespace {
                message: "namespace is empty".into(),
                context: None,
            });
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StorageError::InvalidNamespace { message: name.into(), context: None });
        }
        Ok(Self(name.into()))
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for NamespaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage scoped to one namespace directory, such as `attachments`.
///
/// Callers address files by their logical name; the fan-out directories are an
/// implementation detail and never show up in [`NamespacedStorage::list`].
#[derive(Debug, Clone)]
pub struct NamespacedStorage {
    storage: Storage,
    namespace: NamespaceName,
}

impl NamespacedStorage {
    pub(crate) const fn new(storage: Storage, namespace: NamespaceName) -> Self {
        Self { storage, namespace }
    }

    #[must_use]
    pub const fn name(&self) -> &NamespaceName {
        &self.namespace
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        sandbox::locate(self.storage.root(), Some(self.namespace.as_ref()), path)
    }

    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        self.storage.read_at(self.resolve(path)?).await
    }

    pub async fn write(&self, path: impl AsRef<Path>, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write_at(self.resolve(path)?, data).await
    }

    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        self.storage.delete_at(self.resolve(path)?).await
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(self.resolve(path)?.is_file())
    }

    /// Logical names of every stored file, sorted. Only top-level names are reported, which
    /// is how attachment ids are stored.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let base = self.storage.root().join(self.namespace.as_ref());
        let mut names = tokio::task::spawn_blocking(move || {
            if !base.is_dir() {
                return Vec::new();
            }
            WalkDir::new(&base)
                .min_depth(1)
                .max_depth(3)
                .into_iter()
                .flatten()
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| entry.file_name().to_str().map(str::to_owned))
                .filter(|name| !name.contains(TMP_MARKER))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| StorageError::Internal {
            message: e.to_string().into(),
            context: Some("listing task failed".into()),
        })
        .context(format!("listing namespace {}", self.namespace))?;
        names.sort();
        names.dedup();
        Ok(names)
    }
}
