use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

fn escape(path: &Path, reason: &'static str) -> StorageError {
    StorageError::OutsideSandbox { message: path.display().to_string().into(), context: Some(reason.into()) }
}

/// Folds `.` and `..` without touching the disk. A `..` that would climb above the
/// relative base is rejected, as are absolute paths.
pub(crate) fn fold_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut folded = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::Normal(segment) => folded.push(segment),
            Component::ParentDir => {
                if !folded.pop() {
                    return Err(escape(path, "parent segment climbs above the root"));
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(escape(path, "absolute paths are not accepted"));
            },
        }
    }
    if folded.as_os_str().is_empty() {
        return Err(StorageError::FileNotFound {
            message: path.display().to_string().into(),
            context: Some("path names no file".into()),
        });
    }
    Ok(folded)
}

/// Joins `path` to the canonical `root` and proves the result stays inside it, following
/// symlinks of every ancestor that already exists.
pub(crate) fn confine(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let joined = root.join(fold_relative(path.as_ref())?);

    let mut ancestor = Some(joined.as_path());
    while let Some(candidate) = ancestor {
        if candidate == root {
            return Ok(joined);
        }
        match candidate.canonicalize() {
            Ok(real) if real.starts_with(root) => return Ok(joined),
            Ok(_) => return Err(escape(candidate, "existing entry links outside the root")),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => ancestor = candidate.parent(),
            Err(source) => {
                return Err(StorageError::Io {
                    source,
                    context: Some(format!("verifying {}", candidate.display()).into()),
                });
            },
        }
    }
    Err(escape(&joined, "no ancestor inside the root"))
}

/// Physical location of `path` inside an optional namespace.
///
/// Files of a namespace are spread over two levels of fan-out directories taken from the
/// first four characters of the file name, keeping attachment directories small.
/// Intermediate directories of `path` are kept as given.
pub(crate) fn locate(
    root: &Path,
    namespace: Option<&str>,
    path: impl AsRef<Path>,
) -> Result<PathBuf, StorageError> {
    let path = fold_relative(path.as_ref())?;
    let Some(namespace) = namespace else {
        return confine(root, path);
    };

    let file_name = path.file_name().and_then(|name| name.to_str()).ok_or_else(|| {
        StorageError::FileNotFound {
            message: path.display().to_string().into(),
            context: Some("file name is not valid UTF-8".into()),
        }
    })?;

    let mut located = PathBuf::from(namespace);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        located.push(parent);
    }
    let prefix: Vec<char> = file_name.chars().take(4).collect();
    if prefix.len() == 4 {
        located.push(prefix[..2].iter().collect::<String>());
        located.push(prefix[2..].iter().collect::<String>());
    }
    located.push(file_name);

    confine(root, located)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_segments_are_folded() {
        let folded = fold_relative(Path::new("a/./b/../c.bin")).unwrap();
        assert_eq!(folded, PathBuf::from("a/c.bin"));
    }

    #[test]
    fn climbing_out_is_rejected() {
        assert!(matches!(
            fold_relative(Path::new("a/../../c.bin")),
            Err(StorageError::OutsideSandbox { .. })
        ));
        assert!(matches!(
            fold_relative(Path::new("/etc/passwd")),
            Err(StorageError::OutsideSandbox { .. })
        ));
    }

    #[test]
    fn empty_path_names_no_file() {
        assert!(matches!(fold_relative(Path::new("a/..")), Err(StorageError::FileNotFound { .. })));
    }

    #[test]
    fn namespaced_files_fan_out() {
        let root = std::env::temp_dir().canonicalize().unwrap();
        let located = locate(&root, Some("attachments"), "7f3a9c.bin").unwrap();
        assert!(located.ends_with("attachments/7f/3a/7f3a9c.bin"));

        let short = locate(&root, Some("attachments"), "ab.bin").unwrap();
        assert!(short.ends_with("attachments/ab/.b/ab.bin"));
    }
}
