use crate::engine::TMP_MARKER;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::WalkDir;

const STALE_AFTER: Duration = Duration::from_secs(300);

pub(crate) async fn sweep(root: &Path) -> (usize, usize) {
    let root = root.to_path_buf();
    let now = SystemTime::now();
    match tokio::task::spawn_blocking(move || sweep_blocking(&root, now)).await {
        Ok((removed, failed)) => {
            if removed > 0 || failed > 0 {
                info!(removed, failed, "Swept leftover temporary files");
            }
            (removed, failed)
        },
        Err(e) => {
            error!(error = %e, "Sweep task failed");
            (0, 0)
        },
    }
}

fn sweep_blocking(root: &Path, now: SystemTime) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    for entry in WalkDir::new(root).contents_first(true).into_iter().flatten() {
        let path = entry.path();
        if path == root {
            continue;
        }
        if entry.file_type().is_dir() {
            // Fails on non-empty directories, which is what we want.
            let _ = std::fs::remove_dir(path);
            continue;
        }
        let is_tmp = entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER));
        if !is_tmp || !is_stale(path, now) {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not remove temporary file");
                failed += 1;
            },
        }
    }

    (removed, failed)
}

fn is_stale(path: &Path, now: SystemTime) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age > STALE_AFTER)
}
