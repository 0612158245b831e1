use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{MigrateError, Result};
use crate::normalization::file_name::is_image_extension;

/// A local image file found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// File name including extension.
    pub name: String,
    /// Path used to read the bytes.
    pub local_path: PathBuf,
    /// Path below the scan root, `/`-separated.
    pub relative_path: String,
    pub size_bytes: u64,
}

/// Walk `root` recursively and collect every image file.
///
/// Entries are visited depth-first in file-name order so repeated scans of an
/// unchanged tree produce the same sequence. Symlinks are followed, but each
/// physical file is reported once: later aliases of an already-seen canonical
/// path are dropped. Unreadable entries are logged and skipped.
pub fn scan_images(root: &Path) -> Result<Vec<ImageDescriptor>> {
    if !root.is_dir() {
        return Err(MigrateError::ScanDirectoryMissing(root.to_path_buf()));
    }

    let mut found = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(target = "scan", error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let has_image_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(is_image_extension);
        if !has_image_ext {
            continue;
        }

        match std::fs::canonicalize(path) {
            Ok(canonical) => {
                if !seen.insert(canonical) {
                    continue;
                }
            }
            Err(err) => {
                warn!(target = "scan", path = %path.display(), error = %err, "cannot resolve path; skipping");
                continue;
            }
        }

        let size_bytes = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!(target = "scan", path = %path.display(), error = %err, "cannot stat file; skipping");
                continue;
            }
        };
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        found.push(ImageDescriptor {
            name: entry.file_name().to_string_lossy().into_owned(),
            local_path: path.to_path_buf(),
            relative_path,
            size_bytes,
        });
    }
    Ok(found)
}
