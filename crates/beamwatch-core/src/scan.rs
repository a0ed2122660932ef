//! One filesystem pass over the monitored directory.
//!
//! A tag is reported once all of its required files exist as regular files.
//! Groups the pipeline is still writing are skipped and picked up on a later
//! pass, so no file locking is needed. Per-entry I/O errors count as "not yet
//! complete"; only the startup check in [`DirectoryScanner::new`] can fail.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::error::ScanError;
use crate::types::{ArtifactGroup, ArtifactPaths, Layout};

#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    directory: PathBuf,
    layout: Layout,
}

impl DirectoryScanner {
    /// Validate `directory` and build a scanner for it.
    pub fn new(directory: impl AsRef<Path>, layout: Layout) -> Result<Self, ScanError> {
        let directory = validate_directory(directory.as_ref())?;
        Ok(Self { directory, layout })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn paths(&self, tag: &str) -> ArtifactPaths {
        self.layout.paths(&self.directory, tag)
    }

    /// Newly complete groups not in `already_tracked`, in listing order.
    pub fn scan(&self, already_tracked: &HashSet<String>) -> Vec<ArtifactGroup> {
        scan(&self.directory, self.layout, already_tracked)
    }
}

/// Check that `directory` exists and is a readable directory; returns its absolute path.
pub fn validate_directory(directory: &Path) -> Result<PathBuf, ScanError> {
    let meta = match fs::metadata(directory) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::DirectoryMissing(directory.to_path_buf()));
        }
        Err(source) => {
            return Err(ScanError::Unreadable {
                path: directory.to_path_buf(),
                source,
            });
        }
    };
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(directory.to_path_buf()));
    }
    fs::read_dir(directory).map_err(|source| ScanError::Unreadable {
        path: directory.to_path_buf(),
        source,
    })?;
    Ok(directory
        .canonicalize()
        .unwrap_or_else(|_| directory.to_path_buf()))
}

/// Scan `directory` once. Results are unsorted; the caller orders them.
pub fn scan(
    directory: &Path,
    layout: Layout,
    already_tracked: &HashSet<String>,
) -> Vec<ArtifactGroup> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %directory.display(), error = %e, "cannot list monitored directory");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        // Follows symlinks, like the completeness check below.
        let is_dir = fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false);
        let Some(tag) = layout.candidate_tag(&name, is_dir) else {
            continue;
        };
        if already_tracked.contains(&tag) || seen.contains(&tag) {
            continue;
        }

        let paths = layout.paths(directory, &tag);
        if let Some(discovered_at) = completed_at(&paths) {
            seen.insert(tag.clone());
            found.push(ArtifactGroup { tag, discovered_at });
        }
    }
    found
}

/// Anchor mtime if every required file is a regular file right now.
fn completed_at(paths: &ArtifactPaths) -> Option<OffsetDateTime> {
    let all_present = paths
        .required()
        .iter()
        .all(|p| fs::metadata(p).map(|m| m.is_file()).unwrap_or(false));
    if !all_present {
        return None;
    }
    match fs::metadata(paths.anchor()).and_then(|m| m.modified()) {
        Ok(mtime) => Some(OffsetDateTime::from(mtime)),
        Err(e) => {
            tracing::debug!(path = %paths.anchor().display(), error = %e, "anchor mtime unavailable");
            None
        }
    }
}
