//! Index of watched directory subtrees.
//!
//! # Responsibilities
//! - Map each registered directory to its recursive subdirectory list
//! - Add OS watches for directories as they appear
//! - Remove a whole subtree's watches when its root disappears
//!
//! # Design Decisions
//! - Owned by the dispatcher task; never shared, never locked
//! - Every enumerated directory gets its own entry, so a nested directory
//!   that is later removed can be unwatched as a unit
//! - Lists stay depth-first (every path after its ancestors), so reverse
//!   iteration always unwatches children before parents

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ProviderError, Result};
use crate::observability::metrics;
use crate::watch::enumerator::{enumerate_directories, subtree_of};
use crate::watch::source::WatchSource;

/// Watched directory → subdirectories discovered under it at last scan.
#[derive(Debug, Default)]
pub struct WatchSetManager {
    watched: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl WatchSetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerate `root` and watch every directory found.
    ///
    /// Enumeration errors are returned; per-directory watch failures are
    /// logged and skipped. Returns the number of watches added.
    pub fn register<S: WatchSource + ?Sized>(&mut self, source: &mut S, root: &Path) -> Result<usize> {
        let directories = enumerate_directories(root)?;
        if directories.is_empty() {
            return Ok(0);
        }

        // Entries left over from a previous scan of the same root.
        if let Some(previous) = self.watched.remove(root) {
            for stale in previous.iter().filter(|p| !directories.contains(p)) {
                self.watched.remove(stale);
            }
        }

        for (key, list) in self.watched.iter_mut() {
            if root.starts_with(key) && key.as_path() != root {
                for dir in &directories {
                    if !list.contains(dir) {
                        list.push(dir.clone());
                    }
                }
            }
        }

        for dir in &directories {
            self.watched
                .insert(dir.clone(), subtree_of(&directories, dir).to_vec());
        }

        let mut added = 0;
        for dir in &directories {
            match source.add(dir) {
                Ok(()) => added += 1,
                Err(e) => {
                    let err = ProviderError::WatchAdd {
                        path: dir.clone(),
                        source: e,
                    };
                    tracing::error!(error = %err, "Unable to add file watcher");
                }
            }
        }

        metrics::record_watched_directories(self.watched.len());
        tracing::debug!(
            root = %root.display(),
            directories = directories.len(),
            watched = added,
            "Directory tree registered"
        );
        Ok(added)
    }

    /// A path was created: watch it and anything already below it.
    pub fn on_directory_created<S: WatchSource + ?Sized>(&mut self, source: &mut S, path: &Path) {
        if let Err(e) = self.register(source, path) {
            tracing::error!(
                root = %path.display(),
                error = %e,
                "Unable to get sub-directories to add to watcher"
            );
        }
    }

    /// A path was removed or renamed away: unwatch its subtree.
    ///
    /// Paths that were never registered (plain files included) are ignored.
    /// Returns true if a subtree was dropped.
    pub fn on_directory_removed_or_renamed<S: WatchSource + ?Sized>(
        &mut self,
        source: &mut S,
        path: &Path,
    ) -> bool {
        let Some(subdirectories) = self.watched.get(path).cloned() else {
            return false;
        };

        for dir in subdirectories.iter().rev() {
            // The OS usually drops the watch itself once the directory is gone.
            if let Err(e) = source.remove(dir) {
                tracing::debug!(path = %dir.display(), error = %e, "Unable to remove file watcher");
            }
            self.watched.remove(dir);
        }

        self.watched.retain(|key, _| !key.starts_with(path));
        for list in self.watched.values_mut() {
            list.retain(|p| !p.starts_with(path));
        }

        metrics::record_watched_directories(self.watched.len());
        tracing::debug!(
            root = %path.display(),
            directories = subdirectories.len(),
            "Directory tree unregistered"
        );
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.watched.contains_key(path)
    }

    /// Recorded subdirectory list of a registered directory.
    pub fn subtree(&self, path: &Path) -> Option<&[PathBuf]> {
        self.watched.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }
}
