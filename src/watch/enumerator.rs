//! Recursive directory listing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ProviderError, Result};

/// List `root` followed by every directory below it.
///
/// Order is root-first, depth-first, siblings in `read_dir` order. A root
/// that exists but is not a directory yields an empty list. Symlinked
/// directories below the root are not descended into.
pub fn enumerate_directories(root: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(root).map_err(|source| ProviderError::Stat {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Ok(Vec::new());
    }

    let mut directories = Vec::new();
    collect(root, &mut directories)?;
    Ok(directories)
}

fn collect(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let read_dir_err = |source| ProviderError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let entries = fs::read_dir(dir).map_err(read_dir_err)?;
    out.push(dir.to_path_buf());

    for entry in entries {
        let entry = entry.map_err(read_dir_err)?;
        // Symlinks are not followed; a link back up the tree would never end.
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            collect(&entry.path(), out)?;
        }
    }
    Ok(())
}

/// The contiguous run of `list` describing the subtree rooted at `dir`.
///
/// Relies on the depth-first layout produced by [`enumerate_directories`].
pub fn subtree_of<'a>(list: &'a [PathBuf], dir: &Path) -> &'a [PathBuf] {
    let Some(start) = list.iter().position(|p| p == dir) else {
        return &[];
    };
    let len = list[start..]
        .iter()
        .take_while(|p| p.starts_with(dir))
        .count();
    &list[start..start + len]
}
