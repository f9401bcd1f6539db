//! Recursive subtree enumeration with caller-selected ordering.
//!
//! Removal needs children listed before their parent (a directory can only be
//! rmdir'd once empty); copy and move need the parent first (it must exist
//! before anything is written into it). Both orderings come from the same
//! recursion, and an optional device filter prunes subtrees that live on a
//! foreign mount.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::device::{DeviceId, device_of};

/// Where a directory appears relative to its own contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirOrder {
    /// Directory first, then its subtree. Used when creating trees.
    ParentsFirst,
    /// Subtree first, directory last. Used when deleting trees.
    ParentsLast,
}

/// Enumerate `root` and everything beneath it.
///
/// - A non-directory root yields just `[root]`.
/// - With `device_filter` set, a directory on a different device yields `[]`
///   (the whole subtree is excluded); a directory whose device cannot be
///   determined is treated as same-device and included.
/// - Entries come back in directory-iteration order: deterministic within one
///   call, not sorted. Hidden entries are included; `.`/`..` never appear.
pub fn subtree(root: &Path, order: DirOrder, device_filter: Option<DeviceId>) -> Vec<PathBuf> {
    let mut out = Vec::new();
    collect(root, order, device_filter, &mut out);
    out
}

fn collect(path: &Path, order: DirOrder, device_filter: Option<DeviceId>, out: &mut Vec<PathBuf>) {
    // Symlinks are treated as leaf entries, never followed into.
    let is_dir = fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_dir())
        .unwrap_or(false);

    if !is_dir {
        out.push(path.to_path_buf());
        return;
    }

    if let Some(wanted) = device_filter
        && let Some(actual) = device_of(path)
        && actual != wanted
    {
        // Foreign mount point: exclude this subtree entirely.
        return;
    }

    if order == DirOrder::ParentsFirst {
        out.push(path.to_path_buf());
    }

    let (subdirs, files) = list_entries(path);

    match order {
        DirOrder::ParentsFirst => {
            for dir in &subdirs {
                collect(dir, order, device_filter, out);
            }
            out.extend(files);
        }
        DirOrder::ParentsLast => {
            for dir in &subdirs {
                collect(dir, order, device_filter, out);
            }
            out.extend(files);
            out.push(path.to_path_buf());
        }
    }
}

/// Immediate children of `dir`, split into subdirectories and everything else.
/// A directory that cannot be read lists no children (its own path still
/// appears per the ordering rule).
fn list_entries(dir: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut subdirs = Vec::new();
    let mut files = Vec::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot read directory; listing no children");
            return (subdirs, files);
        }
    };

    for entry in entries.flatten() {
        let is_dir = entry
            .file_type()
            .map(|ft| ft.is_dir())
            .unwrap_or(false);
        if is_dir {
            subdirs.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }

    (subdirs, files)
}
