//! Operation executor.
//!
//! A run has two phases. Expansion turns the request's source/destination
//! pairs into a flat list of primitive steps, resolving destination
//! collisions up front so the step total is stable before anything is
//! touched. Execution then walks that list once, emitting a progress event
//! before each step, polling the stop flag, and accumulating failed paths
//! instead of aborting. Partial completion is expected and reported, never
//! rolled back.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

use crate::errors::StructuralError;

use super::collide::next_free_name;
use super::device::{DeviceId, device_of};
use super::events::{Progress, Report, StopFlag};
use super::request::{OpKind, OperationRequest, OverwritePolicy};
use super::walk::{DirOrder, subtree};

/// One primitive step; `new` is `None` for removals.
struct WorkItem {
    old: PathBuf,
    new: Option<PathBuf>,
}

/// Run the request to its terminal state. Infallible by design: everything
/// that can go wrong per item lands in the report instead.
pub(crate) fn execute(
    request: &OperationRequest,
    stop: &StopFlag,
    on_progress: &mut dyn FnMut(Progress),
) -> Report {
    let kind = request.kind();
    let overwrite = request.overwrite();

    let items = match expand(request, stop) {
        Ok(items) => items,
        Err(err) => return Report::rejected(err),
    };

    // Device split for moves, decided once per run: all sources are assumed
    // to share one device, and likewise all destinations.
    let mut source_dev = None;
    let mut cross_device = false;
    if kind == OpKind::Move {
        source_dev = items.first().and_then(|it| device_of(&it.old));
        let dest_dev = items
            .first()
            .and_then(|it| it.new.as_deref())
            .and_then(Path::parent)
            .and_then(device_of);
        cross_device = devices_differ(source_dev, dest_dev);
        debug!(?source_dev, ?dest_dev, cross_device, "device split for move");
    }

    let total = items.len();
    let mut failed: Vec<PathBuf> = Vec::new();

    for (i, item) in items.iter().enumerate() {
        if stop.is_requested() {
            debug!(done = i, total, "stop requested; halting run");
            break;
        }
        on_progress(Progress {
            index: i + 1,
            total,
            old: item.old.clone(),
            new: item.new.clone(),
        });

        match (&item.new, kind) {
            (_, OpKind::Remove) => remove_step(&item.old, &mut failed),
            (Some(new), OpKind::Copy | OpKind::Restore) => {
                copy_step(kind, overwrite, &item.old, new, &mut failed);
            }
            (Some(new), OpKind::Move) => {
                move_step(
                    overwrite,
                    &item.old,
                    new,
                    cross_device,
                    source_dev,
                    stop,
                    &mut failed,
                );
            }
            (None, _) => {}
        }
    }

    failed.retain(|p| !p.as_os_str().is_empty());
    Report {
        failed,
        rejected: None,
    }
}

/// Expansion phase: build the flat step list for the request's kind.
fn expand(request: &OperationRequest, stop: &StopFlag) -> Result<Vec<WorkItem>, StructuralError> {
    let mut items = Vec::new();
    let overwrite = request.overwrite();

    match request.kind() {
        OpKind::Remove => {
            for src in &request.sources {
                if stop.is_requested() {
                    break;
                }
                // Children before parents, so each directory is empty by the
                // time its own removal step runs.
                items.extend(
                    subtree(src, DirOrder::ParentsLast, None)
                        .into_iter()
                        .map(|old| WorkItem { old, new: None }),
                );
            }
        }
        OpKind::Copy | OpKind::Restore => {
            for (src, dst) in request.sources.iter().zip(&request.destinations) {
                if stop.is_requested() {
                    break;
                }
                if src == dst {
                    continue;
                }
                // Resolve the destination root first so every descendant
                // path is computed under the final name.
                let dst = resolve_destination(dst, overwrite);
                for old in subtree(src, DirOrder::ParentsFirst, None) {
                    let new = rebase(&old, src, &dst);
                    items.push(WorkItem {
                        old,
                        new: Some(new),
                    });
                }
            }
        }
        OpKind::Move => {
            for (src, dst) in request.sources.iter().zip(&request.destinations) {
                if stop.is_requested() {
                    break;
                }
                if dst != src && dst.starts_with(src) {
                    return Err(StructuralError::move_into_self(src, dst));
                }
                let dst = resolve_destination(dst, overwrite);
                // Flat pair; cross-device directories expand during their
                // own step, everything else is a single rename.
                items.push(WorkItem {
                    old: src.clone(),
                    new: Some(dst),
                });
            }
        }
    }

    Ok(items)
}

/// Rewrite a colliding destination to a free sibling unless the policy says
/// to overwrite in place.
fn resolve_destination(dst: &Path, overwrite: OverwritePolicy) -> PathBuf {
    if overwrite != OverwritePolicy::Always && dst.exists() {
        let resolved = next_free_name(dst);
        debug!(requested = %dst.display(), resolved = %resolved.display(), "destination taken; renamed");
        resolved
    } else {
        dst.to_path_buf()
    }
}

fn remove_step(old: &Path, failed: &mut Vec<PathBuf>) {
    if let Err(e) = remove_single(old) {
        warn!(path = %old.display(), error = %e, "remove failed");
        failed.push(old.to_path_buf());
    }
}

fn copy_step(
    kind: OpKind,
    overwrite: OverwritePolicy,
    old: &Path,
    new: &Path,
    failed: &mut Vec<PathBuf>,
) {
    if old == new {
        return;
    }
    if overwrite == OverwritePolicy::Always && new.exists() {
        failed.extend(remove_tree(new));
    }
    if ancestor_failed(failed, old) {
        trace!(path = %old.display(), "skipping: an ancestor already failed");
        return;
    }
    if let Err(e) = copy_entry(kind, old, new) {
        warn!(old = %old.display(), new = %new.display(), error = %e, "copy failed");
        failed.push(old.to_path_buf());
    }
}

fn move_step(
    overwrite: OverwritePolicy,
    old: &Path,
    new: &Path,
    cross_device: bool,
    source_dev: Option<DeviceId>,
    stop: &StopFlag,
    failed: &mut Vec<PathBuf>,
) {
    if overwrite == OverwritePolicy::Always && new.exists() {
        failed.extend(remove_tree(new));
    }
    if cross_device && old.is_dir() {
        move_tree_across_devices(old, new, source_dev, stop, failed);
        return;
    }
    if ancestor_failed(failed, old) {
        trace!(path = %old.display(), "skipping: an ancestor already failed");
        return;
    }
    if let Err(e) = fs::rename(old, new) {
        warn!(old = %old.display(), new = %new.display(), error = %e, hint = rename_hint(&e), "rename failed");
        failed.push(old.to_path_buf());
    }
}

/// Cross-device directory move: no atomic rename exists, so copy the subtree
/// entry by entry and delete each original whose copy succeeded. Files go
/// immediately; directories wait until the end and are removed in reverse
/// order (children before parents), so a directory with a failed child
/// simply stays behind. Delete failures here are cleanup noise, not part of
/// the failure report.
fn move_tree_across_devices(
    root_old: &Path,
    root_new: &Path,
    source_dev: Option<DeviceId>,
    stop: &StopFlag,
    failed: &mut Vec<PathBuf>,
) {
    // The device filter keeps nested foreign mounts out of the copy.
    let entries = subtree(root_old, DirOrder::ParentsFirst, source_dev);
    let mut copied_dirs: Vec<PathBuf> = Vec::new();

    for old in &entries {
        if stop.is_requested() {
            break;
        }
        if ancestor_failed(failed, old) {
            continue;
        }
        let new = rebase(old, root_old, root_new);
        let before = failed.len();
        if let Err(e) = copy_entry(OpKind::Move, old, &new) {
            warn!(old = %old.display(), new = %new.display(), error = %e, "copy failed");
            failed.push(old.clone());
        }
        if failed.len() == before {
            if old.is_dir() {
                copied_dirs.push(old.clone());
            } else if let Err(e) = fs::remove_file(old) {
                debug!(path = %old.display(), error = %e, "could not remove moved file");
            }
        }
    }

    for dir in copied_dirs.iter().rev() {
        if let Err(e) = fs::remove_dir(dir) {
            debug!(path = %dir.display(), error = %e, "could not remove moved directory");
        }
    }
}

/// Primitive copy: directories are created (with intermediates), files are
/// copied byte-for-byte. Copy and Restore re-apply the source's permission
/// bits onto the new file; Move leaves permissions alone.
fn copy_entry(kind: OpKind, old: &Path, new: &Path) -> io::Result<()> {
    if old.is_dir() {
        fs::create_dir_all(new)
    } else {
        fs::copy(old, new)?;
        if matches!(kind, OpKind::Copy | OpKind::Restore) {
            propagate_permissions(old, new)?;
        }
        Ok(())
    }
}

/// Non-recursive removal: rmdir for directories (enumeration already ordered
/// children first), unlink for everything else.
fn remove_single(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

/// Recursive removal used when overwriting an existing target. Failures are
/// reported back to the caller; the batch keeps going.
fn remove_tree(path: &Path) -> Vec<PathBuf> {
    let mut errs = Vec::new();
    for p in subtree(path, DirOrder::ParentsLast, None) {
        if let Err(e) = remove_single(&p) {
            warn!(path = %p.display(), error = %e, "remove failed");
            errs.push(p);
        }
    }
    errs
}

/// A directory that failed to materialize implies its children cannot be
/// written; they are skipped without being re-reported.
fn ancestor_failed(failed: &[PathBuf], path: &Path) -> bool {
    failed.iter().any(|f| path != f && path.starts_with(f))
}

/// Substitute `new_root` for `old_root` at the front of `path`.
fn rebase(path: &Path, old_root: &Path, new_root: &Path) -> PathBuf {
    match path.strip_prefix(old_root) {
        Ok(rel) if rel.as_os_str().is_empty() => new_root.to_path_buf(),
        Ok(rel) => new_root.join(rel),
        // Enumeration only yields old_root and its descendants.
        Err(_) => new_root.to_path_buf(),
    }
}

/// Unknown devices on either side disable the cross-device branch (treated
/// as same device). FILEHERD_FORCE_CROSS_DEVICE forces the branch so tests
/// can exercise it on a single filesystem.
fn devices_differ(source: Option<DeviceId>, dest: Option<DeviceId>) -> bool {
    if env::var_os("FILEHERD_FORCE_CROSS_DEVICE").is_some() {
        return true;
    }
    matches!((source, dest), (Some(s), Some(d)) if s != d)
}

#[cfg(unix)]
fn propagate_permissions(old: &Path, new: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(old)?.permissions().mode() & 0o777;
    fs::set_permissions(new, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn propagate_permissions(old: &Path, new: &Path) -> io::Result<()> {
    let ro = fs::metadata(old)?.permissions().readonly();
    let mut perms = fs::metadata(new)?.permissions();
    perms.set_readonly(ro);
    fs::set_permissions(new, perms)
}

#[cfg(unix)]
fn rename_hint(e: &io::Error) -> &'static str {
    match e.raw_os_error() {
        Some(code) if code == libc::EXDEV => "cross-filesystem; rename cannot cross devices",
        Some(code) if code == libc::EACCES || code == libc::EPERM => {
            "permission denied; check destination perms"
        }
        _ => "rename failed",
    }
}

#[cfg(not(unix))]
fn rename_hint(e: &io::Error) -> &'static str {
    match e.kind() {
        io::ErrorKind::PermissionDenied => "permission denied; check destination perms",
        _ => "rename failed",
    }
}
