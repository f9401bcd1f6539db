//! Filesystem device identification.
//!
//! A move between two paths on the same device is an atomic rename; across a
//! device boundary it has to become copy+delete. Lookups that fail degrade to
//! "unknown" rather than erroring out, and unknown is treated downstream as
//! same-device.

use std::path::Path;

/// Opaque identifier for the storage device backing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId(pub u64);

/// Device backing `path`.
///
/// If `path` does not exist yet (a destination that is about to be created),
/// its parent is consulted instead. Returns `None` when the device cannot be
/// determined; callers skip device-boundary logic in that case.
#[cfg(unix)]
pub fn device_of(path: &Path) -> Option<DeviceId> {
    use std::fs;
    use std::os::unix::fs::MetadataExt;

    match fs::metadata(path) {
        Ok(meta) => Some(DeviceId(meta.dev())),
        Err(_) => path
            .parent()
            .and_then(|parent| fs::metadata(parent).ok())
            .map(|meta| DeviceId(meta.dev())),
    }
}

/// Non-Unix targets report no device information, which disables the
/// cross-device branch entirely (every move is treated as same-device).
#[cfg(not(unix))]
pub fn device_of(path: &Path) -> Option<DeviceId> {
    let _ = path;
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn existing_path_has_a_device() {
        let td = tempdir().unwrap();
        assert!(device_of(td.path()).is_some());
    }

    #[test]
    fn missing_path_falls_back_to_parent() {
        let td = tempdir().unwrap();
        let ghost = td.path().join("not-created-yet");
        assert_eq!(device_of(&ghost), device_of(td.path()));
    }

    #[test]
    fn siblings_share_a_device() {
        let td = tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        std::fs::create_dir(&a).unwrap();
        std::fs::create_dir(&b).unwrap();
        assert_eq!(device_of(&a), device_of(&b));
    }
}
