//! Platform-specific helpers.
//! This module hides OS differences behind a uniform API so the rest of the
//! codebase can remain platform-agnostic. Unix gets restrictive modes and an
//! atomic config write; the fallback covers everything else with std only.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod fallback;

#[cfg(unix)]
pub use unix::{
    open_log_file_secure_append, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};

#[cfg(not(unix))]
pub use fallback::{
    open_log_file_secure_append, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique hidden sibling name for atomic config writes:
/// `.fileherd.config.tmp.<pid>.<nanos>.<seq>`.
pub(crate) fn tmp_config_sibling_name(target: &Path) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let name = format!(".fileherd.config.tmp.{pid}.{nanos}.{seq}");
    target.parent().unwrap_or_else(|| Path::new(".")).join(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn concurrent_temp_names_never_collide() {
        let target = Path::new("dummy.xml");
        let mut handles = Vec::new();
        for _ in 0..32 {
            let t = target.to_path_buf();
            handles.push(thread::spawn(move || tmp_config_sibling_name(&t)));
        }
        let mut seen = HashSet::new();
        for h in handles {
            assert!(seen.insert(h.join().unwrap()));
        }
        assert_eq!(seen.len(), 32);
    }
}
