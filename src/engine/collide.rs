//! Collision resolution: pick an unused sibling name for a taken destination.
//!
//! The split into stem and extension uses structured path components rather
//! than string slicing, so a component with a single leading dot and no
//! further dot (".profile") counts as extension-less, and "archive.tar.gz"
//! splits at the final dot ("archive.tar" + "gz").

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Return the first free sibling of `path` named `stem-N[.ext]`, N = 1, 2, …
///
/// Preserves non-UTF8 names via OsString. The result reflects filesystem
/// state at call time only; the caller is expected to resolve all names
/// before any destructive work begins so step counts stay stable.
pub fn next_free_name(path: &Path) -> PathBuf {
    let stem: OsString = path
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| OsString::from("file"));
    let ext: Option<OsString> = path.extension().map(OsStr::to_os_string);

    let mut n: u64 = 1;
    loop {
        let mut name = stem.clone();
        name.push(format!("-{n}"));
        if let Some(ref e) = ext {
            name.push(".");
            name.push(e);
        }
        let candidate = path.with_file_name(&name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
