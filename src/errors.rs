//! Typed error definitions for fileherd.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reasons a request is refused before any background work starts.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("sources/destinations length mismatch: {sources} vs {destinations}")]
    LengthMismatch { sources: usize, destinations: usize },

    #[error(
        "overwrite policy is unresolved and {} destination(s) already exist",
        existing.len()
    )]
    OverwriteUnresolved { existing: Vec<PathBuf> },

    #[error("failed to start worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// A request that is provably unsatisfiable: detected before any mutation,
/// reported as a two-part message, and aborts the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: {message}")]
pub struct StructuralError {
    pub title: String,
    pub message: String,
}

impl StructuralError {
    /// Moving a directory into its own subtree is impossible.
    pub(crate) fn move_into_self(old: &Path, new: &Path) -> Self {
        Self {
            title: "Invalid move".into(),
            message: format!(
                "It is not possible to move a directory into itself. \
                 Make a copy of the directory instead.\n\nOld location: {}\nNew location: {}",
                old.display(),
                new.display()
            ),
        }
    }
}
