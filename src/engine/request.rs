//! Operation requests: kind, overwrite policy, and input validation.

use std::env;
use std::path::{Path, PathBuf};

use crate::errors::RequestError;

/// The four batch operations the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Remove,
    Copy,
    Restore,
    Move,
}

impl OpKind {
    /// Whether this kind consumes a destination list.
    pub fn takes_destinations(self) -> bool {
        self != OpKind::Remove
    }

    /// Present-progressive label for progress lines ("Removing: …").
    pub fn progress_label(self) -> &'static str {
        match self {
            OpKind::Remove => "Removing",
            OpKind::Copy => "Copying",
            OpKind::Restore => "Restoring",
            OpKind::Move => "Moving",
        }
    }

    /// Infinitive used in the terminal error summary ("Could not copy …").
    pub fn verb(self) -> &'static str {
        match self {
            OpKind::Remove => "remove",
            OpKind::Copy => "copy",
            OpKind::Restore => "restore",
            OpKind::Move => "move",
        }
    }
}

/// What to do when a destination path already exists.
///
/// `Auto` is a placeholder meaning "not decided yet": a request with policy
/// Auto and existing destinations is refused at start so the caller can
/// prompt and resupply a concrete policy. Auto with no collisions behaves as
/// `Never`. Once a run starts the policy is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    #[default]
    Auto,
    /// Resolve collisions by renaming the destination to an unused sibling.
    Never,
    /// Delete the existing target, then write.
    Always,
}

/// Immutable input to a single run of the executor.
///
/// Paths are normalized to absolute form at construction. For Move, device
/// detection assumes all sources share one device and all destinations share
/// one device (they are computed once per run from the first pair).
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub(crate) kind: OpKind,
    pub(crate) sources: Vec<PathBuf>,
    pub(crate) destinations: Vec<PathBuf>,
    pub(crate) overwrite: OverwritePolicy,
}

impl OperationRequest {
    /// Build a request, validating list lengths for kinds that take
    /// destinations. Source==destination pairs are pruned up front; they are
    /// no-ops for every policy and should not count toward progress totals.
    pub fn new(
        kind: OpKind,
        sources: Vec<PathBuf>,
        destinations: Vec<PathBuf>,
        overwrite: OverwritePolicy,
    ) -> Result<Self, RequestError> {
        if kind.takes_destinations() && sources.len() != destinations.len() {
            return Err(RequestError::LengthMismatch {
                sources: sources.len(),
                destinations: destinations.len(),
            });
        }

        let mut request = Self {
            kind,
            sources: sources.iter().map(|p| absolutize(p)).collect(),
            destinations: destinations.iter().map(|p| absolutize(p)).collect(),
            overwrite,
        };
        request.prune_self_pairs();
        Ok(request)
    }

    /// Remove the listed paths (recursively for directories).
    pub fn remove(paths: Vec<PathBuf>) -> Result<Self, RequestError> {
        Self::new(OpKind::Remove, paths, Vec::new(), OverwritePolicy::Always)
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn overwrite(&self) -> OverwritePolicy {
        self.overwrite
    }

    /// Replace the overwrite policy (used after prompting the user).
    pub fn with_overwrite(mut self, overwrite: OverwritePolicy) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Destination paths that already exist on disk right now.
    ///
    /// This is the query a prompting caller uses to decide between Never and
    /// Always before starting the run.
    pub fn existing_destinations(&self) -> Vec<PathBuf> {
        self.destinations
            .iter()
            .filter(|p| p.exists())
            .cloned()
            .collect()
    }

    /// Drop pairs whose destination equals their source.
    fn prune_self_pairs(&mut self) {
        if !self.kind.takes_destinations() {
            return;
        }
        let keep: Vec<bool> = self
            .sources
            .iter()
            .zip(self.destinations.iter())
            .map(|(old, new)| old != new)
            .collect();
        let mut it = keep.iter();
        self.sources.retain(|_| *it.next().unwrap_or(&true));
        let mut it = keep.iter();
        self.destinations.retain(|_| *it.next().unwrap_or(&true));
    }
}

/// Normalize a path to absolute form without requiring it to exist.
///
/// Existing paths are canonicalized (dunce avoids UNC-style results on
/// Windows). Destinations usually do not exist yet, so their parent is
/// resolved instead; that keeps both sides of a pair normalizing the same
/// way, which the lexical move-into-self check depends on.
fn absolutize(path: &Path) -> PathBuf {
    if let Ok(real) = dunce::canonicalize(path) {
        return real;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(real_parent) = dunce::canonicalize(parent)
    {
        return real_parent.join(name);
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
