//! Event surface shared between a worker run and its caller.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way "stop" flag.
//! - The flag is polled at step boundaries, never delivered as an interrupt;
//!   a large file copy in flight is not cut short.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::StructuralError;

/// Cooperative stop flag for one operation run.
///
/// Constructed by the caller and handed to the engine; cloning yields another
/// handle to the same flag, so a signal handler and the worker can share it.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative stop (idempotent).
    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether a stop has been requested.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Emitted once per primitive step, strictly before the step executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the step about to run.
    pub index: usize,
    /// Total number of steps in the expanded work list.
    pub total: usize,
    /// Path being operated on.
    pub old: PathBuf,
    /// Destination path; `None` for removals.
    pub new: Option<PathBuf>,
}

/// Terminal result of one run; delivered exactly once.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Old-paths of primitive steps that failed, in encounter order.
    pub failed: Vec<PathBuf>,
    /// Set when the request was structurally impossible; implies zero
    /// filesystem mutations were performed.
    pub rejected: Option<StructuralError>,
}

impl Report {
    /// True when every step succeeded and nothing was rejected.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_none()
    }

    pub(crate) fn rejected(err: StructuralError) -> Self {
        Self {
            failed: Vec::new(),
            rejected: Some(err),
        }
    }
}

/// Events delivered to the caller of [`spawn`](crate::engine::spawn).
///
/// `Starting` carries per-step progress; `Finished` is the terminal report
/// and is always the last event of a run, whether it completed or was
/// stopped early.
#[derive(Debug, Clone)]
pub enum OpEvent {
    Starting(Progress),
    Finished(Report),
}
