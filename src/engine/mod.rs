//! Background file-operation engine.
//!
//! One [`OperationRequest`] is immutable input to exactly one run: the run
//! expands the request into primitive steps, executes them on a single
//! dedicated thread, and reaches a terminal state once, reporting the paths
//! that failed. There is no shared engine state between runs; the only thing
//! crossing the thread boundary is the caller-owned [`StopFlag`] and the
//! event channel.
//!
//! Two entry points:
//! - [`run`] executes synchronously on the calling thread and pushes progress
//!   into a callback. Tests and embedders that already own a thread use this.
//! - [`spawn`] runs on a background thread and delivers [`OpEvent`]s over a
//!   channel; events arrive on the worker's schedule, so callers marshal them
//!   to their own context as needed.

mod collide;
mod device;
mod events;
mod request;
mod walk;
mod worker;

pub use collide::next_free_name;
pub use device::{DeviceId, device_of};
pub use events::{OpEvent, Progress, Report, StopFlag};
pub use request::{OpKind, OperationRequest, OverwritePolicy};
pub use walk::{DirOrder, subtree};

use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use crate::errors::RequestError;

/// Gate shared by both entry points: an Auto policy is only allowed through
/// when nothing collides; otherwise the caller must prompt and resupply a
/// concrete policy first (see [`OperationRequest::existing_destinations`]).
fn check_policy(request: &OperationRequest) -> Result<(), RequestError> {
    if request.overwrite() == OverwritePolicy::Auto {
        let existing = request.existing_destinations();
        if !existing.is_empty() {
            return Err(RequestError::OverwriteUnresolved { existing });
        }
    }
    Ok(())
}

/// Run the request to completion on the calling thread.
///
/// `on_progress` fires once per primitive step, strictly before the step
/// executes. The returned [`Report`] is the terminal result; whether the run
/// completed or was stopped early is the caller's knowledge (it owns the
/// flag).
pub fn run(
    request: &OperationRequest,
    stop: &StopFlag,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<Report, RequestError> {
    check_policy(request)?;
    Ok(worker::execute(request, stop, on_progress))
}

/// A run executing on its own background thread.
pub struct OpHandle {
    stop: StopFlag,
    events: Receiver<OpEvent>,
    thread: JoinHandle<()>,
}

impl OpHandle {
    /// Request a cooperative stop; honored at the next step boundary.
    pub fn request_stop(&self) {
        self.stop.request();
    }

    /// Another handle to this run's stop flag (e.g. for a signal handler).
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// The event stream; ends after the `Finished` event.
    pub fn events(&self) -> &Receiver<OpEvent> {
        &self.events
    }

    /// Drain remaining events and join the worker thread.
    pub fn wait(self) -> Report {
        let mut report = Report::default();
        for event in self.events.iter() {
            if let OpEvent::Finished(r) = event {
                report = r;
            }
        }
        let _ = self.thread.join();
        report
    }
}

/// Start the request on a dedicated background thread.
///
/// Rejected synchronously (no thread started, no filesystem mutation) when
/// the overwrite policy is unresolved. The terminal `Finished` event is
/// always delivered, for completed and stopped runs alike.
pub fn spawn(request: OperationRequest, stop: StopFlag) -> Result<OpHandle, RequestError> {
    check_policy(&request)?;

    let (tx, rx) = mpsc::channel();
    let worker_stop = stop.clone();
    let thread = thread::Builder::new()
        .name("fileherd-worker".into())
        .spawn(move || {
            let mut forward = |p: Progress| {
                let _ = tx.send(OpEvent::Starting(p));
            };
            let report = worker::execute(&request, &worker_stop, &mut forward);
            let _ = tx.send(OpEvent::Finished(report));
        })?;

    Ok(OpHandle {
        stop,
        events: rx,
        thread,
    })
}
