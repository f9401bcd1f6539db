//! Core library for `fileherd`.
//!
//! A batch file-operation engine: recursive remove, copy, restore, and move
//! over parallel source/destination lists, with deterministic collision
//! resolution, cross-device move fallback, per-step progress, and cooperative
//! cancellation. The engine runs one request per background thread and
//! reports partial failure as data rather than aborting.
//!
//! The CLI layers (config, logging, colored output) live alongside the engine
//! so the binary stays a thin shell.

pub mod app;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod output;
pub mod platform;

pub use config::{Config, LogLevel, default_config_path, default_log_path};
pub use engine::{
    DirOrder, OpEvent, OpHandle, OpKind, OperationRequest, OverwritePolicy, Progress, Report,
    StopFlag, run, spawn, subtree,
};
pub use errors::{RequestError, StructuralError};
