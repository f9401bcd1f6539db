//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - cp/mv/restore take N+1 positional paths; the last one is the
//!   destination, coreutils-style.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use crate::config::LogLevel;
use crate::engine::OverwritePolicy;

/// CLI wrapper for the fileherd engine.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Batch file operations: remove, copy, move, restore with progress and cancellation"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// What to do when a destination already exists.
    #[arg(
        long,
        global = true,
        value_enum,
        help = "Overwrite policy: auto (prompt), never (rename), always (replace)"
    )]
    pub overwrite: Option<OverwriteArg>,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, global = true, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        global = true,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, global = true, help = "Emit logs in structured JSON")]
    pub json: bool,

    /// Suppress per-step progress lines (the final summary still prints).
    #[arg(short, long, global = true, help = "Suppress per-step progress lines")]
    pub quiet: bool,

    /// Print where fileherd will look for the config file (or FILEHERD_CONFIG if set), then exit.
    #[arg(
        long,
        global = true,
        help = "Print the config file location used by fileherd and exit"
    )]
    pub print_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Remove files and directories (directories recursively).
    #[command(name = "rm")]
    Remove {
        #[arg(required = true, value_name = "PATH", value_hint = ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },

    /// Copy files/directories; the last path is the destination.
    #[command(name = "cp")]
    Copy {
        #[arg(required = true, num_args = 2.., value_name = "PATH", value_hint = ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },

    /// Move files/directories; the last path is the destination.
    #[command(name = "mv")]
    Move {
        #[arg(required = true, num_args = 2.., value_name = "PATH", value_hint = ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },

    /// Restore previously displaced files; the last path is the destination.
    #[command(name = "restore")]
    Restore {
        #[arg(required = true, num_args = 2.., value_name = "PATH", value_hint = ValueHint::AnyPath)]
        paths: Vec<PathBuf>,
    },
}

/// clap-facing mirror of [`OverwritePolicy`].
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteArg {
    Auto,
    Never,
    Always,
}

impl From<OverwriteArg> for OverwritePolicy {
    fn from(arg: OverwriteArg) -> Self {
        match arg {
            OverwriteArg::Auto => OverwritePolicy::Auto,
            OverwriteArg::Never => OverwritePolicy::Never,
            OverwriteArg::Always => OverwritePolicy::Always,
        }
    }
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Overwrite policy from the flag, if given.
    pub fn overwrite_policy(&self) -> Option<OverwritePolicy> {
        self.overwrite.map(OverwritePolicy::from)
    }
}

pub fn parse() -> Args {
    Args::parse()
}
