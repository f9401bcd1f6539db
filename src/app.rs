//! Application orchestrator.
//! Loads config, initializes logging, installs the signal handler, resolves
//! the overwrite policy (prompting when it is still Auto and destinations
//! collide), runs the engine, and renders progress plus the terminal summary.

use anyhow::{Context, Result, anyhow, bail};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::cli::{Args, Command};
use crate::config;
use crate::engine::{
    self, OpEvent, OpKind, OperationRequest, OverwritePolicy, Progress, Report, StopFlag,
};
use crate::logging::init_tracing;
use crate::output as out;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        if let Ok(cfg_env) = std::env::var("FILEHERD_CONFIG") {
            out::print_info(&format!(
                "Using FILEHERD_CONFIG (explicit):\n  {}\n",
                cfg_env
            ));
            out::print_info("To override, unset FILEHERD_CONFIG or set it to another file.");
            return Ok(());
        }
        match config::default_config_path() {
            Some(p) => {
                out::print_info(&format!(
                    "Default fileherd config path:\n  {}\n",
                    p.display()
                ));
                if p.exists() {
                    out::print_info("A config file already exists at that location.");
                } else {
                    out::print_info(
                        "No config file exists there yet; one is created on first run.",
                    );
                }
            }
            None => out::print_error("Could not determine a default config path."),
        }
        return Ok(());
    }

    // First run: drop a commented template so users can find the knobs.
    // The engine does not need it, so we keep going either way.
    if let Some(path) = config::ensure_default_config_exists() {
        out::print_info(&format!(
            "A template fileherd config was written to: {}",
            path.display()
        ));
    }

    let mut cfg = config::load_config()?;
    if let Some(level) = args.effective_log_level() {
        cfg.log_level = level;
    }

    // Initialize logging and capture the guard so we can drop it on signal
    let guard_opt: Option<tracing_appender::non_blocking::WorkerGuard> =
        init_tracing(&cfg.log_level, cfg.log_file.as_deref(), args.json).map_err(|e| {
            out::print_error(&format!("Failed to initialize logging: {}", e));
            e
        })?;
    let guard_slot = Arc::new(Mutex::new(guard_opt));

    let Some(command) = args.command.clone() else {
        bail!("no command given; run with --help for usage");
    };

    // The stop flag is owned here and shared with the signal handler and the
    // worker; the engine itself keeps no global state.
    let stop = StopFlag::new();
    {
        let stop = stop.clone();
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            stop.request();
            out::print_warn("Received interrupt; finishing the current step, then stopping...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take(); // drop guard here to flush tracing_appender
            }
        })
        .context("install signal handler")?;
    }

    debug!("Starting fileherd: {:?}", args);

    let result = run_operation(&command, &args, &cfg, &stop);

    // Ensure logs are flushed before exit
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}

fn run_operation(
    command: &Command,
    args: &Args,
    cfg: &config::Config,
    stop: &StopFlag,
) -> Result<()> {
    let policy = args.overwrite_policy().unwrap_or(cfg.overwrite);
    let (kind, sources, destinations) = plan(command)?;
    let mut request = OperationRequest::new(kind, sources, destinations, policy)?;

    // Auto means "ask": list what collides and let the user pick a concrete
    // policy before any background work starts.
    if request.overwrite() == OverwritePolicy::Auto {
        let existing = request.existing_destinations();
        if !existing.is_empty() {
            match prompt_overwrite(&existing)? {
                Some(resolved) => request = request.with_overwrite(resolved),
                None => {
                    out::print_info("Cancelled; nothing was changed.");
                    return Ok(());
                }
            }
        }
    }

    let handle = engine::spawn(request, stop.clone())?;
    info!(kind = kind.verb(), "operation started");

    let mut report = Report::default();
    for event in handle.events().iter() {
        match event {
            OpEvent::Starting(p) => {
                if !args.quiet {
                    out::print_user(&progress_line(kind, &p));
                }
            }
            OpEvent::Finished(r) => report = r,
        }
    }
    let _ = handle.wait();

    render_summary(kind, &report, stop)
}

/// Turn a subcommand into the engine's parallel path lists.
fn plan(command: &Command) -> Result<(OpKind, Vec<PathBuf>, Vec<PathBuf>)> {
    match command {
        Command::Remove { paths } => Ok((OpKind::Remove, paths.clone(), Vec::new())),
        Command::Copy { paths } => pair_up(OpKind::Copy, paths),
        Command::Move { paths } => pair_up(OpKind::Move, paths),
        Command::Restore { paths } => pair_up(OpKind::Restore, paths),
    }
}

/// coreutils-style destination handling: the last path is the target. A
/// single source with a non-directory target is a literal rename pair;
/// otherwise the target must be an existing directory and each source lands
/// under it by file name.
fn pair_up(kind: OpKind, paths: &[PathBuf]) -> Result<(OpKind, Vec<PathBuf>, Vec<PathBuf>)> {
    let (dest, sources) = paths
        .split_last()
        .ok_or_else(|| anyhow!("need at least one source and a destination"))?;
    let sources: Vec<PathBuf> = sources.to_vec();

    if sources.len() == 1 && !dest.is_dir() {
        return Ok((kind, sources, vec![dest.clone()]));
    }
    if !dest.is_dir() {
        bail!("destination '{}' is not a directory", dest.display());
    }

    let mut destinations = Vec::with_capacity(sources.len());
    for src in &sources {
        let name = src
            .file_name()
            .ok_or_else(|| anyhow!("source has no file name: {}", src.display()))?;
        destinations.push(dest.join(name));
    }
    Ok((kind, sources, destinations))
}

/// Ask whether existing destinations should be overwritten. Returns None on
/// cancel. Non-interactive runs default to keeping both copies (rename),
/// matching the prompt's default answer.
fn prompt_overwrite(existing: &[PathBuf]) -> Result<Option<OverwritePolicy>> {
    let names: Vec<String> = existing.iter().map(|p| file_label(p)).collect();

    if !atty::is(atty::Stream::Stdin) {
        out::print_warn(&format!(
            "Destinations already exist ({}); keeping both copies under renamed paths.",
            names.join(", ")
        ));
        return Ok(Some(OverwritePolicy::Never));
    }

    out::print_user("These files already exist:");
    for name in &names {
        out::print_user(&format!("  {}", name));
    }
    out::print_user("Overwrite them? [y = overwrite all / N = keep both (rename) / c = cancel]");

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read overwrite answer")?;
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(Some(OverwritePolicy::Always)),
        "c" | "cancel" => Ok(None),
        _ => Ok(Some(OverwritePolicy::Never)),
    }
}

/// "Removing: a" / "Copying: a to b" / "Restoring: a as b" / "Moving: a to b"
fn progress_line(kind: OpKind, p: &Progress) -> String {
    let old = file_label(&p.old);
    let prefix = format!("[{}/{}] {}", p.index, p.total, kind.progress_label());
    match (kind, p.new.as_deref()) {
        (OpKind::Restore, Some(new)) => format!("{}: {} as {}", prefix, old, file_label(new)),
        (_, Some(new)) => format!("{}: {} to {}", prefix, old, file_label(new)),
        (_, None) => format!("{}: {}", prefix, old),
    }
}

/// Final path component for display, falling back to the whole path.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn render_summary(kind: OpKind, report: &Report, stop: &StopFlag) -> Result<()> {
    if let Some(err) = &report.rejected {
        out::print_error(&err.title);
        out::print_user(&err.message);
        bail!("{}", err.title);
    }
    if !report.failed.is_empty() {
        out::print_error(&format!("Could not {} these files:", kind.verb()));
        for p in &report.failed {
            out::print_user(&format!("  {}", p.display()));
        }
        bail!("{} item(s) failed", report.failed.len());
    }
    if stop.is_requested() {
        out::print_warn("Stopped; remaining items were not processed.");
    } else {
        out::print_success("All operations completed.");
    }
    Ok(())
}
