//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - Creates a secure template if missing (unless FILEHERD_CONFIG is set).
//!
//! Notes:
//! - This module only reads/writes the config file; CLI flags override its
//!   values elsewhere.
//! - Unknown fields fail parsing (serde deny_unknown_fields) so typos
//!   surface instead of being silently ignored.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::OverwritePolicy;

use super::paths::{default_config_path, default_log_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use crate::platform::{set_dir_mode_0700, set_file_mode_0600, write_config_secure_new_0600};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    /// Default overwrite policy: auto | never | always
    #[serde(rename = "overwrite")]
    overwrite: Option<String>,
}

fn parse_overwrite(s: &str) -> Option<OverwritePolicy> {
    match s.trim().to_ascii_lowercase().as_str() {
        "auto" | "ask" => Some(OverwritePolicy::Auto),
        "never" | "rename" => Some(OverwritePolicy::Never),
        "always" | "overwrite" => Some(OverwritePolicy::Always),
        _ => None,
    }
}

// Map XmlConfig -> Config.
fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();

    if let Some(s) = parsed.log_level.as_deref()
        && let Some(level) = LogLevel::parse(s.trim())
    {
        cfg.log_level = level;
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    if let Some(s) = parsed.overwrite.as_deref()
        && let Some(policy) = parse_overwrite(s)
    {
        cfg.overwrite = policy;
    }

    cfg
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Load the effective config: FILEHERD_CONFIG if set, otherwise the platform
/// default path. A missing file yields defaults; a malformed file is an
/// error so misconfigurations do not pass silently.
pub fn load_config() -> Result<Config> {
    if let Some(p) = env::var_os("FILEHERD_CONFIG") {
        let path = PathBuf::from(p);
        if !path.exists() {
            debug!(path = %path.display(), "FILEHERD_CONFIG set but file missing; using defaults");
            return Ok(Config::default());
        }
        return load_config_from_xml_path(&path);
    }
    match default_config_path() {
        Some(path) if path.exists() => load_config_from_xml_path(&path),
        _ => Ok(Config::default()),
    }
}

/// Create default template config file and parent directory (best-effort permissions).
/// Uses secure creation to avoid following attacker-controlled symlinks on Unix.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow::anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
        let _ = set_dir_mode_0700(parent);
    }

    let suggested_log = default_log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "/path/to/fileherd.log".into());

    let content = format!(
        "<!--\n  fileherd configuration (XML)\n\n  Fields:\n    log_level -> quiet | normal | info | debug\n    log_file  -> path to log file (optional; stdout/stderr still used)\n    overwrite -> auto | never | always (default policy when --overwrite is absent)\n\n  Notes:\n    - CLI flags override XML values.\n    - \"auto\" prompts when a destination already exists; \"never\" renames the\n      new copy; \"always\" replaces the existing target.\n-->\n<config>\n  <log_level>normal</log_level>\n  <log_file>{}</log_file>\n  <overwrite>auto</overwrite>\n</config>\n",
        suggested_log
    );

    write_config_secure_new_0600(path, content.as_bytes())?;
    let _ = set_file_mode_0600(path);

    info!("Created template config at {}", path.display());
    Ok(())
}

/// Create default config if FILEHERD_CONFIG not set; return created path so
/// the CLI can inform the user.
pub fn ensure_default_config_exists() -> Option<PathBuf> {
    if env::var_os("FILEHERD_CONFIG").is_some() {
        return None;
    }

    let cfg_path = default_config_path()?;
    if cfg_path.exists() {
        return None;
    }

    if let Ok(true) = path_has_symlink_ancestor(&cfg_path) {
        eprintln!(
            "Refusing to create template config because an existing ancestor is a symlink: {}",
            cfg_path.display()
        );
        return None;
    }

    match create_template_config(&cfg_path) {
        Ok(()) => Some(cfg_path),
        Err(e) => {
            eprintln!(
                "Failed to create template config at {}: {}",
                cfg_path.display(),
                e
            );
            None
        }
    }
}
