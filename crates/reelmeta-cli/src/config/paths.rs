//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

const APP_DIR: &str = "reelmeta";
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path.
///
/// In order: `{dir}/config.toml`, `$XDG_CONFIG_HOME/reelmeta/config.toml`,
/// `~/.config/reelmeta/config.toml`.
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    resolve_from(
        dir.map(PathBuf::as_path),
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn resolve_from(dir: Option<&Path>, xdg: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir.join(CONFIG_FILE));
    }
    // An empty or relative XDG_CONFIG_HOME is ignored.
    if let Some(xdg) = xdg.filter(|p| p.is_absolute()) {
        return Ok(xdg.join(APP_DIR).join(CONFIG_FILE));
    }
    match home {
        Some(home) => Ok(home.join(".config").join(APP_DIR).join(CONFIG_FILE)),
        None => bail!("cannot locate the config directory: neither XDG_CONFIG_HOME nor HOME is set"),
    }
}
