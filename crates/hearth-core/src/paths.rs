//! Platform paths.
//!
//! Everything lives under `<config_dir>/hearth`:
//!
//! ```text
//! hearth/
//!   settings.json   global settings (optional)
//!   config.json     profile state written by the CLI
//!   data/           storage root handed to the server
//!   logs/
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding the data directory.
pub const DATA_PATH_ENV: &str = "HEARTH_DATA_PATH";

const APP_DIR: &str = "hearth";

/// Root working directory.
pub fn work_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or(Error::NoPlatformDir("config"))
}

/// Storage root passed to the server, honouring `HEARTH_DATA_PATH`.
pub fn data_dir() -> Result<PathBuf> {
    resolve_data_dir(std::env::var(DATA_PATH_ENV).ok(), &work_dir()?)
}

pub fn logs_dir() -> Result<PathBuf> {
    Ok(work_dir()?.join("logs"))
}

/// Profile state file (`config.json`).
pub fn profile_path() -> Result<PathBuf> {
    Ok(work_dir()?.join("config.json"))
}

/// Global settings file (`settings.json`).
pub fn settings_path() -> Result<PathBuf> {
    Ok(work_dir()?.join("settings.json"))
}

fn resolve_data_dir(env_override: Option<String>, work_dir: &Path) -> Result<PathBuf> {
    match env_override {
        Some(p) if !p.trim().is_empty() => Ok(PathBuf::from(p)),
        _ => Ok(work_dir.join("data")),
    }
}
