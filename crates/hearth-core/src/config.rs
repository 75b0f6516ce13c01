//! Settings resolution for Hearth.
//!
//! Implements layered resolution:
//! 1. Built-in defaults
//! 2. Global settings (`<config_dir>/hearth/settings.json`)
//! 3. Environment variables (`HEARTH_*`)
//! 4. CLI arguments (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_GRPC_ADDRESS: &str = "127.0.0.1:31007";
pub const DEFAULT_GRPC_WEB_ADDRESS: &str = "127.0.0.1:31008";
pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:31009";

/// Complete Hearth settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub timeouts: TimeoutSettings,
    #[serde(default)]
    pub auto_login: AutoLoginSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            timeouts: TimeoutSettings::default(),
            auto_login: AutoLoginSettings::default(),
            log_level: default_log_level(),
        }
    }
}

/// Where the server listens and how to start it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    pub grpc_address: String,
    pub grpc_web_address: String,
    /// JSON API listen address handed to the server on account select.
    pub api_address: String,
    /// Server binary; `None` means look up `hearth-server` on `PATH`.
    pub binary: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            grpc_address: DEFAULT_GRPC_ADDRESS.to_string(),
            grpc_web_address: DEFAULT_GRPC_WEB_ADDRESS.to_string(),
            api_address: DEFAULT_API_ADDRESS.to_string(),
            binary: None,
        }
    }
}

impl ServerSettings {
    /// gRPC endpoint URI for the client.
    pub fn grpc_url(&self) -> String {
        if self.grpc_address.contains("://") {
            self.grpc_address.clone()
        } else {
            format!("http://{}", self.grpc_address)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Per-call RPC timeout (seconds).
    pub rpc_secs: u64,
    /// How long an interactive login waits for the account event (seconds).
    pub account_wait_secs: u64,
    /// Same, for unattended flows.
    pub batch_account_wait_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            rpc_secs: 5,
            account_wait_secs: 10,
            batch_account_wait_secs: 30,
        }
    }
}

impl TimeoutSettings {
    pub const fn rpc(&self) -> Duration {
        Duration::from_secs(self.rpc_secs)
    }

    pub const fn account_wait(&self) -> Duration {
        Duration::from_secs(self.account_wait_secs)
    }

    pub const fn batch_account_wait(&self) -> Duration {
        Duration::from_secs(self.batch_account_wait_secs)
    }
}

/// Unattended login performed by `hearth serve`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutoLoginSettings {
    pub enabled: bool,
    pub max_attempts: u32,
    pub delay_ms: u64,
    /// Grace period after starting the server before the first attempt.
    pub startup_delay_ms: u64,
}

impl Default for AutoLoginSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            delay_ms: 2000,
            startup_delay_ms: 2000,
        }
    }
}

/// Load settings: defaults, then the global file, then `HEARTH_*` env vars.
pub fn load_settings() -> Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(path) = crate::paths::settings_path() {
        if path.exists() {
            let global = load_settings_file(&path)?;
            merge_settings(&mut settings, global);
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    Ok(settings)
}

pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read settings file {}: {}",
            path.display(),
            e
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse settings file {}: {}",
            path.display(),
            e
        ))
    })
}

fn merge_settings(base: &mut Settings, overlay: Settings) {
    if overlay.server.binary.is_some() {
        base.server.binary = overlay.server.binary;
    }
    base.server.grpc_address = overlay.server.grpc_address;
    base.server.grpc_web_address = overlay.server.grpc_web_address;
    base.server.api_address = overlay.server.api_address;

    base.timeouts = overlay.timeouts;
    base.auto_login = overlay.auto_login;
    base.log_level = overlay.log_level;
}

/// Apply `HEARTH_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("HEARTH_GRPC_ADDR") {
        settings.server.grpc_address = val;
    }
    if let Some(val) = lookup("HEARTH_GRPC_WEB_ADDR") {
        settings.server.grpc_web_address = val;
    }
    if let Some(val) = lookup("HEARTH_API_ADDR") {
        settings.server.api_address = val;
    }
    if let Some(val) = lookup("HEARTH_SERVER_BIN") {
        settings.server.binary = Some(PathBuf::from(val));
    }
    if let Some(n) = lookup("HEARTH_RPC_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.timeouts.rpc_secs = n;
    }
    if let Some(n) = lookup("HEARTH_AUTO_LOGIN_ATTEMPTS").and_then(|v| v.parse().ok()) {
        settings.auto_login.max_attempts = n;
    }
    if let Some(val) = lookup("HEARTH_LOG_LEVEL") {
        settings.log_level = val;
    }
}
