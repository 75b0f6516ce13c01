//! CLI profile management.
//!
//! Persists the active account id, tech space id and, when no OS keychain is
//! available, the account key and session token to `<config_dir>/hearth/config.json`.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::{CredentialStore, ProfileStore, SecretBackend, SecretKind};
use crate::error::ClientError;

/// Persistent profile state.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_space_id: Option<String>,
    /// Plain-text fallback; only used when the keychain is unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl ProfileConfig {
    /// Keys exposed through `hearth config get/set`.
    pub const KEYS: [&'static str; 2] = ["accountId", "techSpaceId"];

    /// Value of a user-facing key, `None` if the key is unknown.
    pub fn get_key(&self, key: &str) -> Option<Option<&str>> {
        match key {
            "accountId" => Some(self.account_id.as_deref()),
            "techSpaceId" => Some(self.tech_space_id.as_deref()),
            _ => None,
        }
    }

    /// Set a user-facing key. Returns `false` if the key is unknown.
    pub fn set_key(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "accountId" => &mut self.account_id,
            "techSpaceId" => &mut self.tech_space_id,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    fn secret_mut(&mut self, kind: SecretKind) -> &mut Option<String> {
        match kind {
            SecretKind::SessionToken => &mut self.session_token,
            SecretKind::AccountKey => &mut self.account_key,
        }
    }

    const fn secret(&self, kind: SecretKind) -> Option<&String> {
        match kind {
            SecretKind::SessionToken => self.session_token.as_ref(),
            SecretKind::AccountKey => self.account_key.as_ref(),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.account_id.is_none()
            && self.tech_space_id.is_none()
            && self.account_key.is_none()
            && self.session_token.is_none()
    }
}

/// File-backed profile, shared across the process.
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    state: RwLock<ProfileConfig>,
}

impl ConfigManager {
    /// Load the profile at `path`. A missing file yields an empty profile.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                ClientError::Storage(format!(
                    "Failed to parse config file {}: {e}",
                    path.display()
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ProfileConfig::default(),
            Err(e) => {
                return Err(ClientError::Storage(format!(
                    "Failed to read config file {}: {e}",
                    path.display()
                )));
            }
        };
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Load the profile from the platform default location.
    pub fn open_default() -> Result<Self, ClientError> {
        Self::load(hearth_core::paths::profile_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current profile.
    pub fn snapshot(&self) -> ProfileConfig {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` and persist the result.
    pub fn update<F>(&self, f: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut ProfileConfig),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
        save(&self.path, &state)
    }

    /// Clear all fields and persist an empty profile.
    pub fn reset(&self) -> Result<(), ClientError> {
        self.update(|c| *c = ProfileConfig::default())
    }

    /// Clear all fields and remove the file.
    pub fn delete_file(&self) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = ProfileConfig::default();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage(format!(
                "Failed to delete config file {}: {e}",
                self.path.display()
            ))),
        }
    }
}

fn save(path: &Path, config: &ProfileConfig) -> Result<(), ClientError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(ClientError::storage)?;
    }
    let json = serde_json::to_string_pretty(config).map_err(ClientError::storage)?;
    std::fs::write(path, json).map_err(ClientError::storage)?;

    // Secrets may live here, keep it private
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(ClientError::storage)?;
    }

    debug!(path = %path.display(), "Saved profile");
    Ok(())
}

impl CredentialStore for ConfigManager {
    fn get(&self, kind: SecretKind) -> Result<Option<(String, SecretBackend)>, ClientError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .secret(kind)
            .filter(|v| !v.is_empty())
            .map(|v| (v.clone(), SecretBackend::File)))
    }

    fn set(&self, kind: SecretKind, value: &str) -> Result<SecretBackend, ClientError> {
        self.update(|c| *c.secret_mut(kind) = Some(value.to_string()))?;
        Ok(SecretBackend::File)
    }

    fn delete(&self, kind: SecretKind) -> Result<(), ClientError> {
        if CredentialStore::get(self, kind)?.is_none() {
            return Ok(());
        }
        self.update(|c| *c.secret_mut(kind) = None)
    }
}

impl ProfileStore for ConfigManager {
    fn account_id(&self) -> Option<String> {
        self.snapshot().account_id
    }

    fn tech_space_id(&self) -> Option<String> {
        self.snapshot().tech_space_id
    }

    fn set_account_id(&self, id: &str) -> Result<(), ClientError> {
        self.update(|c| c.account_id = Some(id.to_string()))
    }

    fn set_tech_space_id(&self, id: &str) -> Result<(), ClientError> {
        self.update(|c| c.tech_space_id = Some(id.to_string()))
    }

    /// Drop profile fields; remove the file once nothing is left in it.
    fn clear(&self) -> Result<(), ClientError> {
        self.update(|c| {
            c.account_id = None;
            c.tech_space_id = None;
        })?;
        if self.snapshot().is_empty() {
            self.delete_file()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn manager() -> (tempfile::TempDir, ConfigManager) {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ConfigManager::load(dir.path().join("hearth").join("config.json")).unwrap();
        (dir, mgr)
    }

    #[test]
    fn missing_file_is_empty_profile() {
        let (_dir, mgr) = manager();
        assert!(mgr.snapshot().is_empty());
        assert!(!mgr.path().exists());
    }

    #[test]
    fn profile_persists_across_loads() {
        let (_dir, mgr) = manager();
        mgr.set_account_id("acc-1").unwrap();
        mgr.set_tech_space_id("tech-1").unwrap();

        let reloaded = ConfigManager::load(mgr.path()).unwrap();
        assert_eq!(reloaded.account_id().as_deref(), Some("acc-1"));
        assert_eq!(reloaded.tech_space_id().as_deref(), Some("tech-1"));
    }

    #[test]
    fn json_uses_camel_case_and_omits_empty_fields() {
        let (_dir, mgr) = manager();
        mgr.set_account_id("acc-1").unwrap();
        let json = std::fs::read_to_string(mgr.path()).unwrap();
        assert!(json.contains("\"accountId\""), "{json}");
        assert!(!json.contains("sessionToken"), "{json}");
    }

    #[test]
    fn secrets_report_file_backend() {
        let (_dir, mgr) = manager();
        let backend = mgr.set(SecretKind::AccountKey, "key").unwrap();
        assert_eq!(backend, SecretBackend::File);
        assert_eq!(
            mgr.get(SecretKind::AccountKey).unwrap(),
            Some(("key".to_string(), SecretBackend::File))
        );
        mgr.delete(SecretKind::AccountKey).unwrap();
        assert!(mgr.get(SecretKind::AccountKey).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn profile_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, mgr) = manager();
        mgr.set(SecretKind::SessionToken, "tok").unwrap();
        let mode = std::fs::metadata(mgr.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_keeps_secrets_until_empty() {
        let (_dir, mgr) = manager();
        mgr.set(SecretKind::AccountKey, "key").unwrap();
        mgr.set_account_id("acc").unwrap();

        mgr.clear().unwrap();
        assert!(mgr.account_id().is_none());
        assert!(mgr.path().exists());

        mgr.delete(SecretKind::AccountKey).unwrap();
        mgr.clear().unwrap();
        assert!(!mgr.path().exists());
    }

    #[test]
    fn invalid_json_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        let err = ConfigManager::load(&path).unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
    }

    #[test]
    fn user_keys() {
        let mut cfg = ProfileConfig::default();
        assert!(cfg.set_key("accountId", "a"));
        assert!(!cfg.set_key("sessionToken", "t"));
        assert_eq!(cfg.get_key("accountId"), Some(Some("a")));
        assert_eq!(cfg.get_key("techSpaceId"), Some(None));
        assert_eq!(cfg.get_key("bogus"), None);
    }

    #[test]
    fn reset_and_delete() {
        let (_dir, mgr) = manager();
        mgr.set_account_id("acc").unwrap();
        mgr.reset().unwrap();
        assert!(mgr.snapshot().is_empty());
        assert!(mgr.path().exists());

        mgr.delete_file().unwrap();
        mgr.delete_file().unwrap();
        assert!(!mgr.path().exists());
    }
}
