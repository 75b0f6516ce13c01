//! Credential and profile storage seams.
//!
//! The orchestrator only needs get/set/delete of two secrets plus a couple of
//! profile fields. [`crate::config::ConfigManager`] implements both traits on
//! top of the profile file; [`MemoryStore`] keeps everything in memory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::ProfileConfig;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretKind {
    SessionToken,
    AccountKey,
}

impl SecretKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SessionToken => "session token",
            Self::AccountKey => "account key",
        }
    }
}

/// Where a secret ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretBackend {
    /// Process memory; gone on exit.
    Memory,
    /// Plain-text profile file.
    File,
}

impl std::fmt::Display for SecretBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::File => "config file",
        })
    }
}

pub trait CredentialStore: Send + Sync {
    fn get(&self, kind: SecretKind) -> Result<Option<(String, SecretBackend)>, ClientError>;

    /// Store `value`; returns the backend that accepted it.
    fn set(&self, kind: SecretKind, value: &str) -> Result<SecretBackend, ClientError>;

    /// Remove the secret. Deleting a missing secret is not an error.
    fn delete(&self, kind: SecretKind) -> Result<(), ClientError>;
}

pub trait ProfileStore: Send + Sync {
    fn account_id(&self) -> Option<String>;

    fn tech_space_id(&self) -> Option<String>;

    fn set_account_id(&self, id: &str) -> Result<(), ClientError>;

    fn set_tech_space_id(&self, id: &str) -> Result<(), ClientError>;

    /// Forget all profile state.
    fn clear(&self) -> Result<(), ClientError>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug)]
pub struct MemoryStore {
    secrets: Mutex<HashMap<SecretKind, String>>,
    profile: Mutex<ProfileConfig>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            secrets: Mutex::new(HashMap::new()),
            profile: Mutex::new(ProfileConfig::default()),
        }
    }

    fn secrets(&self) -> MutexGuard<'_, HashMap<SecretKind, String>> {
        self.secrets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn profile(&self) -> MutexGuard<'_, ProfileConfig> {
        self.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ProfileConfig {
        self.profile().clone()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, kind: SecretKind) -> Result<Option<(String, SecretBackend)>, ClientError> {
        Ok(self
            .secrets()
            .get(&kind)
            .map(|v| (v.clone(), SecretBackend::Memory)))
    }

    fn set(&self, kind: SecretKind, value: &str) -> Result<SecretBackend, ClientError> {
        self.secrets().insert(kind, value.to_string());
        Ok(SecretBackend::Memory)
    }

    fn delete(&self, kind: SecretKind) -> Result<(), ClientError> {
        self.secrets().remove(&kind);
        Ok(())
    }
}

impl ProfileStore for MemoryStore {
    fn account_id(&self) -> Option<String> {
        self.profile().account_id.clone()
    }

    fn tech_space_id(&self) -> Option<String> {
        self.profile().tech_space_id.clone()
    }

    fn set_account_id(&self, id: &str) -> Result<(), ClientError> {
        self.profile().account_id = Some(id.to_string());
        Ok(())
    }

    fn set_tech_space_id(&self, id: &str) -> Result<(), ClientError> {
        self.profile().tech_space_id = Some(id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.profile() = ProfileConfig::default();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_secrets() {
        let store = MemoryStore::default();
        assert!(store.get(SecretKind::SessionToken).unwrap().is_none());

        let backend = store.set(SecretKind::SessionToken, "tok").unwrap();
        assert_eq!(backend, SecretBackend::Memory);
        assert_eq!(
            store.get(SecretKind::SessionToken).unwrap(),
            Some(("tok".to_string(), SecretBackend::Memory))
        );
        assert!(store.get(SecretKind::AccountKey).unwrap().is_none());

        store.delete(SecretKind::SessionToken).unwrap();
        store.delete(SecretKind::SessionToken).unwrap();
        assert!(store.get(SecretKind::SessionToken).unwrap().is_none());
    }

    #[test]
    fn memory_store_profile_clear() {
        let store = MemoryStore::new();
        store.set_account_id("acc").unwrap();
        store.set_tech_space_id("tech").unwrap();
        assert_eq!(store.account_id().as_deref(), Some("acc"));

        store.clear().unwrap();
        assert!(store.account_id().is_none());
        assert!(store.tech_space_id().is_none());
    }
}
