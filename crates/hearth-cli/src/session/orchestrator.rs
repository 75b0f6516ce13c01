//! Login, account creation, logout and unattended recovery.
//!
//! Every flow runs its steps strictly in [`SessionStep`] order. The account id
//! produced by recovery only shows up on the push stream, so the stream is
//! always subscribed before recovery is triggered.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info, warn};

use hearth_core::Settings;
use hearth_proto::v1::Account;

use super::retry::{RetryPolicy, Sleeper};
use super::types::{NewCredential, RecoveryOutcome, Session, SessionStep};
use crate::credentials::{CredentialStore, ProfileStore, SecretKind};
use crate::error::ClientError;
use crate::events::EventHub;
use crate::gateway::{AccountPlacement, Gateway, InitialParameters};

/// Minimum decoded length of an account key.
const MIN_ACCOUNT_KEY_BYTES: usize = 32;

/// Keys with this many words are mnemonics, which are not accepted.
const MNEMONIC_WORDS: usize = 12;

/// Static inputs shared by every flow.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub params: InitialParameters,
    /// Default wallet/account storage root.
    pub storage_path: String,
    /// Default account API listen address.
    pub listen_address: String,
    /// Bound on waiting for the account event after recovery.
    pub account_wait: Duration,
}

impl OrchestratorConfig {
    /// Interactive defaults from the resolved settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let work_dir = hearth_core::paths::work_dir()?;
        let data_dir = hearth_core::paths::data_dir()?;
        Ok(Self {
            params: InitialParameters::for_client(&work_dir, &settings.log_level),
            storage_path: data_dir.to_string_lossy().into_owned(),
            listen_address: settings.server.api_address.clone(),
            account_wait: settings.timeouts.account_wait(),
        })
    }

    /// Same, with the longer account wait used by unattended flows.
    #[must_use]
    pub fn batch(mut self, settings: &Settings) -> Self {
        self.account_wait = settings.timeouts.batch_account_wait();
        self
    }
}

/// Reject obviously malformed account keys before any RPC is made.
pub fn validate_account_key(key: &str) -> Result<(), ClientError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ClientError::InvalidCredential("account key is empty".into()));
    }
    if key.split_whitespace().count() >= MNEMONIC_WORDS {
        return Err(ClientError::InvalidCredential(
            "mnemonic phrases are not supported, use the account key".into(),
        ));
    }
    let decoded = STANDARD
        .decode(key)
        .map_err(|_| ClientError::InvalidCredential("not valid base64".into()))?;
    if decoded.len() < MIN_ACCOUNT_KEY_BYTES {
        return Err(ClientError::InvalidCredential(format!(
            "decodes to {} bytes, expected at least {MIN_ACCOUNT_KEY_BYTES}",
            decoded.len()
        )));
    }
    Ok(())
}

/// Attach the failing step to `err`.
///
/// A server rejection before the stream is open is an authentication failure;
/// anything failing the final activation is a selection failure.
fn step_error(step: SessionStep, err: ClientError) -> ClientError {
    match err {
        ClientError::Remote { description, .. } if step.is_pre_stream() => {
            ClientError::Authentication {
                step,
                reason: description,
            }
        }
        e if step == SessionStep::AccountSelected => ClientError::Selection(e.to_string()),
        e => e.in_step(step),
    }
}

fn placement(storage_path: &str, listen_address: &str) -> AccountPlacement {
    AccountPlacement {
        storage_path: storage_path.to_string(),
        listen_address: listen_address.to_string(),
    }
}

/// Drives the login, creation and teardown state machines.
pub struct SessionOrchestrator {
    gateway: Arc<dyn Gateway>,
    events: Arc<EventHub>,
    credentials: Arc<dyn CredentialStore>,
    profile: Arc<dyn ProfileStore>,
    config: OrchestratorConfig,
}

impl std::fmt::Debug for SessionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionOrchestrator {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        events: Arc<EventHub>,
        credentials: Arc<dyn CredentialStore>,
        profile: Arc<dyn ProfileStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            events,
            credentials,
            profile,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    pub fn events(&self) -> &Arc<EventHub> {
        &self.events
    }

    /// Stored session token, or `NotLoggedIn`.
    pub fn stored_token(&self) -> Result<String, ClientError> {
        self.credentials
            .get(SecretKind::SessionToken)?
            .map(|(token, _)| token)
            .ok_or(ClientError::NotLoggedIn)
    }

    /// Interactive login with a user-supplied account key.
    ///
    /// On success the key is stored too; failing to store it is only a warning.
    pub async fn login(
        &self,
        account_key: &str,
        storage_path: Option<&str>,
        listen_address: Option<&str>,
    ) -> Result<Session, ClientError> {
        let account_key = account_key.trim();
        validate_account_key(account_key)?;
        let session = self
            .establish_session(account_key, storage_path, listen_address)
            .await?;
        self.store_account_key(account_key);
        Ok(session)
    }

    /// Run the recovery state machine with an existing account key.
    pub async fn establish_session(
        &self,
        account_key: &str,
        storage_path: Option<&str>,
        listen_address: Option<&str>,
    ) -> Result<Session, ClientError> {
        let storage = storage_path.unwrap_or(&self.config.storage_path);
        let listen = listen_address.unwrap_or(&self.config.listen_address);

        self.set_parameters().await?;

        debug!(step = %SessionStep::CredentialEstablished, "Recovering wallet");
        self.gateway
            .recover_wallet(storage, account_key)
            .await
            .map_err(|e| step_error(SessionStep::CredentialEstablished, e))?;

        let token = self.open_session(account_key).await?;

        debug!(step = %SessionStep::StreamSubscribed, "Subscribing to events");
        let stream = self
            .events
            .open(&token)
            .await
            .map_err(|e| step_error(SessionStep::StreamSubscribed, e))?;

        debug!(step = %SessionStep::RecoveryTriggered, "Triggering account recovery");
        self.gateway
            .recover_account(&token)
            .await
            .map_err(|e| step_error(SessionStep::RecoveryTriggered, e))?;

        debug!(
            step = %SessionStep::AccountIdentified,
            timeout = ?self.config.account_wait,
            "Waiting for account"
        );
        let account_id = stream
            .wait_for_account_id(self.config.account_wait)
            .await
            .map_err(|e| step_error(SessionStep::AccountIdentified, e))?;

        let account = self.select(&token, &account_id, storage, listen).await?;
        let session = Session {
            token,
            tech_space_id: account.tech_space_id().map(str::to_string),
            account_id,
        };
        self.persist(&session)?;
        info!(account_id = %session.account_id, "Session established");
        Ok(session)
    }

    /// Create a new wallet and account; the server generates the account key.
    pub async fn create_session(
        &self,
        name: &str,
        storage_path: Option<&str>,
        listen_address: Option<&str>,
    ) -> Result<(Session, NewCredential), ClientError> {
        let storage = storage_path.unwrap_or(&self.config.storage_path);
        let listen = listen_address.unwrap_or(&self.config.listen_address);

        self.set_parameters().await?;

        debug!(step = %SessionStep::CredentialEstablished, "Creating wallet");
        let account_key = self
            .gateway
            .create_wallet(storage)
            .await
            .map_err(|e| step_error(SessionStep::CredentialEstablished, e))?;

        let token = self.open_session(&account_key).await?;

        debug!(step = %SessionStep::StreamSubscribed, "Subscribing to events");
        self.events
            .open(&token)
            .await
            .map_err(|e| step_error(SessionStep::StreamSubscribed, e))?;

        debug!(step = %SessionStep::AccountCreated, name, "Creating account");
        let created = self
            .gateway
            .create_account(&token, name, &placement(storage, listen))
            .await
            .map_err(|e| step_error(SessionStep::AccountCreated, e))?;
        if created.id.is_empty() {
            return Err(step_error(
                SessionStep::AccountIdentified,
                ClientError::Remote {
                    code: 0,
                    description: "server returned an account without id".into(),
                },
            ));
        }

        let account = self.select(&token, &created.id, storage, listen).await?;
        let session = Session {
            token,
            tech_space_id: account
                .tech_space_id()
                .or_else(|| created.tech_space_id())
                .map(str::to_string),
            account_id: created.id,
        };
        self.persist(&session)?;
        self.store_account_key(&account_key);
        info!(account_id = %session.account_id, "Account created");
        Ok((session, NewCredential { account_key }))
    }

    /// Tear down the stored session. `NotLoggedIn` if there is none.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let token = self.stored_token()?;
        let session = Session {
            token,
            account_id: self.profile.account_id().unwrap_or_default(),
            tech_space_id: self.profile.tech_space_id(),
        };
        self.teardown_session(&session).await
    }

    /// Stop the account, close the session and forget local state.
    ///
    /// Remote failures are logged and do not stop local cleanup. Only the
    /// first local failure is returned.
    pub async fn teardown_session(&self, session: &Session) -> Result<(), ClientError> {
        if let Err(e) = self.gateway.stop_account(&session.token, false).await {
            warn!(error = %e, "Failed to stop account");
        }
        if let Err(e) = self.gateway.close_session(&session.token).await {
            warn!(error = %e, "Failed to close session");
        }
        self.events.close().await;

        let results = [
            self.credentials.delete(SecretKind::AccountKey),
            self.credentials.delete(SecretKind::SessionToken),
            self.profile.clear(),
        ];
        let mut first = None;
        for err in results.into_iter().filter_map(Result::err) {
            warn!(error = %err, "Local cleanup failed");
            first.get_or_insert(err);
        }
        match first {
            Some(err) => Err(err),
            None => {
                info!(account_id = %session.account_id, "Logged out");
                Ok(())
            }
        }
    }

    /// Unattended login, retried per `policy`. Never fails: the outcome
    /// says whether a session was recovered.
    pub async fn auto_recover(
        &self,
        account_key: Option<&str>,
        listen_address: Option<&str>,
        policy: &RetryPolicy,
        sleeper: &dyn Sleeper,
    ) -> RecoveryOutcome {
        let Some(account_key) = account_key.filter(|k| !k.trim().is_empty()) else {
            info!("No stored account key, skipping auto-login");
            return RecoveryOutcome::NoStoredCredential;
        };

        let attempts = policy.max_attempts.max(1);
        let mut last_error = None;
        for attempt in 0..attempts {
            match self
                .establish_session(account_key, None, listen_address)
                .await
            {
                Ok(session) => {
                    info!(attempt = attempt + 1, "Auto-login succeeded");
                    return RecoveryOutcome::Recovered(session);
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, max_attempts = attempts, error = %e, "Auto-login failed");
                    // A half-open stream would be reused by the next attempt
                    self.events.close().await;
                    last_error = Some(e);
                    if policy.should_retry(attempt + 1) {
                        sleeper.sleep(policy.delay_for_attempt(attempt)).await;
                    }
                }
            }
        }

        let last_error = last_error.unwrap_or(ClientError::Cancelled);
        warn!(attempts, error = %last_error, "Giving up auto-login");
        RecoveryOutcome::GaveUp {
            attempts,
            last_error,
        }
    }

    /// [`Self::auto_recover`] with the account key from the credential store.
    pub async fn auto_recover_stored(
        &self,
        listen_address: Option<&str>,
        policy: &RetryPolicy,
        sleeper: &dyn Sleeper,
    ) -> RecoveryOutcome {
        let key = match self.credentials.get(SecretKind::AccountKey) {
            Ok(found) => found.map(|(key, _)| key),
            Err(e) => {
                warn!(error = %e, "Failed to read stored account key");
                None
            }
        };
        self.auto_recover(key.as_deref(), listen_address, policy, sleeper)
            .await
    }

    async fn set_parameters(&self) -> Result<(), ClientError> {
        debug!(step = %SessionStep::ParametersSet, "Setting initial parameters");
        self.gateway
            .set_initial_parameters(&self.config.params)
            .await
            .map_err(|e| step_error(SessionStep::ParametersSet, e))
    }

    async fn open_session(&self, account_key: &str) -> Result<String, ClientError> {
        debug!(step = %SessionStep::SessionOpened, "Opening session");
        let token = self
            .gateway
            .open_session(account_key)
            .await
            .map_err(|e| step_error(SessionStep::SessionOpened, e))?;
        if token.is_empty() {
            return Err(ClientError::Authentication {
                step: SessionStep::SessionOpened,
                reason: "server returned an empty session token".into(),
            });
        }
        Ok(token)
    }

    async fn select(
        &self,
        token: &str,
        account_id: &str,
        storage: &str,
        listen: &str,
    ) -> Result<Account, ClientError> {
        debug!(step = %SessionStep::AccountSelected, account_id, "Selecting account");
        self.gateway
            .select_account(token, account_id, &placement(storage, listen))
            .await
            .map_err(|e| step_error(SessionStep::AccountSelected, e))
    }

    /// Token failures are errors; profile failures are warnings.
    fn persist(&self, session: &Session) -> Result<(), ClientError> {
        let backend = self
            .credentials
            .set(SecretKind::SessionToken, &session.token)?;
        debug!(backend = %backend, "Stored session token");

        if let Err(e) = self.profile.set_account_id(&session.account_id) {
            warn!(error = %e, "Failed to save account id");
        }
        if let Some(tech) = &session.tech_space_id {
            if let Err(e) = self.profile.set_tech_space_id(tech) {
                warn!(error = %e, "Failed to save tech space id");
            }
        }
        Ok(())
    }

    fn store_account_key(&self, account_key: &str) {
        match self.credentials.set(SecretKind::AccountKey, account_key) {
            Ok(backend) => debug!(backend = %backend, "Stored account key"),
            Err(e) => warn!(error = %e, "Failed to store account key"),
        }
    }
}
