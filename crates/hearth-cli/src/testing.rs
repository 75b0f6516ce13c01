//! Fake gateway and push stream shared by unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use hearth_proto::v1::{
    Account, AccountInfo, Event, EventMessage, ParticipantPermissions, SpaceStatus,
};

use crate::config::ConfigManager;
use crate::context::ClientContext;
use crate::credentials::{CredentialStore, ProfileStore, SecretKind};
use crate::error::ClientError;
use crate::events::predicates::fixtures::account_show;
use crate::gateway::{
    AccountPlacement, ApiKey, EventFrames, EventSource, Gateway, InitialParameters, InviteView,
    SpaceJoin, SpaceSummary,
};
use crate::session::OrchestratorConfig;

pub const TOKEN: &str = "session-token-0123456789";
pub const ACCOUNT_KEY: &str = "generated-account-key";
pub const TECH_SPACE: &str = "tech-1";

type FrameTx = mpsc::Sender<Result<Event, ClientError>>;

/// In-process server: records every call, and after `recover_account` pushes
/// an account-show event on the subscribed stream.
pub struct FakeServer {
    calls: Mutex<Vec<&'static str>>,
    frames: Mutex<Option<FrameTx>>,
    failures: Mutex<HashMap<&'static str, fn() -> ClientError>>,
    apps: Mutex<Vec<ApiKey>>,
    account_id: String,
    event_delay: Option<Duration>,
}

impl FakeServer {
    pub fn new(account_id: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            frames: Mutex::new(None),
            failures: Mutex::new(HashMap::new()),
            apps: Mutex::new(Vec::new()),
            account_id: account_id.to_string(),
            event_delay: Some(Duration::from_millis(50)),
        }
    }

    /// Never deliver the account event.
    pub fn silent(mut self) -> Self {
        self.event_delay = None;
        self
    }

    pub fn fail(self, method: &'static str, err: fn() -> ClientError) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method, err);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| **c == method).count()
    }

    /// Push `msg` on the current subscription, if any.
    pub async fn emit(&self, msg: EventMessage) -> bool {
        let tx = self
            .frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match tx {
            Some(tx) => tx
                .send(Ok(Event {
                    messages: vec![msg],
                    context_id: String::new(),
                }))
                .await
                .is_ok(),
            None => false,
        }
    }

    fn apps(&self) -> std::sync::MutexGuard<'_, Vec<ApiKey>> {
        self.apps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, method: &'static str) -> Result<(), ClientError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(method);
        match self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
        {
            Some(err) => Err(err()),
            None => Ok(()),
        }
    }

    fn account(&self, id: &str) -> Account {
        Account {
            id: id.to_string(),
            name: "fake".to_string(),
            info: Some(AccountInfo {
                tech_space_id: TECH_SPACE.to_string(),
                network_id: "net".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Gateway for FakeServer {
    async fn set_initial_parameters(&self, _params: &InitialParameters) -> Result<(), ClientError> {
        self.record("set_initial_parameters")
    }

    async fn recover_wallet(&self, _storage: &str, _key: &str) -> Result<(), ClientError> {
        self.record("recover_wallet")
    }

    async fn create_wallet(&self, _storage: &str) -> Result<String, ClientError> {
        self.record("create_wallet")?;
        Ok(ACCOUNT_KEY.to_string())
    }

    async fn open_session(&self, _key: &str) -> Result<String, ClientError> {
        self.record("open_session")?;
        Ok(TOKEN.to_string())
    }

    async fn close_session(&self, _token: &str) -> Result<(), ClientError> {
        self.record("close_session")
    }

    async fn recover_account(&self, _token: &str) -> Result<(), ClientError> {
        self.record("recover_account")?;
        let tx = self
            .frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let (Some(tx), Some(delay)) = (tx, self.event_delay) {
            let msg = account_show(&self.account_id);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx
                    .send(Ok(Event {
                        messages: vec![msg],
                        context_id: String::new(),
                    }))
                    .await;
            });
        }
        Ok(())
    }

    async fn create_account(
        &self,
        _token: &str,
        _name: &str,
        _placement: &AccountPlacement,
    ) -> Result<Account, ClientError> {
        self.record("create_account")?;
        Ok(self.account(&self.account_id))
    }

    async fn select_account(
        &self,
        _token: &str,
        account_id: &str,
        _placement: &AccountPlacement,
    ) -> Result<Account, ClientError> {
        self.record("select_account")?;
        Ok(self.account(account_id))
    }

    async fn stop_account(&self, _token: &str, _remove_data: bool) -> Result<(), ClientError> {
        self.record("stop_account")
    }

    async fn app_version(&self) -> Result<String, ClientError> {
        self.record("app_version")?;
        Ok("1.0.0".to_string())
    }

    async fn view_invite(
        &self,
        _token: &str,
        _cid: &str,
        _key: &str,
    ) -> Result<InviteView, ClientError> {
        self.record("view_invite")?;
        Ok(InviteView {
            space_id: "space-1".to_string(),
            space_name: "Garden".to_string(),
            creator_name: "alice".to_string(),
        })
    }

    async fn join_space(&self, _token: &str, _join: &SpaceJoin) -> Result<(), ClientError> {
        self.record("join_space")
    }

    async fn leave_space(&self, _token: &str, _space_id: &str) -> Result<(), ClientError> {
        self.record("leave_space")
    }

    async fn approve_join_request(
        &self,
        _token: &str,
        _space_id: &str,
        _identity: &str,
        _permissions: ParticipantPermissions,
    ) -> Result<(), ClientError> {
        self.record("approve_join_request")
    }

    async fn list_spaces(
        &self,
        _token: &str,
        tech_space_id: &str,
    ) -> Result<Vec<SpaceSummary>, ClientError> {
        self.record("list_spaces")?;
        if tech_space_id != TECH_SPACE {
            return Err(remote("unknown space"));
        }
        Ok(vec![
            SpaceSummary {
                space_id: "space-1".to_string(),
                name: "Garden".to_string(),
                status: SpaceStatus::Ok,
            },
            SpaceSummary {
                space_id: "space-2".to_string(),
                name: String::new(),
                status: SpaceStatus::Unknown,
            },
        ])
    }

    async fn create_api_key(&self, _token: &str, name: &str) -> Result<String, ClientError> {
        self.record("create_api_key")?;
        let mut apps = self.apps();
        let n = apps.len() + 1;
        let key = format!("key-{name}-{n:04}");
        apps.push(ApiKey {
            id: format!("app-{n}"),
            name: name.to_string(),
            key: key.clone(),
            created_at: 1_700_000_000 + i64::try_from(n).unwrap_or_default(),
        });
        Ok(key)
    }

    async fn list_api_keys(&self, _token: &str) -> Result<Vec<ApiKey>, ClientError> {
        self.record("list_api_keys")?;
        Ok(self.apps().clone())
    }

    async fn revoke_api_key(&self, _token: &str, id: &str) -> Result<(), ClientError> {
        self.record("revoke_api_key")?;
        let mut apps = self.apps();
        let before = apps.len();
        apps.retain(|app| app.id != id);
        if apps.len() == before {
            return Err(remote("app not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl EventSource for FakeServer {
    async fn subscribe(&self, _token: &str) -> Result<EventFrames, ClientError> {
        self.record("subscribe")?;
        let (tx, rx) = mpsc::channel(16);
        *self.frames.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

pub fn remote(description: &str) -> ClientError {
    ClientError::Remote {
        code: 1,
        description: description.to_string(),
    }
}

/// A context over `server` whose profile lives in `dir` and holds a session
/// token and tech space id, as after a login.
pub fn logged_in_context(server: Arc<FakeServer>, dir: &Path) -> ClientContext {
    let profile = Arc::new(
        ConfigManager::load(dir.join("config.json")).unwrap_or_else(|e| panic!("profile: {e}")),
    );
    profile
        .set(SecretKind::SessionToken, TOKEN)
        .unwrap_or_else(|e| panic!("token: {e}"));
    profile
        .set_tech_space_id(TECH_SPACE)
        .unwrap_or_else(|e| panic!("tech space: {e}"));
    let config = OrchestratorConfig {
        params: InitialParameters::for_client(dir, "info"),
        storage_path: dir.join("data").to_string_lossy().into_owned(),
        listen_address: "127.0.0.1:31009".to_string(),
        account_wait: Duration::from_secs(1),
    };
    ClientContext::from_parts(
        hearth_core::Settings::default(),
        server.clone(),
        server,
        profile,
        config,
    )
}
