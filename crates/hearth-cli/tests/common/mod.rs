//! Scripted in-process server for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use hearth_cli::ClientError;
use hearth_cli::gateway::{
    AccountPlacement, ApiKey, EventFrames, EventSource, Gateway, InitialParameters, InviteView,
    SpaceJoin, SpaceSummary,
};
use hearth_proto::v1::{
    Account, AccountInfo, AccountShow, Event, EventMessage, ParticipantPermissions, event_message,
};

pub const TOKEN: &str = "tok-0123456789abcdef";

/// Records calls in order. `recover_account` emits the account event on the
/// stream after `event_delay`; `fail_setup` makes every login fail early.
pub struct ScriptedServer {
    pub account_id: String,
    pub event_delay: Duration,
    pub fail_setup: bool,
    calls: Mutex<Vec<&'static str>>,
    frames: Mutex<Option<mpsc::Sender<Result<Event, ClientError>>>>,
    pub subscriptions: AtomicUsize,
}

impl ScriptedServer {
    pub fn new(account_id: &str, event_delay: Duration) -> Self {
        Self {
            account_id: account_id.to_string(),
            event_delay,
            fail_setup: false,
            calls: Mutex::new(Vec::new()),
            frames: Mutex::new(None),
            subscriptions: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fail_setup: true,
            ..Self::new("unused", Duration::ZERO)
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| *c == call)
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn account_show(id: &str) -> EventMessage {
    EventMessage {
        space_id: String::new(),
        value: Some(event_message::Value::AccountShow(AccountShow {
            index: 0,
            account: Some(Account {
                id: id.to_string(),
                ..Account::default()
            }),
        })),
    }
}

#[async_trait]
impl Gateway for ScriptedServer {
    async fn set_initial_parameters(&self, _params: &InitialParameters) -> Result<(), ClientError> {
        self.record("set_initial_parameters");
        if self.fail_setup {
            return Err(ClientError::Connection("connection refused".into()));
        }
        Ok(())
    }

    async fn recover_wallet(&self, _storage: &str, _key: &str) -> Result<(), ClientError> {
        self.record("recover_wallet");
        Ok(())
    }

    async fn create_wallet(&self, _storage: &str) -> Result<String, ClientError> {
        self.record("create_wallet");
        Ok("new-key".into())
    }

    async fn open_session(&self, _key: &str) -> Result<String, ClientError> {
        self.record("open_session");
        Ok(TOKEN.into())
    }

    async fn close_session(&self, _token: &str) -> Result<(), ClientError> {
        self.record("close_session");
        Ok(())
    }

    async fn recover_account(&self, _token: &str) -> Result<(), ClientError> {
        self.record("recover_account");
        let tx = self.frames.lock().unwrap().clone();
        if let Some(tx) = tx {
            let delay = self.event_delay;
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
        self.record("create_account");
        Ok(Account {
            id: self.account_id.clone(),
            ..Account::default()
        })
    }

    async fn select_account(
        &self,
        _token: &str,
        account_id: &str,
        _placement: &AccountPlacement,
    ) -> Result<Account, ClientError> {
        self.record("select_account");
        Ok(Account {
            id: account_id.to_string(),
            name: "scripted".into(),
            info: Some(AccountInfo {
                tech_space_id: "tech-space".into(),
                network_id: "net".into(),
            }),
        })
    }

    async fn stop_account(&self, _token: &str, _remove_data: bool) -> Result<(), ClientError> {
        self.record("stop_account");
        Ok(())
    }

    async fn app_version(&self) -> Result<String, ClientError> {
        self.record("app_version");
        Ok("0.1.0".into())
    }

    async fn view_invite(&self, _t: &str, _c: &str, _k: &str) -> Result<InviteView, ClientError> {
        self.record("view_invite");
        Err(ClientError::NotFound("invite".into()))
    }

    async fn join_space(&self, _token: &str, _join: &SpaceJoin) -> Result<(), ClientError> {
        self.record("join_space");
        Ok(())
    }

    async fn leave_space(&self, _token: &str, _space_id: &str) -> Result<(), ClientError> {
        self.record("leave_space");
        Ok(())
    }

    async fn approve_join_request(
        &self,
        _token: &str,
        _space_id: &str,
        _identity: &str,
        _permissions: ParticipantPermissions,
    ) -> Result<(), ClientError> {
        self.record("approve_join_request");
        Ok(())
    }

    async fn list_spaces(&self, _t: &str, _tech: &str) -> Result<Vec<SpaceSummary>, ClientError> {
        self.record("list_spaces");
        Ok(Vec::new())
    }

    async fn create_api_key(&self, _token: &str, name: &str) -> Result<String, ClientError> {
        self.record("create_api_key");
        Ok(format!("key-{name}"))
    }

    async fn list_api_keys(&self, _token: &str) -> Result<Vec<ApiKey>, ClientError> {
        self.record("list_api_keys");
        Ok(Vec::new())
    }

    async fn revoke_api_key(&self, _token: &str, _id: &str) -> Result<(), ClientError> {
        self.record("revoke_api_key");
        Ok(())
    }
}

#[async_trait]
impl EventSource for ScriptedServer {
    async fn subscribe(&self, _token: &str) -> Result<EventFrames, ClientError> {
        // Yield so a racing recover_account would get ahead if it could
        tokio::task::yield_now().await;
        self.record("subscribe");
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        *self.frames.lock().unwrap() = Some(tx);
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
