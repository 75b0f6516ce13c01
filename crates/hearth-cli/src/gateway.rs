//! RPC gateway and push-stream seams.
//!
//! [`Gateway`] covers the request/response calls; [`EventSource`] opens the
//! single server-push subscription. `GrpcGateway` in [`crate::connection`]
//! implements both over tonic; tests substitute fakes.

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use hearth_proto::v1::{Account, Event, ParticipantPermissions, SpaceStatus};

use crate::error::ClientError;

/// Frames delivered by the push stream. Each frame holds zero or more events.
pub type EventFrames = Pin<Box<dyn Stream<Item = Result<Event, ClientError>> + Send>>;

/// Parameters sent before any wallet call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialParameters {
    pub platform: String,
    pub version: String,
    pub work_dir: String,
    pub log_level: String,
}

impl InitialParameters {
    /// Parameters describing this client build.
    pub fn for_client(work_dir: &Path, log_level: &str) -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            work_dir: work_dir.to_string_lossy().into_owned(),
            log_level: log_level.to_string(),
        }
    }
}

/// Where a selected or created account keeps its data and serves its API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPlacement {
    pub storage_path: String,
    pub listen_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteView {
    pub space_id: String,
    pub space_name: String,
    pub creator_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceJoin {
    pub network_id: String,
    pub space_id: String,
    pub invite_cid: String,
    pub invite_file_key: String,
}

/// A space the account belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceSummary {
    pub space_id: String,
    pub name: String,
    pub status: SpaceStatus,
}

/// An API key granted to a local app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Id used to revoke the key.
    pub id: String,
    pub name: String,
    pub key: String,
    /// Unix seconds.
    pub created_at: i64,
}

/// Request/response calls against the account service.
///
/// Calls taking `token` are authenticated; the rest are not.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn set_initial_parameters(&self, params: &InitialParameters) -> Result<(), ClientError>;

    async fn recover_wallet(&self, storage_path: &str, account_key: &str)
    -> Result<(), ClientError>;

    /// Create a wallet; returns the generated account key.
    async fn create_wallet(&self, storage_path: &str) -> Result<String, ClientError>;

    /// Open a session; returns the session token.
    async fn open_session(&self, account_key: &str) -> Result<String, ClientError>;

    async fn close_session(&self, token: &str) -> Result<(), ClientError>;

    /// Trigger account recovery. The id is only delivered on the event stream.
    async fn recover_account(&self, token: &str) -> Result<(), ClientError>;

    async fn create_account(
        &self,
        token: &str,
        name: &str,
        placement: &AccountPlacement,
    ) -> Result<Account, ClientError>;

    async fn select_account(
        &self,
        token: &str,
        account_id: &str,
        placement: &AccountPlacement,
    ) -> Result<Account, ClientError>;

    async fn stop_account(&self, token: &str, remove_data: bool) -> Result<(), ClientError>;

    async fn app_version(&self) -> Result<String, ClientError>;

    async fn view_invite(
        &self,
        token: &str,
        invite_cid: &str,
        invite_file_key: &str,
    ) -> Result<InviteView, ClientError>;

    async fn join_space(&self, token: &str, join: &SpaceJoin) -> Result<(), ClientError>;

    async fn leave_space(&self, token: &str, space_id: &str) -> Result<(), ClientError>;

    async fn approve_join_request(
        &self,
        token: &str,
        space_id: &str,
        identity: &str,
        permissions: ParticipantPermissions,
    ) -> Result<(), ClientError>;

    /// Spaces listed in the account's tech space, in the account's order.
    async fn list_spaces(
        &self,
        token: &str,
        tech_space_id: &str,
    ) -> Result<Vec<SpaceSummary>, ClientError>;

    /// Create an API key named `name`; returns the key.
    async fn create_api_key(&self, token: &str, name: &str) -> Result<String, ClientError>;

    async fn list_api_keys(&self, token: &str) -> Result<Vec<ApiKey>, ClientError>;

    async fn revoke_api_key(&self, token: &str, id: &str) -> Result<(), ClientError>;
}

/// Opens the push stream.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self, token: &str) -> Result<EventFrames, ClientError>;
}

/// Probe the server with a version call. An unreachable or silent server is "not running".
pub async fn is_server_running(gateway: &dyn Gateway) -> Result<bool, ClientError> {
    match gateway.app_version().await {
        Ok(_) => Ok(true),
        Err(e) if e.is_connection() || e.is_timeout() => Ok(false),
        Err(e) => Err(e),
    }
}
