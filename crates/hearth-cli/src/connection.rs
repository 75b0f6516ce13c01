//! Server connection client.
//!
//! Manages the gRPC channel to the account service and implements
//! [`Gateway`] and [`EventSource`] on top of it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request, Response, Status};
use tracing::{debug, info};

use hearth_proto::v1::{
    Account, AccountCreateRequest, AccountLocalLinkCreateAppRequest,
    AccountLocalLinkListAppsRequest, AccountLocalLinkRevokeAppRequest, AccountRecoverRequest,
    AccountSelectRequest, AccountStopRequest, AppGetVersionRequest, AppInfo,
    ClientCommandsClient, CommandResponse, Event, FilterCondition, InitialSetParametersRequest,
    ObjectRecord, ObjectSearchRequest, ParticipantPermissions, SPACE_VIEW_LAYOUT, SearchFilter,
    SearchSort, SpaceDeleteRequest, SpaceInviteViewRequest, SpaceJoinRequest,
    SpaceRequestApproveRequest, SpaceStatus, StreamRequest, WalletCloseSessionRequest,
    WalletCreateRequest, WalletCreateSessionRequest, WalletRecoverRequest, relation,
    wallet_create_session_request,
};

use crate::error::ClientError;
use crate::gateway::{
    AccountPlacement, ApiKey, EventFrames, EventSource, Gateway, InitialParameters, InviteView,
    SpaceJoin, SpaceSummary,
};

/// Metadata key carrying the session token on authenticated calls.
pub const TOKEN_METADATA_KEY: &str = "token";

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server gRPC address (with scheme).
    pub addr: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Bound on every unary call and on dialing the push-stream connection.
    pub request_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            addr: "http://127.0.0.1:31007".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl ConnectionConfig {
    pub fn from_settings(settings: &hearth_core::Settings) -> Self {
        Self {
            addr: settings.server.grpc_url(),
            request_timeout: settings.timeouts.rpc(),
            ..Self::default()
        }
    }
}

/// Attach the session token to a tonic request.
fn apply_token_meta<T>(req: &mut Request<T>, token: &str) {
    if let Ok(val) = token.parse() {
        req.metadata_mut().insert(TOKEN_METADATA_KEY, val);
    }
}

fn authed<T>(msg: T, token: &str) -> Request<T> {
    let mut req = Request::new(msg);
    apply_token_meta(&mut req, token);
    req
}

/// Map a transport-level status onto the client taxonomy.
fn status_to_error(status: &Status) -> ClientError {
    match status.code() {
        Code::Unavailable => ClientError::Connection(status.message().to_string()),
        Code::Cancelled => ClientError::Cancelled,
        code => ClientError::Remote {
            code: code as i32,
            description: status.message().to_string(),
        },
    }
}

/// Reject responses whose embedded error block signals a failure.
fn check<R: CommandResponse>(resp: R) -> Result<R, ClientError> {
    match resp.failure() {
        Some(e) => Err(ClientError::Remote {
            code: e.code,
            description: e.description.clone(),
        }),
        None => Ok(resp),
    }
}

/// Search the tech space for active space views, in the account's order.
fn space_list_request(tech_space_id: &str) -> ObjectSearchRequest {
    let filter = |key: &str, condition: FilterCondition, values: Vec<i64>| SearchFilter {
        relation_key: key.to_string(),
        condition: condition.into(),
        values,
    };
    let status = |s: SpaceStatus| i64::from(s as i32);
    ObjectSearchRequest {
        space_id: tech_space_id.to_string(),
        filters: vec![
            filter(
                relation::RESOLVED_LAYOUT,
                FilterCondition::Equal,
                vec![SPACE_VIEW_LAYOUT],
            ),
            filter(
                relation::SPACE_LOCAL_STATUS,
                FilterCondition::In,
                vec![status(SpaceStatus::Unknown), status(SpaceStatus::Ok)],
            ),
            filter(
                relation::SPACE_ACCOUNT_STATUS,
                FilterCondition::In,
                vec![status(SpaceStatus::Unknown), status(SpaceStatus::SpaceActive)],
            ),
        ],
        sorts: vec![SearchSort {
            relation_key: relation::SPACE_ORDER.to_string(),
            descending: false,
            empty_last: true,
        }],
        keys: [
            relation::TARGET_SPACE_ID,
            relation::NAME,
            relation::SPACE_LOCAL_STATUS,
        ]
        .iter()
        .map(|k| (*k).to_string())
        .collect(),
    }
}

/// Records without a target space id are skipped.
fn space_from_record(record: &ObjectRecord) -> Option<SpaceSummary> {
    let space_id = record.text(relation::TARGET_SPACE_ID)?;
    let status = record
        .number(relation::SPACE_LOCAL_STATUS)
        .and_then(|n| i32::try_from(n).ok())
        .and_then(|n| SpaceStatus::try_from(n).ok())
        .unwrap_or(SpaceStatus::Unknown);
    Some(SpaceSummary {
        space_id: space_id.to_string(),
        name: record.text(relation::NAME).unwrap_or_default().to_string(),
        status,
    })
}

/// tonic-backed gateway.
#[derive(Debug, Clone)]
pub struct GrpcGateway {
    client: ClientCommandsClient,
    config: ConnectionConfig,
}

impl GrpcGateway {
    /// Dial the server now. Fails with `Connection` if it is unreachable.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, ClientError> {
        let channel = Self::endpoint(&config)?
            .connect()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        info!(addr = %config.addr, "Connected");
        Ok(Self::from_channel(channel, config))
    }

    /// Build a gateway whose channel dials on first use.
    pub fn connect_lazy(config: ConnectionConfig) -> Result<Self, ClientError> {
        let channel = Self::endpoint(&config)?.connect_lazy();
        Ok(Self::from_channel(channel, config))
    }

    fn from_channel(channel: Channel, config: ConnectionConfig) -> Self {
        Self {
            client: ClientCommandsClient::new(channel),
            config,
        }
    }

    fn endpoint(config: &ConnectionConfig) -> Result<Endpoint, ClientError> {
        Ok(Endpoint::from_shared(config.addr.clone())
            .map_err(|e| ClientError::Connection(format!("Invalid address {}: {e}", config.addr)))?
            .connect_timeout(config.connect_timeout)
            .http2_keep_alive_interval(Duration::from_secs(30))
            .keep_alive_timeout(Duration::from_secs(10)))
    }

    pub fn addr(&self) -> &str {
        &self.config.addr
    }

    /// Run one unary call bounded by the request timeout.
    async fn call<F, Fut, R>(&self, what: &'static str, f: F) -> Result<R, ClientError>
    where
        F: FnOnce(ClientCommandsClient) -> Fut + Send,
        Fut: Future<Output = Result<Response<R>, Status>> + Send,
        R: CommandResponse + Send,
    {
        debug!(call = what, "rpc");
        let after = self.config.request_timeout;
        match tokio::time::timeout(after, f(self.client.clone())).await {
            Err(_) => Err(ClientError::Timeout { what, after }),
            Ok(Err(status)) => Err(status_to_error(&status)),
            Ok(Ok(resp)) => check(resp.into_inner()),
        }
    }
}

#[async_trait]
impl Gateway for GrpcGateway {
    async fn set_initial_parameters(&self, params: &InitialParameters) -> Result<(), ClientError> {
        let req = InitialSetParametersRequest {
            platform: params.platform.clone(),
            version: params.version.clone(),
            workdir: params.work_dir.clone(),
            log_level: params.log_level.clone(),
        };
        self.call("InitialSetParameters", |mut c| async move {
            c.initial_set_parameters(req).await
        })
        .await
        .map(drop)
    }

    async fn recover_wallet(
        &self,
        storage_path: &str,
        account_key: &str,
    ) -> Result<(), ClientError> {
        let req = WalletRecoverRequest {
            root_path: storage_path.to_string(),
            account_key: account_key.to_string(),
        };
        self.call("WalletRecover", |mut c| async move {
            c.wallet_recover(req).await
        })
        .await
        .map(drop)
    }

    async fn create_wallet(&self, storage_path: &str) -> Result<String, ClientError> {
        let req = WalletCreateRequest {
            root_path: storage_path.to_string(),
        };
        let resp = self
            .call("WalletCreate", |mut c| async move { c.wallet_create(req).await })
            .await?;
        Ok(resp.account_key)
    }

    async fn open_session(&self, account_key: &str) -> Result<String, ClientError> {
        let req = WalletCreateSessionRequest {
            auth: Some(wallet_create_session_request::Auth::AccountKey(
                account_key.to_string(),
            )),
        };
        let resp = self
            .call("WalletCreateSession", |mut c| async move {
                c.wallet_create_session(req).await
            })
            .await?;
        Ok(resp.token)
    }

    async fn close_session(&self, token: &str) -> Result<(), ClientError> {
        let req = authed(
            WalletCloseSessionRequest {
                token: token.to_string(),
            },
            token,
        );
        self.call("WalletCloseSession", |mut c| async move {
            c.wallet_close_session(req).await
        })
        .await
        .map(drop)
    }

    async fn recover_account(&self, token: &str) -> Result<(), ClientError> {
        let req = authed(AccountRecoverRequest {}, token);
        self.call("AccountRecover", |mut c| async move {
            c.account_recover(req).await
        })
        .await
        .map(drop)
    }

    async fn create_account(
        &self,
        token: &str,
        name: &str,
        placement: &AccountPlacement,
    ) -> Result<Account, ClientError> {
        let req = authed(
            AccountCreateRequest {
                name: name.to_string(),
                store_path: placement.storage_path.clone(),
                json_api_listen_addr: placement.listen_address.clone(),
            },
            token,
        );
        let resp = self
            .call("AccountCreate", |mut c| async move {
                c.account_create(req).await
            })
            .await?;
        resp.account.ok_or_else(|| ClientError::Remote {
            code: 0,
            description: "account create returned no account".to_string(),
        })
    }

    async fn select_account(
        &self,
        token: &str,
        account_id: &str,
        placement: &AccountPlacement,
    ) -> Result<Account, ClientError> {
        let req = authed(
            AccountSelectRequest {
                id: account_id.to_string(),
                root_path: placement.storage_path.clone(),
                json_api_listen_addr: placement.listen_address.clone(),
            },
            token,
        );
        let resp = self
            .call("AccountSelect", |mut c| async move {
                c.account_select(req).await
            })
            .await?;
        Ok(resp.account.unwrap_or_else(|| Account {
            id: account_id.to_string(),
            ..Account::default()
        }))
    }

    async fn stop_account(&self, token: &str, remove_data: bool) -> Result<(), ClientError> {
        let req = authed(AccountStopRequest { remove_data }, token);
        self.call("AccountStop", |mut c| async move { c.account_stop(req).await })
            .await
            .map(drop)
    }

    async fn app_version(&self) -> Result<String, ClientError> {
        let resp = self
            .call("AppGetVersion", |mut c| async move {
                c.app_get_version(AppGetVersionRequest {}).await
            })
            .await?;
        Ok(resp.version)
    }

    async fn view_invite(
        &self,
        token: &str,
        invite_cid: &str,
        invite_file_key: &str,
    ) -> Result<InviteView, ClientError> {
        let req = authed(
            SpaceInviteViewRequest {
                invite_cid: invite_cid.to_string(),
                invite_file_key: invite_file_key.to_string(),
            },
            token,
        );
        let resp = self
            .call("SpaceInviteView", |mut c| async move {
                c.space_invite_view(req).await
            })
            .await?;
        Ok(InviteView {
            space_id: resp.space_id,
            space_name: resp.space_name,
            creator_name: resp.creator_name,
        })
    }

    async fn join_space(&self, token: &str, join: &SpaceJoin) -> Result<(), ClientError> {
        let req = authed(
            SpaceJoinRequest {
                network_id: join.network_id.clone(),
                space_id: join.space_id.clone(),
                invite_cid: join.invite_cid.clone(),
                invite_file_key: join.invite_file_key.clone(),
            },
            token,
        );
        self.call("SpaceJoin", |mut c| async move { c.space_join(req).await })
            .await
            .map(drop)
    }

    async fn leave_space(&self, token: &str, space_id: &str) -> Result<(), ClientError> {
        let req = authed(
            SpaceDeleteRequest {
                space_id: space_id.to_string(),
            },
            token,
        );
        self.call("SpaceDelete", |mut c| async move { c.space_delete(req).await })
            .await
            .map(drop)
    }

    async fn approve_join_request(
        &self,
        token: &str,
        space_id: &str,
        identity: &str,
        permissions: ParticipantPermissions,
    ) -> Result<(), ClientError> {
        let req = authed(
            SpaceRequestApproveRequest {
                space_id: space_id.to_string(),
                identity: identity.to_string(),
                permissions: permissions.into(),
            },
            token,
        );
        self.call("SpaceRequestApprove", |mut c| async move {
            c.space_request_approve(req).await
        })
        .await
        .map(drop)
    }

    async fn list_spaces(
        &self,
        token: &str,
        tech_space_id: &str,
    ) -> Result<Vec<SpaceSummary>, ClientError> {
        let req = authed(space_list_request(tech_space_id), token);
        let resp = self
            .call("ObjectSearch", |mut c| async move { c.object_search(req).await })
            .await?;
        Ok(resp.records.iter().filter_map(space_from_record).collect())
    }

    async fn create_api_key(&self, token: &str, name: &str) -> Result<String, ClientError> {
        let req = authed(
            AccountLocalLinkCreateAppRequest {
                app: Some(AppInfo {
                    app_name: name.to_string(),
                    ..AppInfo::default()
                }),
            },
            token,
        );
        let resp = self
            .call("AccountLocalLinkCreateApp", |mut c| async move {
                c.account_local_link_create_app(req).await
            })
            .await?;
        Ok(resp.app_key)
    }

    async fn list_api_keys(&self, token: &str) -> Result<Vec<ApiKey>, ClientError> {
        let req = authed(AccountLocalLinkListAppsRequest {}, token);
        let resp = self
            .call("AccountLocalLinkListApps", |mut c| async move {
                c.account_local_link_list_apps(req).await
            })
            .await?;
        Ok(resp
            .app
            .into_iter()
            .map(|app| ApiKey {
                id: app.app_hash,
                name: app.app_name,
                key: app.app_key,
                created_at: app.created_at,
            })
            .collect())
    }

    async fn revoke_api_key(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let req = authed(
            AccountLocalLinkRevokeAppRequest {
                app_hash: id.to_string(),
            },
            token,
        );
        self.call("AccountLocalLinkRevokeApp", |mut c| async move {
            c.account_local_link_revoke_app(req).await
        })
        .await
        .map(drop)
    }
}

/// Frames buffered between the forwarding task and the receive loop.
const EVENT_BUFFER: usize = 64;

#[async_trait]
impl EventSource for GrpcGateway {
    /// Dial a dedicated connection and start the streaming call in the background.
    ///
    /// Returns once the transport is up. Servers may hold response headers
    /// back until their first event, so the call itself is awaited by the
    /// forwarding task; a rejected call arrives as the first frame.
    async fn subscribe(&self, token: &str) -> Result<EventFrames, ClientError> {
        let after = self.config.request_timeout;
        let channel = tokio::time::timeout(after, Self::endpoint(&self.config)?.connect())
            .await
            .map_err(|_| ClientError::Timeout {
                what: "event stream connection",
                after,
            })?
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        let req = authed(
            StreamRequest {
                token: token.to_string(),
            },
            token,
        );
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(forward_events(ClientCommandsClient::new(channel), req, tx));
        debug!(addr = %self.config.addr, "Event stream requested");
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Run the streaming call and feed its frames to `tx` until either side stops.
async fn forward_events(
    mut client: ClientCommandsClient,
    req: Request<StreamRequest>,
    tx: mpsc::Sender<Result<Event, ClientError>>,
) {
    let response = tokio::select! {
        () = tx.closed() => return,
        response = client.listen_session_events(req) => response,
    };
    let mut frames = match response {
        Ok(response) => response.into_inner(),
        Err(status) => {
            let _ = tx.send(Err(status_to_error(&status))).await;
            return;
        }
    };

    loop {
        tokio::select! {
            () = tx.closed() => break,
            frame = frames.next() => match frame {
                Some(frame) => {
                    if tx.send(frame.map_err(|s| status_to_error(&s))).await.is_err() {
                        break;
                    }
                }
                None => break,
            }
        }
    }
    debug!("Event stream forwarder finished");
}
