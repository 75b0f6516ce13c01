//! Message types for `hearth.v1`.
//!
//! Every response carries an optional [`ResponseError`]; a missing error or a
//! code of `0` means the call succeeded.

pub mod client_commands_client;

pub use client_commands_client::ClientCommandsClient;

/// Error block embedded in every command response.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseError {
    /// `0` means no error.
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub description: String,
}

impl ResponseError {
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Access to the embedded error block shared by all responses.
pub trait CommandResponse {
    fn response_error(&self) -> Option<&ResponseError>;

    /// The embedded error, if it signals a failure.
    fn failure(&self) -> Option<&ResponseError> {
        self.response_error().filter(|e| !e.is_ok())
    }
}

macro_rules! command_response {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CommandResponse for $ty {
                fn response_error(&self) -> Option<&ResponseError> {
                    self.error.as_ref()
                }
            }
        )*
    };
}

command_response!(
    InitialSetParametersResponse,
    AppGetVersionResponse,
    WalletCreateResponse,
    WalletRecoverResponse,
    WalletCreateSessionResponse,
    WalletCloseSessionResponse,
    AccountCreateResponse,
    AccountRecoverResponse,
    AccountSelectResponse,
    AccountStopResponse,
    SpaceInviteViewResponse,
    SpaceJoinResponse,
    SpaceDeleteResponse,
    SpaceRequestApproveResponse,
    ObjectSearchResponse,
    AccountLocalLinkCreateAppResponse,
    AccountLocalLinkListAppsResponse,
    AccountLocalLinkRevokeAppResponse,
);

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InitialSetParametersRequest {
    #[prost(string, tag = "1")]
    pub platform: String,
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(string, tag = "3")]
    pub workdir: String,
    #[prost(string, tag = "4")]
    pub log_level: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InitialSetParametersResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AppGetVersionRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AppGetVersionResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(string, tag = "2")]
    pub version: String,
    #[prost(string, tag = "3")]
    pub details: String,
}

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletCreateRequest {
    #[prost(string, tag = "1")]
    pub root_path: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletCreateResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    /// Generated account key; the only copy the client will ever see.
    #[prost(string, tag = "2")]
    pub account_key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletRecoverRequest {
    #[prost(string, tag = "1")]
    pub root_path: String,
    #[prost(string, tag = "2")]
    pub account_key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletRecoverResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletCreateSessionRequest {
    #[prost(oneof = "wallet_create_session_request::Auth", tags = "1, 2")]
    pub auth: Option<wallet_create_session_request::Auth>,
}

/// Nested types for [`WalletCreateSessionRequest`].
pub mod wallet_create_session_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Auth {
        #[prost(string, tag = "1")]
        AccountKey(String),
        #[prost(string, tag = "2")]
        Token(String),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletCreateSessionResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(string, tag = "2")]
    pub token: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletCloseSessionRequest {
    #[prost(string, tag = "1")]
    pub token: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WalletCloseSessionResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Account {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, optional, tag = "3")]
    pub info: Option<AccountInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountInfo {
    #[prost(string, tag = "1")]
    pub tech_space_id: String,
    #[prost(string, tag = "2")]
    pub network_id: String,
}

impl Account {
    /// Tech space id, if the server reported one.
    pub fn tech_space_id(&self) -> Option<&str> {
        self.info
            .as_ref()
            .map(|i| i.tech_space_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountCreateRequest {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub store_path: String,
    #[prost(string, tag = "3")]
    pub json_api_listen_addr: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountCreateResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(message, optional, tag = "2")]
    pub account: Option<Account>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountRecoverRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountRecoverResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountSelectRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub root_path: String,
    #[prost(string, tag = "3")]
    pub json_api_listen_addr: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountSelectResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(message, optional, tag = "2")]
    pub account: Option<Account>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountStopRequest {
    #[prost(bool, tag = "1")]
    pub remove_data: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountStopResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ParticipantPermissions {
    Reader = 0,
    Writer = 1,
    Owner = 2,
    NoPermissions = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceInviteViewRequest {
    #[prost(string, tag = "1")]
    pub invite_cid: String,
    #[prost(string, tag = "2")]
    pub invite_file_key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceInviteViewResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(string, tag = "2")]
    pub space_id: String,
    #[prost(string, tag = "3")]
    pub space_name: String,
    #[prost(string, tag = "4")]
    pub creator_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceJoinRequest {
    #[prost(string, tag = "1")]
    pub network_id: String,
    #[prost(string, tag = "2")]
    pub space_id: String,
    #[prost(string, tag = "3")]
    pub invite_cid: String,
    #[prost(string, tag = "4")]
    pub invite_file_key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceJoinResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceDeleteRequest {
    #[prost(string, tag = "1")]
    pub space_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceDeleteResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceRequestApproveRequest {
    #[prost(string, tag = "1")]
    pub space_id: String,
    #[prost(string, tag = "2")]
    pub identity: String,
    #[prost(enumeration = "ParticipantPermissions", tag = "3")]
    pub permissions: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpaceRequestApproveResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

// ---------------------------------------------------------------------------
// Object search
// ---------------------------------------------------------------------------

/// Object layout of the per-space view records kept in the tech space.
pub const SPACE_VIEW_LAYOUT: i64 = 18;

/// Relation keys used by space listing.
pub mod relation {
    pub const RESOLVED_LAYOUT: &str = "resolvedLayout";
    pub const SPACE_LOCAL_STATUS: &str = "spaceLocalStatus";
    pub const SPACE_ACCOUNT_STATUS: &str = "spaceAccountStatus";
    pub const SPACE_ORDER: &str = "spaceOrder";
    pub const TARGET_SPACE_ID: &str = "targetSpaceId";
    pub const NAME: &str = "name";
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SpaceStatus {
    Unknown = 0,
    Loading = 1,
    Ok = 2,
    Missing = 3,
    Error = 4,
    RemoteWaitingDeletion = 5,
    RemoteDeleted = 6,
    SpaceDeleted = 7,
    SpaceActive = 8,
    SpaceJoining = 9,
    SpaceRemoving = 10,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FilterCondition {
    None = 0,
    Equal = 1,
    In = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchFilter {
    #[prost(string, tag = "1")]
    pub relation_key: String,
    #[prost(enumeration = "FilterCondition", tag = "2")]
    pub condition: i32,
    #[prost(int64, repeated, tag = "3")]
    pub values: Vec<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SearchSort {
    #[prost(string, tag = "1")]
    pub relation_key: String,
    #[prost(bool, tag = "2")]
    pub descending: bool,
    /// Records missing the key sort after the rest.
    #[prost(bool, tag = "3")]
    pub empty_last: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObjectSearchRequest {
    #[prost(string, tag = "1")]
    pub space_id: String,
    #[prost(message, repeated, tag = "2")]
    pub filters: Vec<SearchFilter>,
    #[prost(message, repeated, tag = "3")]
    pub sorts: Vec<SearchSort>,
    /// Relation keys to return for each record.
    #[prost(string, repeated, tag = "4")]
    pub keys: Vec<String>,
}

/// One search hit: the requested relations, by key.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObjectRecord {
    #[prost(map = "string, string", tag = "1")]
    pub text: ::std::collections::HashMap<String, String>,
    #[prost(map = "string, int64", tag = "2")]
    pub numbers: ::std::collections::HashMap<String, i64>,
}

impl ObjectRecord {
    /// Text relation, `None` when missing or empty.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.text.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn number(&self, key: &str) -> Option<i64> {
        self.numbers.get(key).copied()
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObjectSearchResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(message, repeated, tag = "2")]
    pub records: Vec<ObjectRecord>,
}

// ---------------------------------------------------------------------------
// API keys (local app links)
// ---------------------------------------------------------------------------

/// An app granted access to the local account API.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AppInfo {
    /// Stable id used to revoke the key.
    #[prost(string, tag = "1")]
    pub app_hash: String,
    #[prost(string, tag = "2")]
    pub app_name: String,
    #[prost(string, tag = "3")]
    pub app_key: String,
    /// Unix seconds.
    #[prost(int64, tag = "4")]
    pub created_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountLocalLinkCreateAppRequest {
    #[prost(message, optional, tag = "1")]
    pub app: Option<AppInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountLocalLinkCreateAppResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(string, tag = "2")]
    pub app_key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountLocalLinkListAppsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountLocalLinkListAppsResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
    #[prost(message, repeated, tag = "2")]
    pub app: Vec<AppInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountLocalLinkRevokeAppRequest {
    #[prost(string, tag = "1")]
    pub app_hash: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountLocalLinkRevokeAppResponse {
    #[prost(message, optional, tag = "1")]
    pub error: Option<ResponseError>,
}

// ---------------------------------------------------------------------------
// Push stream
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamRequest {
    #[prost(string, tag = "1")]
    pub token: String,
}

/// One frame of the push stream. May carry zero or more messages.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<EventMessage>,
    #[prost(string, tag = "2")]
    pub context_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EventMessage {
    #[prost(string, tag = "1")]
    pub space_id: String,
    #[prost(oneof = "event_message::Value", tags = "2, 3")]
    pub value: Option<event_message::Value>,
}

/// Nested types for [`EventMessage`].
pub mod event_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(message, tag = "2")]
        AccountShow(super::AccountShow),
        #[prost(message, tag = "3")]
        NotificationSend(super::NotificationSend),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountShow {
    #[prost(int32, tag = "1")]
    pub index: i32,
    #[prost(message, optional, tag = "2")]
    pub account: Option<Account>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotificationSend {
    #[prost(message, optional, tag = "1")]
    pub notification: Option<Notification>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Notification {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub space_id: String,
    #[prost(oneof = "notification::Payload", tags = "10")]
    pub payload: Option<notification::Payload>,
}

/// Nested types for [`Notification`].
pub mod notification {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "10")]
        RequestToJoin(super::RequestToJoin),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RequestToJoin {
    #[prost(string, tag = "1")]
    pub space_id: String,
    #[prost(string, tag = "2")]
    pub identity: String,
    #[prost(string, tag = "3")]
    pub identity_name: String,
}
