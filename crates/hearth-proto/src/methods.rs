//! Named constants for the `ClientCommands` gRPC method paths.
//!
//! Shared by the client and by test servers so paths stay in sync without
//! duplicating string literals.

/// Fully-qualified service name.
pub const SERVICE: &str = "hearth.v1.ClientCommands";

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// `ClientCommands/InitialSetParameters`
pub const INITIAL_SET_PARAMETERS: &str = "/hearth.v1.ClientCommands/InitialSetParameters";

/// `ClientCommands/AppGetVersion`
pub const APP_GET_VERSION: &str = "/hearth.v1.ClientCommands/AppGetVersion";

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// `ClientCommands/WalletCreate`
pub const WALLET_CREATE: &str = "/hearth.v1.ClientCommands/WalletCreate";

/// `ClientCommands/WalletRecover`
pub const WALLET_RECOVER: &str = "/hearth.v1.ClientCommands/WalletRecover";

/// `ClientCommands/WalletCreateSession`
pub const WALLET_CREATE_SESSION: &str = "/hearth.v1.ClientCommands/WalletCreateSession";

/// `ClientCommands/WalletCloseSession`
pub const WALLET_CLOSE_SESSION: &str = "/hearth.v1.ClientCommands/WalletCloseSession";

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// `ClientCommands/AccountCreate`
pub const ACCOUNT_CREATE: &str = "/hearth.v1.ClientCommands/AccountCreate";

/// `ClientCommands/AccountRecover`
pub const ACCOUNT_RECOVER: &str = "/hearth.v1.ClientCommands/AccountRecover";

/// `ClientCommands/AccountSelect`
pub const ACCOUNT_SELECT: &str = "/hearth.v1.ClientCommands/AccountSelect";

/// `ClientCommands/AccountStop`
pub const ACCOUNT_STOP: &str = "/hearth.v1.ClientCommands/AccountStop";

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

/// `ClientCommands/SpaceInviteView`
pub const SPACE_INVITE_VIEW: &str = "/hearth.v1.ClientCommands/SpaceInviteView";

/// `ClientCommands/SpaceJoin`
pub const SPACE_JOIN: &str = "/hearth.v1.ClientCommands/SpaceJoin";

/// `ClientCommands/SpaceDelete`
pub const SPACE_DELETE: &str = "/hearth.v1.ClientCommands/SpaceDelete";

/// `ClientCommands/SpaceRequestApprove`
pub const SPACE_REQUEST_APPROVE: &str = "/hearth.v1.ClientCommands/SpaceRequestApprove";

/// `ClientCommands/ObjectSearch`
pub const OBJECT_SEARCH: &str = "/hearth.v1.ClientCommands/ObjectSearch";

// ---------------------------------------------------------------------------
// API keys
// ---------------------------------------------------------------------------

/// `ClientCommands/AccountLocalLinkCreateApp`
pub const ACCOUNT_LOCAL_LINK_CREATE_APP: &str =
    "/hearth.v1.ClientCommands/AccountLocalLinkCreateApp";

/// `ClientCommands/AccountLocalLinkListApps`
pub const ACCOUNT_LOCAL_LINK_LIST_APPS: &str = "/hearth.v1.ClientCommands/AccountLocalLinkListApps";

/// `ClientCommands/AccountLocalLinkRevokeApp`
pub const ACCOUNT_LOCAL_LINK_REVOKE_APP: &str =
    "/hearth.v1.ClientCommands/AccountLocalLinkRevokeApp";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// `ClientCommands/ListenSessionEvents` (server streaming)
pub const LISTEN_SESSION_EVENTS: &str = "/hearth.v1.ClientCommands/ListenSessionEvents";

/// Strip the leading `/<service>/` from a method path, leaving the bare method name.
pub fn method_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
