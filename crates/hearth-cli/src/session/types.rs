//! Session types and orchestration steps.

use std::fmt;

use crate::error::ClientError;

/// Steps of the login/creation state machine, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionStep {
    Init,
    ParametersSet,
    CredentialEstablished,
    SessionOpened,
    StreamSubscribed,
    /// Recovery path: the account id arrives later as an event.
    RecoveryTriggered,
    /// Creation path: the account id is returned synchronously.
    AccountCreated,
    AccountIdentified,
    AccountSelected,
}

impl SessionStep {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ParametersSet => "set initial parameters",
            Self::CredentialEstablished => "establish credential",
            Self::SessionOpened => "open session",
            Self::StreamSubscribed => "subscribe to event stream",
            Self::RecoveryTriggered => "trigger account recovery",
            Self::AccountCreated => "create account",
            Self::AccountIdentified => "identify account",
            Self::AccountSelected => "select account",
        }
    }

    /// Whether this step runs before the event stream is open.
    pub const fn is_pre_stream(self) -> bool {
        matches!(
            self,
            Self::Init | Self::ParametersSet | Self::CredentialEstablished | Self::SessionOpened
        )
    }
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated context returned by a successful login or creation.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub account_id: String,
    pub tech_space_id: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &mask_token(&self.token))
            .field("account_id", &self.account_id)
            .field("tech_space_id", &self.tech_space_id)
            .finish()
    }
}

/// Account key generated by the server during account creation.
#[derive(Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub account_key: String,
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewCredential(..)")
    }
}

/// Result of an unattended login.
#[derive(Debug)]
pub enum RecoveryOutcome {
    Recovered(Session),
    NoStoredCredential,
    GaveUp {
        attempts: u32,
        last_error: ClientError,
    },
}

impl RecoveryOutcome {
    pub const fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered(_))
    }
}

/// Show the first eight characters of a token, hide the rest.
pub fn mask_token(token: &str) -> String {
    match token.char_indices().nth(8) {
        Some((idx, _)) => format!("{}****", &token[..idx]),
        None => "stored".to_string(),
    }
}
