//! Client error taxonomy.

use std::time::Duration;

use thiserror::Error;

use crate::session::SessionStep;

/// Errors surfaced by the gateway, event stream, orchestrator and supervisor.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport could not reach the server.
    #[error("Connection unavailable: {0}")]
    Connection(String),

    /// Credential invalid or rejected before the event stream was open.
    #[error("Authentication failed during {step}: {reason}")]
    Authentication { step: SessionStep, reason: String },

    /// A bounded wait elapsed.
    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: &'static str, after: Duration },

    /// The owning context was cancelled before the wait completed.
    #[error("Cancelled")]
    Cancelled,

    #[error("Task already running: {0}")]
    AlreadyRunning(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    /// Well-formed error response from the server.
    #[error("{description}")]
    Remote { code: i32, description: String },

    /// The final account activation step failed.
    #[error("Account selection failed: {0}")]
    Selection(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Invalid account key: {0}")]
    InvalidCredential(String),

    /// Local credential or profile storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// First failing orchestration step.
    #[error("{step} failed: {source}")]
    Step {
        step: SessionStep,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Wrap `self` with the orchestration step it failed in.
    #[must_use]
    pub fn in_step(self, step: SessionStep) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any `Step` wrappers.
    pub fn root(&self) -> &Self {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled)
    }

    pub fn is_connection(&self) -> bool {
        matches!(self.root(), Self::Connection(_))
    }

    pub(crate) fn storage(e: impl std::fmt::Display) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<hearth_core::Error> for ClientError {
    fn from(e: hearth_core::Error) -> Self {
        Self::storage(e)
    }
}
