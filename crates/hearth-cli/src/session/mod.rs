//! Authenticated session lifecycle.

pub mod orchestrator;
pub mod retry;
pub mod types;

pub use orchestrator::{OrchestratorConfig, SessionOrchestrator, validate_account_key};
pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};
pub use types::{NewCredential, RecoveryOutcome, Session, SessionStep, mask_token};
