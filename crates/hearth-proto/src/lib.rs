//! Hearth Protocol Buffers
//!
//! Protobuf messages and the gRPC client for the Hearth `ClientCommands` API.
//!
//! This crate contains:
//! - request/response pairs for the setup, wallet, account and space commands
//! - the push-stream `Event` envelope delivered by `ListenSessionEvents`
//! - `ClientCommandsClient`, a tonic client over a `Channel`

#![allow(clippy::derive_partial_eq_without_eq)]

pub mod methods;

/// Hearth v1 API definitions.
pub mod v1;

// Re-export v1 as the default API version for convenience
pub use v1::*;
