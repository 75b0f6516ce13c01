//! Hearth CLI library.
//!
//! Client for the hearth account service: the gRPC gateway, the push-stream
//! event multiplexer, session orchestration and background task supervision.

pub mod apikey_cmd;
pub mod auth_cmd;
pub mod config;
pub mod config_cmd;
pub mod connection;
pub mod context;
pub mod credentials;
pub mod error;
pub mod events;
pub mod gateway;
pub mod serve_cmd;
pub mod session;
pub mod space_cmd;
pub mod tasks;

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod testing;

pub use error::ClientError;
