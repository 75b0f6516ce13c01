//! Hearth Core Library
//!
//! Shared functionality for Hearth components:
//! - Layered settings resolution
//! - Platform paths for work, data and log directories
//! - Tracing initialisation
//! - Common error types

pub mod config;
pub mod error;
pub mod paths;
pub mod tracing_init;

pub use config::Settings;
pub use error::{Error, Result};
