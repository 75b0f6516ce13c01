//! Supervised background tasks.

pub mod server;
pub mod supervisor;

pub use server::{SERVER_TASK, ServerTask};
pub use supervisor::TaskSupervisor;
