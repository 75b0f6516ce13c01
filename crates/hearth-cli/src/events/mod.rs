//! Event multiplexing over the server push stream.
//!
//! One subscription per process ([`EventHub`]) feeds an [`EventQueue`] that
//! any number of callers wait on with their own predicate and deadline. Each
//! event goes to at most one waiter.

pub mod predicates;
pub mod queue;
pub mod stream;

pub use queue::EventQueue;
pub use stream::{EventHub, EventStream, JOIN_REQUEST_WAIT};
