//! Event system for Crucible.
//! Handlers observe a validation run without influencing it.

pub mod handler;
pub mod types;

pub use handler::{NoOpEventHandler, ValidationEventHandler};
pub use types::*;
