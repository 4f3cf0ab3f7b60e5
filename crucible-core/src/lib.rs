//! Shared foundation for the Crucible validation engine: constants, error
//! enums, layered configuration, events, tracing setup, and the data types
//! every subsystem agrees on.

pub mod config;
pub mod constants;
pub mod errors;
pub mod events;
pub mod traits;
pub mod tracing;
pub mod types;
