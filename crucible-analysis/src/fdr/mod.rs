//! Weighted Benjamini-Hochberg false-discovery-rate control across all
//! predictions of a run.

pub mod controller;
pub mod types;
pub mod weights;

pub use controller::FdrController;
pub use types::{FdrCandidate, FdrDecision, FdrOutcome};
pub use weights::complexity_weights;
