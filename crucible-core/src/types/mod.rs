//! Data types shared by every Crucible subsystem.

pub mod condition;
pub mod distribution;
pub mod domain;
pub mod identifiers;

pub use condition::{FalsificationCondition, FalsificationDirection};
pub use distribution::PriorDistribution;
pub use domain::Domain;
pub use identifiers::PredictionId;
