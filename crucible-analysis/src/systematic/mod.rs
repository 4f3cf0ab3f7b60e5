//! Systematic error budgets.
//!
//! The estimator decides per record whether a systematic term is needed from
//! its complexity-to-precision ratio. The named-source budget combines
//! individually characterised systematics (beam asymmetry, foreground
//! residuals, ...) that a loader attaches to a record; the estimator folds
//! them into the record's systematic uncertainty.

pub mod budget;
pub mod estimator;

pub use budget::{SystematicBudget, SystematicSource};
pub use estimator::SystematicEstimator;
