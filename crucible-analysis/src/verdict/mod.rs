//! Verdicts: the per-prediction decision combining aggregation, model
//! comparison and the FDR outcome under the frozen conditions.

pub mod reporter;
pub mod selection;
pub mod summary;
pub mod types;

pub use reporter::{AssessmentOutcome, PredictionAssessment, VerdictReporter};
pub use selection::select_hypothesis_test;
pub use summary::DomainSummary;
pub use types::{Decision, HypothesisTest, InconclusiveReason, Verdict};
