//! Crucible analysis engine.
//!
//! Turns (observation, prediction, uncertainty) triples from several
//! experimental domains into confirmed / falsified / inconclusive verdicts:
//! systematic budgets, per-prediction aggregation, nested-sampling model
//! comparison, weighted false-discovery-rate control, and a blind-analysis
//! gate that fixes every decision threshold before the data is revealed.

pub mod aggregation;
pub mod blind;
pub mod evidence;
pub mod fdr;
pub mod measurement;
pub mod pipeline;
pub mod reporters;
pub mod systematic;
pub mod verdict;

pub use aggregation::{DomainAggregate, DomainAggregator};
pub use blind::{BlindAnalysisGate, BlindLogEntry};
pub use evidence::{BayesianComparator, ModelComparison, NullModel, PriorSpec};
pub use fdr::{FdrCandidate, FdrController, FdrOutcome};
pub use measurement::{MeasurementRecord, RawMeasurement};
pub use pipeline::{ValidationPipeline, ValidationReport};
pub use systematic::SystematicEstimator;
pub use verdict::{Decision, Verdict, VerdictReporter};
