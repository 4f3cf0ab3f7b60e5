//! End-to-end validation run: records in, verdicts out, under the blind gate.

pub mod report;
pub mod runner;

pub use report::ValidationReport;
pub use runner::ValidationPipeline;
