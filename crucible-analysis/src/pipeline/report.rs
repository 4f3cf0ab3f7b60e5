//! The result of one validation run.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crucible_core::config::StepRule;
use crucible_core::types::{Domain, PredictionId};

use crate::blind::BlindLogEntry;
use crate::fdr::FdrOutcome;
use crate::verdict::{Decision, DomainSummary, Verdict};

/// Everything a run produced, ready for a reporter.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub alpha: f64,
    pub step_rule: StepRule,
    pub records_total: usize,
    pub records_rejected: usize,
    pub discoveries: usize,
    /// Ordered by prediction id.
    pub verdicts: Vec<Verdict>,
    pub domains: Vec<DomainSummary>,
    pub fdr: FdrOutcome,
    /// The blind-log entry that released the data.
    pub unblinding: BlindLogEntry,
    pub duration_ms: u64,
}

impl ValidationReport {
    pub fn verdict(&self, prediction_id: &PredictionId) -> Option<&Verdict> {
        self.verdicts
            .iter()
            .find(|v| &v.prediction_id == prediction_id)
    }

    pub fn domain(&self, domain: Domain) -> Option<&DomainSummary> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.verdicts.iter().filter(|v| v.decision == decision).count()
    }
}
