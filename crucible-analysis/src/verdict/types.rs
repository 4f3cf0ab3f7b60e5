//! Verdict types.

use std::fmt;

use serde::Serialize;

use crucible_core::errors::{AggregationError, RecordError, SamplingError};
use crucible_core::types::{Domain, PredictionId};

use crate::evidence::EvidenceStrength;

/// Final decision for one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Confirmed,
    Falsified,
    Inconclusive,
}

impl Decision {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Falsified => "falsified",
            Self::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which hypothesis the candidate p-value tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisTest {
    /// Does the data deviate from the prediction?
    Falsification,
    /// Does the data discriminate the prediction from the null reference?
    Confirmation,
}

impl HypothesisTest {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Falsification => "falsification",
            Self::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for HypothesisTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Machine-readable cause of an inconclusive verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InconclusiveReason {
    NotDiscovered,
    DirectionMismatch,
    InsufficientBayesSupport,
    EmptyDomain,
    InvalidRecord,
    MixedDomain,
    SamplingDidNotConverge,
    SamplingCancelled,
    InvalidPrior,
    NotPreregistered,
}

impl InconclusiveReason {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotDiscovered => "not_discovered",
            Self::DirectionMismatch => "direction_mismatch",
            Self::InsufficientBayesSupport => "insufficient_bayes_support",
            Self::EmptyDomain => "empty_domain",
            Self::InvalidRecord => "invalid_record",
            Self::MixedDomain => "mixed_domain",
            Self::SamplingDidNotConverge => "sampling_did_not_converge",
            Self::SamplingCancelled => "sampling_cancelled",
            Self::InvalidPrior => "invalid_prior",
            Self::NotPreregistered => "not_preregistered",
        }
    }
}

impl fmt::Display for InconclusiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&SamplingError> for InconclusiveReason {
    fn from(error: &SamplingError) -> Self {
        match error {
            SamplingError::DidNotConverge { .. } | SamplingError::EvidenceTooUncertain { .. } => {
                Self::SamplingDidNotConverge
            }
            SamplingError::Cancelled | SamplingError::TimedOut { .. } => Self::SamplingCancelled,
            SamplingError::InvalidPrior { .. } | SamplingError::InvalidSettings(_) => {
                Self::InvalidPrior
            }
        }
    }
}

impl From<&AggregationError> for InconclusiveReason {
    fn from(error: &AggregationError) -> Self {
        match error {
            AggregationError::EmptyDomain => Self::EmptyDomain,
            AggregationError::MixedDomain { .. } => Self::MixedDomain,
            AggregationError::NotAnnotated { .. } => Self::InvalidRecord,
        }
    }
}

impl From<&RecordError> for InconclusiveReason {
    fn from(_: &RecordError) -> Self {
        Self::InvalidRecord
    }
}

/// The outcome for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub prediction_id: PredictionId,
    /// `None` when no valid record revealed the domain.
    pub domain: Option<Domain>,
    pub decision: Decision,
    pub reason: Option<InconclusiveReason>,
    /// Human-readable detail for an inconclusive reason.
    pub detail: Option<String>,
    pub test: Option<HypothesisTest>,
    pub z_score: Option<f64>,
    pub raw_significance: Option<f64>,
    pub adjusted_significance: Option<f64>,
    pub fdr_threshold_used: Option<f64>,
    pub log_bayes_factor: Option<f64>,
    pub log_bayes_factor_error: Option<f64>,
    pub evidence_strength: Option<EvidenceStrength>,
    pub records_used: usize,
    pub records_rejected: usize,
}

impl Verdict {
    /// An inconclusive verdict carrying no statistics.
    pub fn inconclusive(
        prediction_id: PredictionId,
        domain: Option<Domain>,
        reason: InconclusiveReason,
    ) -> Self {
        Self {
            prediction_id,
            domain,
            decision: Decision::Inconclusive,
            reason: Some(reason),
            detail: None,
            test: None,
            z_score: None,
            raw_significance: None,
            adjusted_significance: None,
            fdr_threshold_used: None,
            log_bayes_factor: None,
            log_bayes_factor_error: None,
            evidence_strength: None,
            records_used: 0,
            records_rejected: 0,
        }
    }

    pub fn is_discovery(&self) -> bool {
        matches!(self.decision, Decision::Confirmed | Decision::Falsified)
    }
}
