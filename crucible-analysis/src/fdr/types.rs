//! FDR candidates and outcomes.

use serde::Serialize;

use crucible_core::config::StepRule;
use crucible_core::types::PredictionId;

/// One hypothesis entering the correction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FdrCandidate {
    pub prediction_id: PredictionId,
    /// Raw p-value.
    pub significance: f64,
    /// Relative prior weight. Normalized to mean 1 by the controller.
    pub weight: f64,
}

impl FdrCandidate {
    /// Candidate with unit weight.
    pub fn new(prediction_id: impl Into<PredictionId>, significance: f64) -> Self {
        Self {
            prediction_id: prediction_id.into(),
            significance,
            weight: 1.0,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Per-candidate result of the correction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FdrDecision {
    pub prediction_id: PredictionId,
    /// 1-based rank after sorting by p-value.
    pub rank: usize,
    pub raw_significance: f64,
    /// Weight after normalization to mean 1.
    pub weight: f64,
    /// `α · w · k / m` for this rank.
    pub threshold: f64,
    /// Weighted BH q-value.
    pub adjusted_significance: f64,
    pub discovered: bool,
}

/// Result of one FDR pass, in rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FdrOutcome {
    pub alpha: f64,
    pub step_rule: StepRule,
    pub decisions: Vec<FdrDecision>,
}

impl FdrOutcome {
    pub fn get(&self, prediction_id: &PredictionId) -> Option<&FdrDecision> {
        self.decisions
            .iter()
            .find(|d| &d.prediction_id == prediction_id)
    }

    pub fn is_discovered(&self, prediction_id: &PredictionId) -> bool {
        self.get(prediction_id).is_some_and(|d| d.discovered)
    }

    pub fn discoveries(&self) -> usize {
        self.decisions.iter().filter(|d| d.discovered).count()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
