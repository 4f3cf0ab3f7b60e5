//! Weighted Benjamini-Hochberg procedure.

use tracing::{debug, info};

use crucible_core::config::{FdrConfig, StepRule};
use crucible_core::errors::FdrError;

use super::types::{FdrCandidate, FdrDecision, FdrOutcome};
use super::weights::normalize_to_unit_mean;

/// Controls the false discovery rate at `alpha` across every candidate of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdrController {
    alpha: f64,
    step_rule: StepRule,
}

impl FdrController {
    pub fn new(alpha: f64) -> Result<Self, FdrError> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(FdrError::InvalidAlpha(alpha));
        }
        Ok(Self {
            alpha,
            step_rule: StepRule::default(),
        })
    }

    pub fn from_config(config: &FdrConfig) -> Result<Self, FdrError> {
        Ok(Self::new(config.effective_alpha())?.with_step_rule(config.effective_step_rule()))
    }

    pub fn with_step_rule(mut self, step_rule: StepRule) -> Self {
        self.step_rule = step_rule;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn step_rule(&self) -> StepRule {
        self.step_rule
    }

    /// Run the correction.
    ///
    /// Candidates are ranked by ascending p-value with ties broken by
    /// prediction id, so the outcome does not depend on input order.
    pub fn adjust(&self, candidates: &[FdrCandidate]) -> Result<FdrOutcome, FdrError> {
        for candidate in candidates {
            let p = candidate.significance;
            if !(0.0..=1.0).contains(&p) {
                return Err(FdrError::InvalidSignificance {
                    prediction: candidate.prediction_id.to_string(),
                    value: p,
                });
            }
        }

        let raw_weights: Vec<f64> = candidates.iter().map(|c| c.weight).collect();
        let weights = normalize_to_unit_mean(&raw_weights)?;

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| {
            candidates[a]
                .significance
                .total_cmp(&candidates[b].significance)
                .then_with(|| candidates[a].prediction_id.cmp(&candidates[b].prediction_id))
        });

        let m = candidates.len() as f64;
        let mut decisions: Vec<FdrDecision> = order
            .iter()
            .enumerate()
            .map(|(i, &idx)| {
                let rank = i + 1;
                let weight = weights[idx];
                let p = candidates[idx].significance;
                FdrDecision {
                    prediction_id: candidates[idx].prediction_id.clone(),
                    rank,
                    raw_significance: p,
                    weight,
                    threshold: self.alpha * weight * rank as f64 / m,
                    adjusted_significance: (m * p / (rank as f64 * weight)).min(1.0),
                    discovered: false,
                }
            })
            .collect();

        let passing = |d: &FdrDecision| d.raw_significance <= d.threshold;
        let discovered_ranks = match self.step_rule {
            StepRule::StepUp => decisions.iter().rposition(passing).map_or(0, |i| i + 1),
            StepRule::StepDown => decisions.iter().position(|d| !passing(d)).unwrap_or(decisions.len()),
        };
        for decision in decisions.iter_mut().take(discovered_ranks) {
            decision.discovered = true;
        }

        // q-values must be monotone in rank.
        match self.step_rule {
            StepRule::StepUp => {
                let mut running = 1.0f64;
                for decision in decisions.iter_mut().rev() {
                    running = running.min(decision.adjusted_significance);
                    decision.adjusted_significance = running;
                }
            }
            StepRule::StepDown => {
                let mut running = 0.0f64;
                for decision in decisions.iter_mut() {
                    running = running.max(decision.adjusted_significance);
                    decision.adjusted_significance = running;
                }
            }
        }

        for decision in &decisions {
            debug!(
                prediction = %decision.prediction_id,
                rank = decision.rank,
                p_value = decision.raw_significance,
                threshold = decision.threshold,
                q_value = decision.adjusted_significance,
                discovered = decision.discovered,
                "fdr decision"
            );
        }
        info!(
            candidates = decisions.len(),
            discoveries = discovered_ranks,
            alpha = self.alpha,
            step_rule = %self.step_rule,
            "fdr correction applied"
        );

        Ok(FdrOutcome {
            alpha: self.alpha,
            step_rule: self.step_rule,
            decisions,
        })
    }
}
