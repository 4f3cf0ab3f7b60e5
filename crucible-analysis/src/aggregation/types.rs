//! Domain aggregate type.

use serde::Serialize;

use crucible_core::types::{Domain, PredictionId};

use crate::measurement::MeasurementRecord;

/// Combined statistic for a non-empty set of same-domain records.
#[derive(Debug, Clone, Serialize)]
pub struct DomainAggregate {
    pub domain: Domain,
    pub records: Vec<MeasurementRecord>,
    /// `Σ w_i z_i / sqrt(Σ w_i²)` with `w_i = 1/σ_i²`.
    pub z: f64,
    /// Two-sided p-value of `z`.
    pub p_value: f64,
    /// Inverse-variance weighted mean of observed minus predicted.
    pub weighted_mean_deviation: f64,
    /// Uncertainty of the weighted mean, `1/sqrt(Σ w_i)`.
    pub mean_uncertainty: f64,
    /// Scatter of the deviations about their weighted mean.
    pub chi_square: f64,
    pub chi_square_p_value: f64,
}

impl DomainAggregate {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The prediction every record tests, or `None` for a domain-wide
    /// aggregate spanning several predictions.
    pub fn prediction_id(&self) -> Option<&PredictionId> {
        let first = self.records.first()?.prediction_id();
        self.records
            .iter()
            .all(|r| r.prediction_id() == first)
            .then_some(first)
    }

    /// The combined z statistic computed against a fixed reference value
    /// instead of each record's prediction.
    pub fn z_against(&self, reference: f64) -> f64 {
        let weights = relative_weights(&self.records);
        let mut numerator = 0.0;
        let mut sum_w2 = 0.0;
        for (record, w) in self.records.iter().zip(weights) {
            numerator += w * (record.observed_value() - reference) / record.effective_uncertainty();
            sum_w2 += w * w;
        }
        if sum_w2 > 0.0 {
            numerator / sum_w2.sqrt()
        } else {
            0.0
        }
    }

    /// Mean complexity-to-precision ratio of the contributing records.
    pub fn mean_complexity_ratio(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let n = self.records.len() as f64;
        // Divide before summing so ratios near f64::MAX cannot overflow.
        self.records
            .iter()
            .map(|r| r.systematic().map_or(0.0, |s| s.ratio) / n)
            .sum()
    }
}

/// Inverse-variance weights `1/σ_i²` rescaled so the most precise record
/// has weight 1. Every z and mean this module computes is invariant under a
/// common scale, and the rescaled weights cannot overflow.
pub(crate) fn relative_weights(records: &[MeasurementRecord]) -> Vec<f64> {
    let sigma_min = records
        .iter()
        .map(|r| r.effective_uncertainty())
        .fold(f64::INFINITY, f64::min);
    records
        .iter()
        .map(|r| {
            let ratio = sigma_min / r.effective_uncertainty();
            ratio * ratio
        })
        .collect()
}
