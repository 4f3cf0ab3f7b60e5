//! Complexity-derived FDR weights.

use crucible_core::errors::FdrError;

/// Weights `w_i ∝ 1/(1 + c_i)` normalized to mean 1.
///
/// More complex predictions receive smaller weights and therefore stricter
/// per-rank thresholds.
pub fn complexity_weights(scores: &[f64]) -> Result<Vec<f64>, FdrError> {
    if let Some(bad) = scores.iter().find(|c| !c.is_finite() || **c < 0.0) {
        return Err(FdrError::InvalidWeights(format!(
            "complexity score must be finite and non-negative, got {bad}"
        )));
    }
    let raw: Vec<f64> = scores.iter().map(|c| 1.0 / (1.0 + c)).collect();
    normalize_to_unit_mean(&raw)
}

/// Rescale positive finite weights so their mean is exactly 1.
pub(crate) fn normalize_to_unit_mean(weights: &[f64]) -> Result<Vec<f64>, FdrError> {
    if weights.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
        return Err(FdrError::InvalidWeights(format!(
            "weights must be positive and finite, got {bad}"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return Err(FdrError::InvalidWeights(format!("weight sum {sum} is not positive")));
    }
    let m = weights.len() as f64;
    Ok(weights.iter().map(|w| w * m / sum).collect())
}
