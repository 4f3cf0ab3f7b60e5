//! Tail probabilities via `statrs`.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Two-sided p-value of a standard-normal z statistic.
///
/// Uses the survival function so tails stay accurate far beyond 8σ.
pub fn two_sided_p_value(z: f64) -> f64 {
    if !z.is_finite() {
        return if z.is_nan() { 1.0 } else { 0.0 };
    }
    match Normal::new(0.0, 1.0) {
        Ok(dist) => (2.0 * dist.sf(z.abs())).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

/// Upper-tail p-value of a chi-square statistic.
/// Zero degrees of freedom carry no heterogeneity information: returns 1.
pub fn chi_square_p_value(chi_square: f64, dof: usize) -> f64 {
    if dof == 0 || !chi_square.is_finite() {
        return 1.0;
    }
    match ChiSquared::new(dof as f64) {
        Ok(dist) => dist.sf(chi_square.max(0.0)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}
