//! Prior distributions over nuisance parameters.

use serde::{Deserialize, Serialize};

/// A one-dimensional prior, declared in configuration and consumed by the
/// evidence estimator through its unit-interval quantile transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorDistribution {
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    LogUniform { low: f64, high: f64 },
}

impl PriorDistribution {
    /// Returns a description of the problem if the parameters are unusable.
    pub fn check(&self) -> Result<(), String> {
        match *self {
            Self::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low >= high {
                    return Err(format!("uniform needs finite low < high, got [{low}, {high}]"));
                }
            }
            Self::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
                    return Err(format!("normal needs finite mean and std_dev > 0, got {std_dev}"));
                }
            }
            Self::LogUniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low <= 0.0 || low >= high {
                    return Err(format!("log_uniform needs 0 < low < high, got [{low}, {high}]"));
                }
            }
        }
        Ok(())
    }
}
