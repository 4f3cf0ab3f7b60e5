//! Systematic budget configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_INFLATION_SCALE, DEFAULT_SYSTEMATIC_THRESHOLD};

/// Configuration for the systematic budget estimator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SystematicConfig {
    /// Complexity-to-precision ratio above which a systematic term is included. Default: 1/300.
    pub threshold: Option<f64>,
    /// Saturation multiple of the observed uncertainty for the inflation term. Default: 0.5.
    pub inflation_scale: Option<f64>,
}

impl SystematicConfig {
    pub fn effective_threshold(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_SYSTEMATIC_THRESHOLD)
    }

    pub fn effective_inflation_scale(&self) -> f64 {
        self.inflation_scale.unwrap_or(DEFAULT_INFLATION_SCALE)
    }
}
