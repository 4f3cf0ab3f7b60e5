//! Verdict configuration.

use serde::{Deserialize, Serialize};

use crate::constants::BAYES_FACTOR_SUBSTANTIAL;

/// Configuration for the verdict reporter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VerdictConfig {
    /// Whether a confirmation also needs Bayes-factor support for the
    /// predicted model. Default: true.
    pub require_bayes_support: Option<bool>,
    /// Smallest log Bayes factor that counts as support. Default: ln 3, the
    /// "substantial" step of the Jeffreys scale.
    pub min_log_bayes_factor: Option<f64>,
}

impl VerdictConfig {
    pub fn effective_require_bayes_support(&self) -> bool {
        self.require_bayes_support.unwrap_or(true)
    }

    /// The log Bayes factor a confirmation needs, or `None` when Bayes-factor
    /// support is not required.
    pub fn effective_min_log_bayes_factor(&self) -> Option<f64> {
        self.effective_require_bayes_support()
            .then(|| self.min_log_bayes_factor.unwrap_or(BAYES_FACTOR_SUBSTANTIAL.ln()))
    }
}
