//! False-discovery-rate configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_FDR_ALPHA;

/// How discoveries propagate along the ranked candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepRule {
    /// Benjamini-Hochberg: the largest passing rank discovers every rank above it.
    #[default]
    StepUp,
    /// A rank is discovered only if it and every rank above it pass.
    StepDown,
}

impl StepRule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::StepUp => "step_up",
            Self::StepDown => "step_down",
        }
    }
}

impl fmt::Display for StepRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for the multi-domain FDR controller.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FdrConfig {
    /// Global false-discovery-rate budget. Default: 0.05.
    pub alpha: Option<f64>,
    /// Step rule. Default: step-up.
    pub step_rule: Option<StepRule>,
}

impl FdrConfig {
    pub fn effective_alpha(&self) -> f64 {
        self.alpha.unwrap_or(DEFAULT_FDR_ALPHA)
    }

    pub fn effective_step_rule(&self) -> StepRule {
        self.step_rule.unwrap_or_default()
    }
}
