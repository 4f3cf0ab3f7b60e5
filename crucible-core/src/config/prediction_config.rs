//! Per-prediction configuration: the pre-registered falsification condition
//! and the model-comparison setup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONFIRMATION_BAND, DEFAULT_NULL_REFERENCE};
use crate::types::{FalsificationCondition, FalsificationDirection, PriorDistribution};

/// The null model a prediction is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NullModelConfig {
    /// Observations centred on the condition's `null_reference`.
    #[default]
    Reference,
    /// The prediction shifted by a free deviation with this prior.
    FreeDeviation { prior: PriorDistribution },
}

/// Configuration for one prediction, keyed by prediction id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PredictionConfig {
    /// Falsifying deviation sign. Default: either.
    pub direction: Option<FalsificationDirection>,
    /// Confirmation band in standard deviations. Default: [-2, 2].
    pub confirmation_band: Option<(f64, f64)>,
    /// Null model reference value. Default: 0.
    pub null_reference: Option<f64>,
    /// Priors on nuisance parameters (`offset`, `error_scale`).
    pub prior: BTreeMap<String, PriorDistribution>,
    /// Null model. Default: reference.
    pub null_model: Option<NullModelConfig>,
}

impl PredictionConfig {
    /// The falsification condition to freeze for this prediction.
    pub fn condition(&self) -> FalsificationCondition {
        FalsificationCondition {
            direction: self.direction.unwrap_or_default(),
            confirmation_band: self.confirmation_band.unwrap_or(DEFAULT_CONFIRMATION_BAND),
            null_reference: self.null_reference.unwrap_or(DEFAULT_NULL_REFERENCE),
        }
    }

    pub fn effective_null_model(&self) -> NullModelConfig {
        self.null_model.unwrap_or_default()
    }
}
