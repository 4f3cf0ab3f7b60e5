//! Pre-registered falsification conditions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONFIRMATION_BAND, DEFAULT_NULL_REFERENCE};
use crate::errors::ConfigError;

/// Sign of the deviation (observed minus predicted) that falsifies a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FalsificationDirection {
    /// Observed values above the prediction falsify it.
    Above,
    /// Observed values below the prediction falsify it.
    Below,
    /// A deviation of either sign falsifies it.
    #[default]
    Either,
}

impl FalsificationDirection {
    /// Whether a deviation with this z-score points in the falsifying direction.
    pub fn matches(&self, z: f64) -> bool {
        match self {
            Self::Above => z > 0.0,
            Self::Below => z < 0.0,
            Self::Either => z != 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
            Self::Either => "either",
        }
    }
}

impl fmt::Display for FalsificationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The per-prediction decision threshold frozen before unblinding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalsificationCondition {
    /// Deviation sign that counts as falsification.
    #[serde(default)]
    pub direction: FalsificationDirection,
    /// Inclusive band, in standard deviations of the aggregate deviation,
    /// within which the prediction counts as confirmed.
    #[serde(default = "default_band")]
    pub confirmation_band: (f64, f64),
    /// Value the null model predicts for the measured quantity.
    #[serde(default = "default_null_reference")]
    pub null_reference: f64,
}

fn default_band() -> (f64, f64) {
    DEFAULT_CONFIRMATION_BAND
}

fn default_null_reference() -> f64 {
    DEFAULT_NULL_REFERENCE
}

impl Default for FalsificationCondition {
    fn default() -> Self {
        Self {
            direction: FalsificationDirection::default(),
            confirmation_band: DEFAULT_CONFIRMATION_BAND,
            null_reference: DEFAULT_NULL_REFERENCE,
        }
    }
}

impl FalsificationCondition {
    pub fn new(direction: FalsificationDirection, confirmation_band: (f64, f64)) -> Self {
        Self {
            direction,
            confirmation_band,
            null_reference: DEFAULT_NULL_REFERENCE,
        }
    }

    pub fn with_null_reference(mut self, null_reference: f64) -> Self {
        self.null_reference = null_reference;
        self
    }

    /// Whether a z-score lies inside the confirmation band (inclusive).
    pub fn within_band(&self, z: f64) -> bool {
        let (low, high) = self.confirmation_band;
        z >= low && z <= high
    }

    /// Check that the band is ordered and every value is finite.
    pub fn validate(&self, prediction: &str) -> Result<(), ConfigError> {
        let (low, high) = self.confirmation_band;
        if !low.is_finite() || !high.is_finite() || low > high {
            return Err(ConfigError::InvalidValue {
                field: format!("predictions.{prediction}.confirmation_band"),
                message: format!("expected finite low <= high, got ({low}, {high})"),
            });
        }
        if !self.null_reference.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: format!("predictions.{prediction}.null_reference"),
                message: "must be finite".to_string(),
            });
        }
        Ok(())
    }
}
