//! False-discovery-rate controller errors. Configuration-level, fatal.

use super::error_code::{self, CrucibleErrorCode};

/// Errors that can occur while configuring or running the FDR controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FdrError {
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid significance for {prediction}: {value} is not a p-value")]
    InvalidSignificance { prediction: String, value: f64 },

    #[error("Invalid FDR alpha {0}: must be in (0, 1)")]
    InvalidAlpha(f64),
}

impl CrucibleErrorCode for FdrError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidWeights(_) | Self::InvalidAlpha(_) => error_code::INVALID_WEIGHTS,
            Self::InvalidSignificance { .. } => error_code::INVALID_SIGNIFICANCE,
        }
    }
}
