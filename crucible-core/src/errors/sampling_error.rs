//! Evidence estimation errors. All of them are non-fatal for a run.

use super::error_code::{self, CrucibleErrorCode};

/// Errors raised by the nested-sampling evidence estimator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error(
        "Sampling did not converge after {iterations} iterations: \
         remaining dlogz {remaining_dlogz:.4} > {tolerance}"
    )]
    DidNotConverge {
        iterations: usize,
        remaining_dlogz: f64,
        tolerance: f64,
    },

    #[error("Sampling did not converge: log-evidence error {log_evidence_error:.4} > {tolerance}")]
    EvidenceTooUncertain { log_evidence_error: f64, tolerance: f64 },

    #[error("Invalid prior for {parameter}: {message}")]
    InvalidPrior { parameter: String, message: String },

    #[error("Sampler configuration invalid: {0}")]
    InvalidSettings(String),

    #[error("Sampling cancelled")]
    Cancelled,

    #[error("Sampling timed out after {elapsed_ms}ms")]
    TimedOut { elapsed_ms: u64 },
}

impl CrucibleErrorCode for SamplingError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DidNotConverge { .. } | Self::EvidenceTooUncertain { .. } => {
                error_code::SAMPLING_DID_NOT_CONVERGE
            }
            Self::InvalidPrior { .. } | Self::InvalidSettings(_) => error_code::INVALID_PRIOR,
            Self::Cancelled | Self::TimedOut { .. } => error_code::CANCELLED,
        }
    }
}
