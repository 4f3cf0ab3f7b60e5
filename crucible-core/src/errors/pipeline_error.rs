//! Run-aborting pipeline errors.

use super::error_code::{self, CrucibleErrorCode};
use super::{BlindError, ConfigError, FdrError};

/// Errors that abort a validation run.
///
/// Record, aggregation and sampling failures never appear here: they are
/// caught at the prediction boundary and become inconclusive verdicts.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("FDR error: {0}")]
    Fdr(#[from] FdrError),

    #[error("Blind analysis error: {0}")]
    Blind(#[from] BlindError),

    #[error("Pipeline cancelled")]
    Cancelled,
}

impl CrucibleErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Fdr(e) => e.error_code(),
            Self::Blind(e) => e.error_code(),
            Self::Cancelled => error_code::CANCELLED,
        }
    }
}
