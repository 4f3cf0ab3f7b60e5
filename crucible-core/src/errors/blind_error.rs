//! Blind-analysis protocol errors. Always fatal.

use super::error_code::{self, CrucibleErrorCode};

/// Misuse of the blind-analysis lifecycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlindError {
    #[error("Thresholds are already frozen")]
    AlreadyFrozen,

    #[error("Analysis is already unblinded")]
    AlreadyUnblinded,

    #[error("Blind violation: {parameter} cannot change after unblinding")]
    BlindViolation { parameter: String },

    #[error("Thresholds must be frozen before unblinding")]
    NotFrozen,

    #[error("Invalid frozen parameter {parameter}: {message}")]
    InvalidParameter { parameter: String, message: String },

    #[error("Blind log error: {0}")]
    Log(String),

    #[error("Blind gate lock poisoned")]
    Poisoned,
}

impl CrucibleErrorCode for BlindError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyFrozen => error_code::ALREADY_FROZEN,
            Self::AlreadyUnblinded => error_code::ALREADY_UNBLINDED,
            Self::BlindViolation { .. } | Self::InvalidParameter { .. } | Self::Poisoned => {
                error_code::BLIND_VIOLATION
            }
            Self::NotFrozen => error_code::NOT_FROZEN,
            Self::Log(_) => error_code::BLIND_LOG_ERROR,
        }
    }
}
