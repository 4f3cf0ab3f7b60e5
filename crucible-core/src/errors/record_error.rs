//! Measurement record errors.

use super::error_code::{self, CrucibleErrorCode};

/// Errors raised while building or annotating a measurement record.
/// Local to the record: the batch continues without it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid record field {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Invalid record: systematic budget already annotated")]
    AlreadyAnnotated,

    #[error("Invalid record: precision_scale must be positive, got {0}")]
    NonPositivePrecision(f64),

    #[error("Invalid record: complexity ratio {complexity}/{precision} is not finite")]
    NonFiniteRatio { complexity: f64, precision: f64 },
}

impl CrucibleErrorCode for RecordError {
    fn error_code(&self) -> &'static str {
        error_code::INVALID_RECORD
    }
}
