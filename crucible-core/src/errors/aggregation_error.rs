//! Domain aggregation errors.

use super::error_code::{self, CrucibleErrorCode};

/// Errors that can occur while combining records into a domain aggregate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("No records to aggregate")]
    EmptyDomain,

    #[error("Record {index} belongs to {found}, aggregate is {expected}")]
    MixedDomain {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Record {index} has not been annotated by the systematic estimator")]
    NotAnnotated { index: usize },
}

impl CrucibleErrorCode for AggregationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDomain => error_code::EMPTY_DOMAIN,
            Self::MixedDomain { .. } => error_code::MIXED_DOMAIN,
            Self::NotAnnotated { .. } => error_code::INVALID_RECORD,
        }
    }
}
