//! CrucibleErrorCode trait for machine-readable error reporting.

/// Trait for mapping Crucible errors to stable error code strings.
/// Every error enum implements this so orchestration scripts and
/// inconclusive verdicts can carry a code rather than free text.
pub trait CrucibleErrorCode {
    /// Returns the error code string (e.g., "EMPTY_DOMAIN").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const INVALID_RECORD: &str = "INVALID_RECORD";
pub const EMPTY_DOMAIN: &str = "EMPTY_DOMAIN";
pub const MIXED_DOMAIN: &str = "MIXED_DOMAIN";
pub const SAMPLING_DID_NOT_CONVERGE: &str = "SAMPLING_DID_NOT_CONVERGE";
pub const INVALID_PRIOR: &str = "INVALID_PRIOR";
pub const CANCELLED: &str = "CANCELLED";
pub const INVALID_WEIGHTS: &str = "INVALID_WEIGHTS";
pub const INVALID_SIGNIFICANCE: &str = "INVALID_SIGNIFICANCE";
pub const ALREADY_FROZEN: &str = "ALREADY_FROZEN";
pub const ALREADY_UNBLINDED: &str = "ALREADY_UNBLINDED";
pub const BLIND_VIOLATION: &str = "BLIND_VIOLATION";
pub const NOT_FROZEN: &str = "NOT_FROZEN";
pub const BLIND_LOG_ERROR: &str = "BLIND_LOG_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
