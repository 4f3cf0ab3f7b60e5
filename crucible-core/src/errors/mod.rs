//! Error handling for Crucible.
//! One error enum per subsystem, `thiserror` only.

pub mod aggregation_error;
pub mod blind_error;
pub mod config_error;
pub mod error_code;
pub mod fdr_error;
pub mod pipeline_error;
pub mod record_error;
pub mod sampling_error;

pub use aggregation_error::AggregationError;
pub use blind_error::BlindError;
pub use config_error::ConfigError;
pub use error_code::CrucibleErrorCode;
pub use fdr_error::FdrError;
pub use pipeline_error::PipelineError;
pub use record_error::RecordError;
pub use sampling_error::SamplingError;
