//! Tests for the Crucible error handling system.

use crucible_core::errors::error_code::{self, CrucibleErrorCode};
use crucible_core::errors::*;

#[test]
fn test_taxonomy_codes() {
    assert_eq!(RecordError::AlreadyAnnotated.error_code(), error_code::INVALID_RECORD);
    assert_eq!(
        RecordError::NonPositivePrecision(0.0).error_code(),
        error_code::INVALID_RECORD
    );
    assert_eq!(
        RecordError::NonFiniteRatio { complexity: 1e300, precision: 1e-10 }.error_code(),
        error_code::INVALID_RECORD
    );
    assert_eq!(AggregationError::EmptyDomain.error_code(), error_code::EMPTY_DOMAIN);
    assert_eq!(
        SamplingError::DidNotConverge {
            iterations: 10,
            remaining_dlogz: 3.0,
            tolerance: 0.01
        }
        .error_code(),
        error_code::SAMPLING_DID_NOT_CONVERGE
    );
    assert_eq!(
        FdrError::InvalidWeights("zero".into()).error_code(),
        error_code::INVALID_WEIGHTS
    );
    assert_eq!(BlindError::AlreadyFrozen.error_code(), error_code::ALREADY_FROZEN);
    assert_eq!(BlindError::AlreadyUnblinded.error_code(), error_code::ALREADY_UNBLINDED);
    assert_eq!(
        BlindError::BlindViolation { parameter: "fdr_alpha".into() }.error_code(),
        error_code::BLIND_VIOLATION
    );
}

#[test]
fn test_pipeline_error_preserves_inner_code() {
    let pipeline: PipelineError = BlindError::AlreadyUnblinded.into();
    assert!(matches!(pipeline, PipelineError::Blind(BlindError::AlreadyUnblinded)));
    assert_eq!(pipeline.error_code(), error_code::ALREADY_UNBLINDED);

    let pipeline: PipelineError = FdrError::InvalidAlpha(2.0).into();
    assert_eq!(pipeline.error_code(), error_code::INVALID_WEIGHTS);

    assert_eq!(PipelineError::Cancelled.error_code(), error_code::CANCELLED);
}

#[test]
fn test_coded_string_format() {
    let err = AggregationError::EmptyDomain;
    assert_eq!(err.coded_string(), "[EMPTY_DOMAIN] No records to aggregate");
}
