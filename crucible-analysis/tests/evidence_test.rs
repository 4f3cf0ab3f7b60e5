//! Nested-sampling evidence and model comparison.

use crucible_analysis::aggregation::DomainAggregator;
use crucible_analysis::evidence::{
    BayesianComparator, GaussianModel, NestedSampler, NullModel, Observation, PriorSpec,
    SamplerSettings,
};
use crucible_analysis::measurement::{MeasurementRecord, RawMeasurement};
use crucible_analysis::systematic::SystematicEstimator;
use crucible_core::config::SamplerConfig;
use crucible_core::errors::{CrucibleErrorCode, SamplingError};
use crucible_core::errors::error_code;
use crucible_core::traits::{Cancellable, CancellationToken};
use crucible_core::types::{Domain, PriorDistribution};

fn record(predicted: f64, observed: f64, sigma: f64) -> MeasurementRecord {
    let mut record = MeasurementRecord::new(RawMeasurement::new(
        "g_coupling",
        Domain::FundamentalPhysics,
        predicted,
        observed,
        sigma,
    ))
    .unwrap();
    SystematicEstimator::default().annotate(&mut record).unwrap();
    record
}

fn offset_prior(std_dev: f64) -> PriorSpec {
    let mut prior = PriorSpec::new();
    prior
        .insert("offset", PriorDistribution::Normal { mean: 0.0, std_dev })
        .unwrap();
    prior
}

fn settings() -> SamplerSettings {
    SamplerSettings {
        live_points: 200,
        ..SamplerSettings::default()
    }
}

#[test]
fn test_evidence_matches_analytic_gaussian_marginal() {
    // y = 0.3 ± 0.1, offset ~ N(0, 0.5): Z = N(0.3; 0, sqrt(0.1² + 0.5²)).
    let model = GaussianModel::new(
        vec![Observation {
            observed: 0.3,
            center: 0.0,
            sigma: 0.1,
        }],
        offset_prior(0.5),
    );
    let variance: f64 = 0.1 * 0.1 + 0.5 * 0.5;
    let analytic = -0.5 * 0.3 * 0.3 / variance - 0.5 * (2.0 * std::f64::consts::PI * variance).ln();

    let estimate = NestedSampler::new(settings()).run(&model, 2024, None).unwrap();
    assert!(
        (estimate.log_evidence - analytic).abs() < 0.3,
        "ln Z = {} (± {}), analytic {}",
        estimate.log_evidence,
        estimate.log_evidence_error,
        analytic
    );
    assert!(estimate.log_evidence_error > 0.0);
    assert!(estimate.iterations > 0);
}

#[test]
fn test_sampler_is_reproducible_bit_for_bit() {
    let model = GaussianModel::new(
        vec![
            Observation { observed: 0.3, center: 0.0, sigma: 0.1 },
            Observation { observed: 0.1, center: 0.0, sigma: 0.2 },
        ],
        offset_prior(0.5),
    );
    let sampler = NestedSampler::new(settings());
    let a = sampler.run(&model, 99, None).unwrap();
    let b = sampler.run(&model, 99, None).unwrap();
    assert_eq!(a.log_evidence.to_bits(), b.log_evidence.to_bits());
    assert_eq!(a.iterations, b.iterations);

    let c = sampler.run(&model, 100, None).unwrap();
    assert_ne!(a.log_evidence.to_bits(), c.log_evidence.to_bits());
}

#[test]
fn test_comparison_reproducible_with_same_seed() {
    let aggregate = DomainAggregator::new()
        .aggregate(vec![record(0.3, 0.31, 0.1), record(0.3, 0.28, 0.05)])
        .unwrap();
    let comparator = BayesianComparator::new(settings());
    let null = NullModel::Reference { value: 0.0 };
    let a = comparator.compare(&aggregate, &offset_prior(0.2), &null, 5).unwrap();
    let b = comparator.compare(&aggregate, &offset_prior(0.2), &null, 5).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.seed, 5);
    // Data sit on the prediction and far from zero.
    assert!(a.log_bayes_factor > 0.0);
}

#[test]
fn test_iteration_budget_reports_non_convergence() {
    let config = SamplerConfig {
        max_iterations: Some(10),
        ..SamplerConfig::default()
    };
    let comparator = BayesianComparator::from_config(&config);
    let err = comparator
        .compare_record(
            &record(0.3, 0.3, 0.1),
            &offset_prior(0.5),
            &NullModel::Reference { value: 0.0 },
            1,
        )
        .unwrap_err();
    assert!(matches!(err, SamplingError::DidNotConverge { iterations: 10, .. }));
    assert_eq!(err.error_code(), error_code::SAMPLING_DID_NOT_CONVERGE);
}

#[test]
fn test_free_deviation_null_penalises_extra_parameter() {
    // With data exactly on the prediction, a null that can also reach the
    // prediction pays an Occam penalty for its wide deviation prior.
    let comparator = BayesianComparator::new(settings());
    let comparison = comparator
        .compare_record(
            &record(0.3, 0.3, 0.1),
            &PriorSpec::new(),
            &NullModel::FreeDeviation {
                prior: PriorDistribution::Uniform { low: -5.0, high: 5.0 },
            },
            11,
        )
        .unwrap();
    // Occam factor ≈ ln(10 / (0.1 · sqrt(2π))) ≈ 3.69.
    assert!(
        (comparison.log_bayes_factor - 3.69).abs() < 0.5,
        "ln B = {}",
        comparison.log_bayes_factor
    );
    assert_eq!(comparison.predicted.iterations, 0);
    assert!(comparison.null.iterations > 0);
}

#[test]
fn test_cancelled_comparator() {
    let token = CancellationToken::new();
    let comparator = BayesianComparator::new(settings()).with_cancellation(token.clone());
    token.cancel();
    assert!(token.is_cancelled());
    let err = comparator
        .compare_record(
            &record(0.3, 0.3, 0.1),
            &offset_prior(0.5),
            &NullModel::Reference { value: 0.0 },
            1,
        )
        .unwrap_err();
    assert_eq!(err, SamplingError::Cancelled);
}

#[test]
fn test_unknown_prior_parameter() {
    let mut prior = PriorSpec::new();
    let err = prior
        .insert("amplitude", PriorDistribution::Uniform { low: 0.0, high: 1.0 })
        .unwrap_err();
    assert_eq!(err.error_code(), error_code::INVALID_PRIOR);
}
