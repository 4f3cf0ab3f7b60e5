//! End-to-end validation runs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crucible_analysis::blind::BlindAnalysisGate;
use crucible_analysis::measurement::RawMeasurement;
use crucible_analysis::pipeline::ValidationPipeline;
use crucible_analysis::reporters::console::ConsoleReporter;
use crucible_analysis::reporters::json::JsonReporter;
use crucible_analysis::reporters::{create_reporter, Reporter};
use crucible_analysis::verdict::{Decision, HypothesisTest, InconclusiveReason};
use crucible_core::config::{CrucibleConfig, NullModelConfig, StepRule};
use crucible_core::errors::{BlindError, PipelineError};
use crucible_core::events::{
    RecordRejectedEvent, UnblindedEvent, ValidationEventHandler, VerdictIssuedEvent,
};
use crucible_core::traits::Cancellable;
use crucible_core::types::{Domain, FalsificationCondition, PredictionId, PriorDistribution};

const CONFIG: &str = r#"
[sampler]
seed = 42
live_points = 100

[predictions.f_nl_equilateral]
direction = "either"
confirmation_band = [-2.0, 2.0]

[predictions.tau_integration]
direction = "either"

[predictions.gamma_coupling]
direction = "above"
"#;

fn pipeline() -> ValidationPipeline {
    ValidationPipeline::new(CrucibleConfig::from_toml(CONFIG).unwrap()).unwrap()
}

fn preregistered(pipeline: &ValidationPipeline) -> BlindAnalysisGate {
    let gate = BlindAnalysisGate::new();
    pipeline.preregister(&gate).unwrap();
    gate
}

/// Records sitting exactly on predictions that are far from the null reference.
fn on_prediction_records() -> Vec<RawMeasurement> {
    vec![
        RawMeasurement::new("f_nl_equilateral", Domain::Cosmology, -26.0, -26.0, 0.5)
            .with_source("CMB bispectrum"),
        RawMeasurement::new("f_nl_equilateral", Domain::Cosmology, -26.0, -26.0, 0.8),
        RawMeasurement::new("tau_integration", Domain::Neuroscience, 120.0, 120.0, 2.0),
        RawMeasurement::new("gamma_coupling", Domain::FundamentalPhysics, 1.5, 1.5, 0.01),
    ]
}

#[test]
fn test_three_domains_at_zero_deviation_are_confirmed() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);
    let report = pipeline.run(&gate, on_prediction_records()).unwrap();

    assert_eq!(report.verdicts.len(), 3);
    for verdict in &report.verdicts {
        assert_eq!(verdict.decision, Decision::Confirmed, "{}", verdict.prediction_id);
        assert_eq!(verdict.test, Some(HypothesisTest::Confirmation));
        assert_eq!(verdict.z_score, Some(0.0));
        assert!(verdict.adjusted_significance.unwrap() <= 0.05);
    }
    assert_eq!(report.domains.len(), 3);
    assert!(report.domains.iter().all(|d| d.decision == Decision::Confirmed));
    assert_eq!(report.discoveries, 3);
    assert!(gate.is_unblinded());
}

#[test]
fn test_six_sigma_deviation_with_systematic_is_falsified() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);

    // Complexity ratio 0.01 is above 1/300, so a systematic term is added.
    // Place the observation six effective sigmas above the prediction.
    let sigma_obs: f64 = 0.1;
    let ratio: f64 = 0.01;
    let sigma_sys = 0.5 * sigma_obs * (ratio - 1.0 / 300.0) / ratio;
    let sigma_eff = (sigma_obs * sigma_obs + sigma_sys * sigma_sys).sqrt();
    let records = vec![RawMeasurement::new(
        "gamma_coupling",
        Domain::FundamentalPhysics,
        0.0,
        6.0 * sigma_eff,
        sigma_obs,
    )
    .with_complexity(ratio, 1.0)];

    let report = pipeline.run(&gate, records).unwrap();
    let verdict = report.verdict(&PredictionId::from("gamma_coupling")).unwrap();
    assert_eq!(verdict.decision, Decision::Falsified);
    assert_eq!(verdict.test, Some(HypothesisTest::Falsification));
    assert!((verdict.z_score.unwrap() - 6.0).abs() < 1e-9);
    assert!(verdict.raw_significance.unwrap() < 1e-8);

    let physics = report.domain(Domain::FundamentalPhysics).unwrap();
    assert_eq!(physics.decision, Decision::Falsified);

    // The other two predictions had no data.
    for id in ["f_nl_equilateral", "tau_integration"] {
        let verdict = report.verdict(&PredictionId::from(id)).unwrap();
        assert_eq!(verdict.reason, Some(InconclusiveReason::EmptyDomain));
        assert_eq!(verdict.domain, None);
    }
}

#[test]
fn test_deviation_against_frozen_direction_is_inconclusive() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);
    // gamma_coupling only falsifies from above.
    let records = vec![RawMeasurement::new(
        "gamma_coupling",
        Domain::FundamentalPhysics,
        1.0,
        0.4,
        0.1,
    )];
    let report = pipeline.run(&gate, records).unwrap();
    let verdict = report.verdict(&PredictionId::from("gamma_coupling")).unwrap();
    assert_eq!(verdict.decision, Decision::Inconclusive);
    assert_eq!(verdict.reason, Some(InconclusiveReason::DirectionMismatch));
}

#[test]
fn test_rejected_and_unregistered_records() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);
    let records = vec![
        RawMeasurement::new("tau_integration", Domain::Neuroscience, 1.0, 1.0, 0.0),
        RawMeasurement::new("tau_integration", Domain::Neuroscience, 1.0, f64::NAN, 1.0),
        RawMeasurement::new("dark_photon_mass", Domain::FundamentalPhysics, 1.0, 1.0, 0.1),
        RawMeasurement::new("gamma_coupling", Domain::FundamentalPhysics, 1.0, 1.0, 0.1)
            .with_complexity(1.0, 0.0),
    ];
    let report = pipeline.run(&gate, records).unwrap();

    assert_eq!(report.records_total, 4);
    assert_eq!(report.records_rejected, 3);

    let tau = report.verdict(&PredictionId::from("tau_integration")).unwrap();
    assert_eq!(tau.reason, Some(InconclusiveReason::InvalidRecord));
    assert_eq!(tau.records_rejected, 2);

    let stray = report.verdict(&PredictionId::from("dark_photon_mass")).unwrap();
    assert_eq!(stray.reason, Some(InconclusiveReason::NotPreregistered));
    assert_eq!(stray.domain, Some(Domain::FundamentalPhysics));

    let gamma = report.verdict(&PredictionId::from("gamma_coupling")).unwrap();
    assert_eq!(gamma.reason, Some(InconclusiveReason::InvalidRecord));

    assert_eq!(report.discoveries, 0);
    assert_eq!(report.count(Decision::Inconclusive), 4);
}

#[test]
fn test_run_requires_preregistration() {
    let pipeline = pipeline();
    let gate = BlindAnalysisGate::new();
    let err = pipeline.run(&gate, on_prediction_records()).unwrap_err();
    assert!(matches!(err, PipelineError::Blind(BlindError::NotFrozen)));
    assert!(!gate.is_unblinded());
}

#[test]
fn test_second_run_on_same_gate_fails() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);
    pipeline.run(&gate, on_prediction_records()).unwrap();
    let err = pipeline.run(&gate, on_prediction_records()).unwrap_err();
    assert!(matches!(err, PipelineError::Blind(BlindError::AlreadyUnblinded)));
}

#[test]
fn test_changed_alpha_after_freeze_is_violation() {
    let gate = preregistered(&pipeline());
    let mut config = CrucibleConfig::from_toml(CONFIG).unwrap();
    config.fdr.alpha = Some(0.2);
    let relaxed = ValidationPipeline::new(config).unwrap();

    let err = relaxed.run(&gate, on_prediction_records()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Blind(BlindError::BlindViolation { ref parameter }) if parameter == "fdr_alpha"
    ));
    assert!(!gate.is_unblinded());
}

#[test]
fn test_changed_settings_after_freeze_are_violations() {
    type Edit = fn(&mut CrucibleConfig);
    let cases: [(&str, Edit); 5] = [
        ("fdr_step_rule", |c| c.fdr.step_rule = Some(StepRule::StepDown)),
        ("min_log_bayes_factor", |c| c.verdict.min_log_bayes_factor = Some(1e6)),
        ("sampler", |c| c.sampler.seed = Some(43)),
        ("prediction.tau_integration.model", |c| {
            c.predictions.get_mut("tau_integration").unwrap().prior.insert(
                "offset".to_string(),
                PriorDistribution::Normal { mean: 0.0, std_dev: 1.0 },
            );
        }),
        ("prediction.gamma_coupling.model", |c| {
            c.predictions.get_mut("gamma_coupling").unwrap().null_model =
                Some(NullModelConfig::FreeDeviation {
                    prior: PriorDistribution::Uniform { low: -1.0, high: 1.0 },
                });
        }),
    ];

    for (setting, edit) in cases {
        let gate = preregistered(&pipeline());
        let mut config = CrucibleConfig::from_toml(CONFIG).unwrap();
        edit(&mut config);
        let changed = ValidationPipeline::new(config).unwrap();

        let err = changed.run(&gate, on_prediction_records()).unwrap_err();
        assert!(
            matches!(
                err,
                PipelineError::Blind(BlindError::BlindViolation { ref parameter }) if parameter == setting
            ),
            "{setting}: {err:?}"
        );
        assert!(!gate.is_unblinded(), "{setting}");
    }
}

#[test]
fn test_gate_without_frozen_parameters_is_violation() {
    let pipeline = pipeline();
    let gate = BlindAnalysisGate::new();
    let mut thresholds = BTreeMap::new();
    thresholds.insert(PredictionId::from("tau_integration"), FalsificationCondition::default());
    gate.freeze(thresholds).unwrap();

    let err = pipeline.run(&gate, on_prediction_records()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Blind(BlindError::BlindViolation { ref parameter }) if parameter == "fdr_alpha"
    ));
    assert!(!gate.is_unblinded());
}

#[test]
fn test_overflowing_complexity_ratio_rejects_only_that_record() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);
    let mut records = on_prediction_records();
    records.retain(|r| r.prediction_id.as_str() != "gamma_coupling");
    records.push(
        RawMeasurement::new("gamma_coupling", Domain::FundamentalPhysics, 1.5, 1.5, 0.01)
            .with_complexity(1e300, 1e-10),
    );

    let report = pipeline.run(&gate, records).unwrap();
    assert_eq!(report.records_rejected, 1);
    let gamma = report.verdict(&PredictionId::from("gamma_coupling")).unwrap();
    assert_eq!(gamma.reason, Some(InconclusiveReason::InvalidRecord));
    for id in ["f_nl_equilateral", "tau_integration"] {
        let verdict = report.verdict(&PredictionId::from(id)).unwrap();
        assert_eq!(verdict.decision, Decision::Confirmed, "{id}");
    }
}

#[test]
fn test_huge_finite_complexity_keeps_run_alive() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);
    let mut records = on_prediction_records();
    for record in records.iter_mut().filter(|r| r.prediction_id.as_str() == "f_nl_equilateral") {
        record.complexity_score = 1e308;
    }

    let report = pipeline.run(&gate, records).unwrap();
    assert_eq!(report.records_rejected, 0);
    assert_eq!(report.verdicts.len(), 3);
    let f_nl = report.fdr.get(&PredictionId::from("f_nl_equilateral")).unwrap();
    assert!(f_nl.weight > 0.0 && f_nl.weight.is_finite());
}

const SAMPLING_CONFIG: &str = r#"
[sampler]
seed = 7
live_points = 50
max_iterations = 10

[predictions.f_nl_equilateral.prior.offset]
kind = "normal"
mean = 0.0
std_dev = 0.5

[predictions.tau_integration]
direction = "either"
"#;

#[test]
fn test_unconverged_sampler_is_inconclusive_and_run_continues() {
    let pipeline =
        ValidationPipeline::new(CrucibleConfig::from_toml(SAMPLING_CONFIG).unwrap()).unwrap();
    let gate = preregistered(&pipeline);
    let records: Vec<RawMeasurement> = on_prediction_records()
        .into_iter()
        .filter(|r| r.prediction_id.as_str() != "gamma_coupling")
        .collect();

    let report = pipeline.run(&gate, records).unwrap();
    assert_eq!(report.verdicts.len(), 2);

    let f_nl = report.verdict(&PredictionId::from("f_nl_equilateral")).unwrap();
    assert_eq!(f_nl.decision, Decision::Inconclusive);
    assert_eq!(f_nl.reason, Some(InconclusiveReason::SamplingDidNotConverge));
    assert!(f_nl.log_bayes_factor.is_none());
    // Still counted by the FDR correction.
    assert!(report.fdr.get(&PredictionId::from("f_nl_equilateral")).is_some());
    assert_eq!(report.fdr.len(), 2);

    let tau = report.verdict(&PredictionId::from("tau_integration")).unwrap();
    assert_eq!(tau.decision, Decision::Confirmed);
}

#[test]
fn test_missing_seed_is_rejected() {
    let config = CrucibleConfig::from_toml("[fdr]\nalpha = 0.05\n").unwrap();
    assert!(matches!(
        ValidationPipeline::new(config),
        Err(PipelineError::Config(_))
    ));
}

#[test]
fn test_cancelled_run() {
    let pipeline = pipeline();
    pipeline.cancellation_token().cancel();
    let gate = preregistered(&pipeline);
    let err = pipeline.run(&gate, on_prediction_records()).unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
}

#[derive(Default)]
struct CountingHandler {
    unblinded: AtomicUsize,
    rejected: AtomicUsize,
    verdicts: AtomicUsize,
}

impl ValidationEventHandler for CountingHandler {
    fn on_unblinded(&self, _event: &UnblindedEvent) {
        self.unblinded.fetch_add(1, Ordering::SeqCst);
    }

    fn on_record_rejected(&self, _event: &RecordRejectedEvent) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
    }

    fn on_verdict_issued(&self, _event: &VerdictIssuedEvent) {
        self.verdicts.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_events_are_emitted() {
    let handler = Arc::new(CountingHandler::default());
    let pipeline = pipeline().with_event_handler(handler.clone());
    let gate = preregistered(&pipeline);
    let mut records = on_prediction_records();
    records.push(RawMeasurement::new("tau_integration", Domain::Neuroscience, 1.0, 1.0, -1.0));
    pipeline.run(&gate, records).unwrap();

    assert_eq!(handler.unblinded.load(Ordering::SeqCst), 1);
    assert_eq!(handler.rejected.load(Ordering::SeqCst), 1);
    assert_eq!(handler.verdicts.load(Ordering::SeqCst), 3);
}

#[test]
fn test_reporters_render_report() {
    let pipeline = pipeline();
    let gate = preregistered(&pipeline);
    let report = pipeline.run(&gate, on_prediction_records()).unwrap();

    let json = JsonReporter.generate(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["confirmed"], 3);
    assert_eq!(value["verdicts"].as_array().unwrap().len(), 3);
    assert_eq!(value["verdicts"][0]["decision"], "confirmed");
    assert_eq!(value["unblinding"]["event"], "unblinded");

    let console = ConsoleReporter::new(false).generate(&report).unwrap();
    assert!(console.contains("f_nl_equilateral"));
    assert!(console.contains("3 confirmed"));
    assert!(!console.contains("\x1b["));

    assert!(create_reporter("json").is_some());
    assert!(create_reporter("sarif").is_none());
}
