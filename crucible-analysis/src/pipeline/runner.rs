//! The validation pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crucible_core::config::CrucibleConfig;
use crucible_core::constants::{
    PARAM_FDR_ALPHA, PARAM_INFLATION_SCALE, PARAM_SYSTEMATIC_THRESHOLD, SETTING_FDR_STEP_RULE,
    SETTING_MIN_LOG_BAYES_FACTOR, SETTING_PREDICTION_PREFIX, SETTING_SAMPLER, VERSION,
};
use crucible_core::errors::{
    BlindError, ConfigError, CrucibleErrorCode, PipelineError, RecordError, SamplingError,
};
use crucible_core::events::{
    NoOpEventHandler, RecordRejectedEvent, RunCompleteEvent, RunStartedEvent,
    SamplingFailedEvent, UnblindedEvent, ValidationEventHandler, VerdictIssuedEvent,
};
use crucible_core::traits::{Cancellable, CancellationToken};
use crucible_core::types::{Domain, FalsificationCondition, PredictionId};

use super::report::ValidationReport;
use crate::aggregation::DomainAggregator;
use crate::blind::BlindAnalysisGate;
use crate::evidence::{BayesianComparator, NullModel, PriorSpec};
use crate::fdr::{complexity_weights, FdrCandidate, FdrController};
use crate::measurement::{MeasurementRecord, RawMeasurement};
use crate::systematic::SystematicEstimator;
use crate::verdict::{
    select_hypothesis_test, AssessmentOutcome, DomainSummary, InconclusiveReason,
    PredictionAssessment, VerdictReporter,
};

const UNBLIND_REASON: &str = "validation run";

/// Records of one prediction after construction and annotation.
#[derive(Debug, Default)]
struct PredictionGroup {
    domain: Option<Domain>,
    records: Vec<MeasurementRecord>,
    rejected: usize,
    first_error: Option<String>,
}

/// Runs a full validation under a blind analysis gate.
pub struct ValidationPipeline {
    config: CrucibleConfig,
    seed: u64,
    settings: BTreeMap<String, String>,
    estimator: SystematicEstimator,
    aggregator: DomainAggregator,
    comparator: BayesianComparator,
    fdr: FdrController,
    reporter: VerdictReporter,
    event_handler: Arc<dyn ValidationEventHandler>,
    cancellation: CancellationToken,
}

impl ValidationPipeline {
    /// Validate `config` and build every stage from it.
    pub fn new(config: CrucibleConfig) -> Result<Self, PipelineError> {
        CrucibleConfig::validate(&config)?;
        let seed = config.sampler.seed.ok_or_else(|| ConfigError::ValidationFailed {
            field: "sampler.seed".to_string(),
            message: "an explicit seed is required".to_string(),
        })?;
        let settings = frozen_settings(&config, seed)?;
        let cancellation = CancellationToken::new();
        Ok(Self {
            seed,
            settings,
            estimator: SystematicEstimator::from_config(&config.systematic),
            aggregator: DomainAggregator::new(),
            comparator: BayesianComparator::from_config(&config.sampler)
                .with_cancellation(cancellation.clone()),
            fdr: FdrController::from_config(&config.fdr)?,
            reporter: VerdictReporter::from_config(&config.verdict),
            event_handler: Arc::new(NoOpEventHandler),
            cancellation,
            config,
        })
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn ValidationEventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    /// Share an external cancellation token with the samplers.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.comparator = self.comparator.with_cancellation(token.clone());
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn config(&self) -> &CrucibleConfig {
        &self.config
    }

    /// Freeze every configured falsification condition and every
    /// verdict-affecting parameter and setting.
    pub fn preregister(&self, gate: &BlindAnalysisGate) -> Result<(), PipelineError> {
        for (name, value) in self.frozen_parameters() {
            gate.freeze_parameter(name, value)?;
        }
        for (name, value) in &self.settings {
            gate.freeze_setting(name, value)?;
        }
        let thresholds: BTreeMap<PredictionId, FalsificationCondition> = self
            .config
            .predictions
            .iter()
            .map(|(id, prediction)| (PredictionId::from(id.as_str()), prediction.condition()))
            .collect();
        gate.freeze(thresholds)?;
        Ok(())
    }

    fn frozen_parameters(&self) -> [(&'static str, f64); 3] {
        [
            (PARAM_FDR_ALPHA, self.fdr.alpha()),
            (PARAM_SYSTEMATIC_THRESHOLD, self.estimator.threshold()),
            (PARAM_INFLATION_SCALE, self.estimator.inflation_scale()),
        ]
    }

    /// Unblind `gate` and produce a verdict for every frozen prediction and
    /// every prediction the records mention.
    pub fn run(
        &self,
        gate: &BlindAnalysisGate,
        raw_records: Vec<RawMeasurement>,
    ) -> Result<ValidationReport, PipelineError> {
        let started = Instant::now();
        let started_at = Utc::now();

        let thresholds = gate.frozen_thresholds()?;
        self.check_frozen_configuration(gate)?;

        let unblinding = gate.unblind(UNBLIND_REASON)?;
        self.event_handler.on_unblinded(&UnblindedEvent {
            sequence: unblinding.sequence,
            timestamp: unblinding.timestamp.to_rfc3339(),
            hash: unblinding.hash,
        });

        let records_total = raw_records.len();
        self.event_handler.on_run_started(&RunStartedEvent {
            record_count: records_total,
            prediction_count: thresholds.len(),
        });
        info!(records = records_total, predictions = thresholds.len(), "validation run started");

        let built: Vec<(usize, PredictionId, Domain, Result<MeasurementRecord, RecordError>)> =
            raw_records
                .into_par_iter()
                .enumerate()
                .map(|(index, raw)| {
                    let prediction_id = raw.prediction_id.clone();
                    let domain = raw.domain;
                    let record = MeasurementRecord::new(raw).and_then(|mut record| {
                        self.estimator.annotate(&mut record)?;
                        Ok(record)
                    });
                    (index, prediction_id, domain, record)
                })
                .collect();

        let mut groups: BTreeMap<PredictionId, PredictionGroup> = BTreeMap::new();
        let mut records_rejected = 0;
        for (index, prediction_id, domain, record) in built {
            let group = groups.entry(prediction_id.clone()).or_default();
            match record {
                Ok(record) => {
                    group.domain.get_or_insert(domain);
                    group.records.push(record);
                }
                Err(e) => {
                    records_rejected += 1;
                    group.rejected += 1;
                    group.first_error.get_or_insert_with(|| e.to_string());
                    warn!(prediction = %prediction_id, index, error = %e, "record rejected");
                    self.event_handler.on_record_rejected(&RecordRejectedEvent {
                        prediction_id: prediction_id.to_string(),
                        index,
                        error_code: e.error_code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        for prediction_id in thresholds.keys() {
            groups.entry(prediction_id.clone()).or_default();
        }

        let assessments: Vec<PredictionAssessment> = groups
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(prediction_id, group)| {
                let condition = thresholds.get(&prediction_id).cloned();
                self.assess(prediction_id, group, condition)
            })
            .collect();

        if self.cancellation.is_cancelled() {
            warn!("validation run cancelled before FDR control");
            return Err(PipelineError::Cancelled);
        }

        // Barrier: every candidate significance is known from here on.
        let tested: Vec<&PredictionAssessment> = assessments
            .iter()
            .filter(|a| a.significance().is_some())
            .collect();
        let scores: Vec<f64> = tested
            .iter()
            .map(|a| a.aggregate().map_or(0.0, |agg| agg.mean_complexity_ratio()))
            .collect();
        let weights = complexity_weights(&scores)?;
        let candidates: Vec<FdrCandidate> = tested
            .iter()
            .zip(&weights)
            .filter_map(|(a, &w)| {
                a.significance()
                    .map(|p| FdrCandidate::new(a.prediction_id.clone(), p).with_weight(w))
            })
            .collect();
        let fdr = self.fdr.adjust(&candidates)?;

        let verdicts = self.reporter.report(&assessments, &fdr);
        for verdict in &verdicts {
            self.event_handler.on_verdict_issued(&VerdictIssuedEvent {
                prediction_id: verdict.prediction_id.to_string(),
                decision: verdict.decision.to_string(),
                reason: verdict.reason.map(|r| r.to_string()),
            });
        }
        let domains = DomainSummary::rollup(&verdicts, &assessments);

        let duration_ms = started.elapsed().as_millis() as u64;
        let discoveries = fdr.discoveries();
        self.event_handler.on_run_complete(&RunCompleteEvent {
            verdict_count: verdicts.len(),
            discoveries,
            duration_ms,
        });
        info!(
            verdicts = verdicts.len(),
            discoveries,
            records_rejected,
            duration_ms,
            "validation run complete"
        );

        Ok(ValidationReport {
            version: VERSION.to_string(),
            started_at,
            alpha: self.fdr.alpha(),
            step_rule: self.fdr.step_rule(),
            records_total,
            records_rejected,
            discoveries,
            verdicts,
            domains,
            fdr,
            unblinding,
            duration_ms,
        })
    }

    /// Fail with `BlindViolation` unless the gate holds exactly the
    /// parameters and settings this pipeline would freeze.
    fn check_frozen_configuration(&self, gate: &BlindAnalysisGate) -> Result<(), BlindError> {
        for (name, value) in self.frozen_parameters() {
            let frozen = gate.parameter(name);
            if frozen != Some(value) {
                warn!(
                    parameter = name,
                    frozen = ?frozen,
                    configured = value,
                    "configuration differs from frozen value"
                );
                return Err(BlindError::BlindViolation {
                    parameter: name.to_string(),
                });
            }
        }

        let frozen_settings = gate.settings();
        let changed = self
            .settings
            .iter()
            .find(|(name, value)| frozen_settings.get(*name) != Some(*value))
            .map(|(name, _)| name.clone())
            .or_else(|| {
                frozen_settings
                    .keys()
                    .find(|name| !self.settings.contains_key(*name))
                    .cloned()
            });
        if let Some(name) = changed {
            warn!(
                setting = %name,
                frozen = ?frozen_settings.get(&name),
                configured = ?self.settings.get(&name),
                "configuration differs from frozen setting"
            );
            return Err(BlindError::BlindViolation { parameter: name });
        }
        Ok(())
    }

    /// Aggregate and score one prediction. Never fails: problems become an
    /// inconclusive outcome.
    fn assess(
        &self,
        prediction_id: PredictionId,
        group: PredictionGroup,
        condition: Option<FalsificationCondition>,
    ) -> PredictionAssessment {
        let failed =
            |reason: InconclusiveReason, detail: String| AssessmentOutcome::Failed { reason, detail };

        let outcome = match &condition {
            None => failed(
                InconclusiveReason::NotPreregistered,
                "no frozen falsification condition".to_string(),
            ),
            Some(_) if group.records.is_empty() && group.rejected > 0 => failed(
                InconclusiveReason::InvalidRecord,
                group
                    .first_error
                    .clone()
                    .unwrap_or_else(|| "every record was rejected".to_string()),
            ),
            Some(condition) => match self.aggregator.aggregate(group.records) {
                Err(e) => failed(InconclusiveReason::from(&e), e.to_string()),
                Ok(aggregate) => {
                    let (test, significance) = select_hypothesis_test(&aggregate, condition);
                    let seed = xxh3_64_with_seed(prediction_id.as_str().as_bytes(), self.seed);
                    let comparison = self.model_setup(&prediction_id, condition).and_then(
                        |(prior, null)| self.comparator.compare(&aggregate, &prior, &null, seed),
                    );
                    if let Err(e) = &comparison {
                        warn!(prediction = %prediction_id, error = %e, "model comparison failed");
                        self.event_handler.on_sampling_failed(&SamplingFailedEvent {
                            prediction_id: prediction_id.to_string(),
                            error_code: e.error_code().to_string(),
                            message: e.to_string(),
                        });
                    }
                    AssessmentOutcome::Tested {
                        aggregate,
                        test,
                        significance,
                        comparison,
                    }
                }
            },
        };

        PredictionAssessment {
            prediction_id,
            domain: group.domain,
            condition,
            records_rejected: group.rejected,
            outcome,
        }
    }

    /// Prior and null model configured for a prediction.
    fn model_setup(
        &self,
        prediction_id: &PredictionId,
        condition: &FalsificationCondition,
    ) -> Result<(PriorSpec, NullModel), SamplingError> {
        match self.config.predictions.get(prediction_id.as_str()) {
            Some(prediction) => Ok((
                PriorSpec::from_map(&prediction.prior)?,
                NullModel::from_config(prediction.effective_null_model(), condition.null_reference),
            )),
            None => Ok((
                PriorSpec::new(),
                NullModel::Reference {
                    value: condition.null_reference,
                },
            )),
        }
    }
}

/// Canonical text of every verdict-affecting setting that is not a single
/// number.
fn frozen_settings(
    config: &CrucibleConfig,
    seed: u64,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let sampler = &config.sampler;
    let mut settings = BTreeMap::new();
    settings.insert(
        SETTING_FDR_STEP_RULE.to_string(),
        config.fdr.effective_step_rule().name().to_string(),
    );
    settings.insert(
        SETTING_MIN_LOG_BAYES_FACTOR.to_string(),
        format!("{:?}", config.verdict.effective_min_log_bayes_factor()),
    );
    settings.insert(
        SETTING_SAMPLER.to_string(),
        format!(
            "seed={seed};live_points={};max_iterations={};walk_steps={};dlogz={:?};max_log_evidence_error={:?};timeout_ms={:?}",
            sampler.effective_live_points(),
            sampler.effective_max_iterations(),
            sampler.effective_walk_steps(),
            sampler.effective_dlogz(),
            sampler.effective_max_log_evidence_error(),
            sampler.timeout_ms,
        ),
    );
    for (id, prediction) in &config.predictions {
        let model = serde_json::to_string(&(&prediction.prior, prediction.effective_null_model()))
            .map_err(|e| ConfigError::InvalidValue {
                field: format!("predictions.{id}"),
                message: e.to_string(),
            })?;
        settings.insert(format!("{SETTING_PREDICTION_PREFIX}{id}.model"), model);
    }
    Ok(settings)
}
