//! Bayes-factor comparison of a prediction against a null model.

use serde::Serialize;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crucible_core::config::{NullModelConfig, SamplerConfig};
use crucible_core::constants::{BAYES_FACTOR_DECISIVE, BAYES_FACTOR_STRONG, BAYES_FACTOR_SUBSTANTIAL};
use crucible_core::errors::SamplingError;
use crucible_core::traits::{Cancellable, CancellationToken};
use crucible_core::types::PriorDistribution;

use super::likelihood::{GaussianModel, Observation};
use super::nested::{EvidenceEstimate, NestedSampler, SamplerSettings};
use super::prior::PriorSpec;
use crate::aggregation::DomainAggregate;
use crate::measurement::MeasurementRecord;

const PREDICTED_STREAM: u64 = 0;
const NULL_STREAM: u64 = 1;

/// The alternative a prediction is scored against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NullModel {
    /// Observations centred on a fixed value, sharing the nuisance priors.
    Reference { value: f64 },
    /// The prediction shifted by a free deviation drawn from `prior`.
    FreeDeviation { prior: PriorDistribution },
}

impl NullModel {
    pub fn from_config(config: NullModelConfig, reference: f64) -> Self {
        match config {
            NullModelConfig::Reference => Self::Reference { value: reference },
            NullModelConfig::FreeDeviation { prior } => Self::FreeDeviation { prior },
        }
    }
}

/// Jeffreys' scale for a Bayes factor of prediction over null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    DecisiveAgainst,
    StrongAgainst,
    SubstantialAgainst,
    Barely,
    Substantial,
    Strong,
    Decisive,
}

impl EvidenceStrength {
    pub fn from_log_bayes_factor(log_bayes_factor: f64) -> Self {
        let magnitude = log_bayes_factor.abs();
        let level = if magnitude >= BAYES_FACTOR_DECISIVE.ln() {
            3
        } else if magnitude >= BAYES_FACTOR_STRONG.ln() {
            2
        } else if magnitude >= BAYES_FACTOR_SUBSTANTIAL.ln() {
            1
        } else {
            0
        };
        match (level, log_bayes_factor >= 0.0) {
            (0, _) => Self::Barely,
            (1, true) => Self::Substantial,
            (2, true) => Self::Strong,
            (_, true) => Self::Decisive,
            (1, false) => Self::SubstantialAgainst,
            (2, false) => Self::StrongAgainst,
            (_, false) => Self::DecisiveAgainst,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::DecisiveAgainst => "decisive_against",
            Self::StrongAgainst => "strong_against",
            Self::SubstantialAgainst => "substantial_against",
            Self::Barely => "barely",
            Self::Substantial => "substantial",
            Self::Strong => "strong",
            Self::Decisive => "decisive",
        }
    }
}

impl std::fmt::Display for EvidenceStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of comparing the predicted model with the null model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    /// `ln Z_predicted − ln Z_null`. Positive favours the prediction.
    pub log_bayes_factor: f64,
    pub log_bayes_factor_error: f64,
    pub predicted: EvidenceEstimate,
    pub null: EvidenceEstimate,
    pub strength: EvidenceStrength,
    pub seed: u64,
}

/// Scores predictions with nested sampling.
#[derive(Debug, Clone, Default)]
pub struct BayesianComparator {
    sampler: NestedSampler,
    cancellation: Option<CancellationToken>,
}

impl BayesianComparator {
    pub fn new(settings: SamplerSettings) -> Self {
        Self {
            sampler: NestedSampler::new(settings),
            cancellation: None,
        }
    }

    pub fn from_config(config: &SamplerConfig) -> Self {
        Self::new(SamplerSettings::from_config(config))
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Compare the prediction behind `aggregate` with `null`.
    pub fn compare(
        &self,
        aggregate: &DomainAggregate,
        prior: &PriorSpec,
        null: &NullModel,
        seed: u64,
    ) -> Result<ModelComparison, SamplingError> {
        self.compare_records(&aggregate.records, prior, null, seed)
    }

    /// Compare a single record.
    pub fn compare_record(
        &self,
        record: &MeasurementRecord,
        prior: &PriorSpec,
        null: &NullModel,
        seed: u64,
    ) -> Result<ModelComparison, SamplingError> {
        self.compare_records(std::slice::from_ref(record), prior, null, seed)
    }

    fn compare_records(
        &self,
        records: &[MeasurementRecord],
        prior: &PriorSpec,
        null: &NullModel,
        seed: u64,
    ) -> Result<ModelComparison, SamplingError> {
        let predicted_model = GaussianModel::new(
            records.iter().map(Observation::predicted).collect(),
            prior.clone(),
        );
        let null_model = match *null {
            NullModel::Reference { value } => GaussianModel::new(
                records.iter().map(|r| Observation::reference(r, value)).collect(),
                prior.clone(),
            ),
            NullModel::FreeDeviation { prior: deviation } => GaussianModel::new(
                records.iter().map(Observation::predicted).collect(),
                prior.with_deviation(deviation)?,
            ),
        };

        let cancel = self.cancellation.as_ref().map(|t| t as &dyn Cancellable);
        let predicted =
            self.sampler
                .run(&predicted_model, derive_seed(seed, PREDICTED_STREAM), cancel)?;
        let null_estimate = self
            .sampler
            .run(&null_model, derive_seed(seed, NULL_STREAM), cancel)?;

        let log_bayes_factor = predicted.log_evidence - null_estimate.log_evidence;
        let log_bayes_factor_error = predicted
            .log_evidence_error
            .hypot(null_estimate.log_evidence_error);
        let strength = EvidenceStrength::from_log_bayes_factor(log_bayes_factor);

        debug!(
            records = records.len(),
            log_bayes_factor,
            log_bayes_factor_error,
            strength = %strength,
            "model comparison complete"
        );

        Ok(ModelComparison {
            log_bayes_factor,
            log_bayes_factor_error,
            predicted,
            null: null_estimate,
            strength,
            seed,
        })
    }
}

/// Independent stream seed for one model of a comparison.
pub fn derive_seed(seed: u64, stream: u64) -> u64 {
    xxh3_64_with_seed(&stream.to_le_bytes(), seed)
}
