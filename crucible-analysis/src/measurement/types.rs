//! Raw loader output and validated measurement records.

use serde::{Deserialize, Serialize};

use crucible_core::errors::RecordError;
use crucible_core::types::{Domain, PredictionId};

use crate::systematic::SystematicSource;

/// One measurement as delivered by an external data loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    pub prediction_id: PredictionId,
    pub domain: Domain,
    pub predicted_value: f64,
    #[serde(default)]
    pub predicted_uncertainty: f64,
    pub observed_value: f64,
    pub observed_uncertainty: f64,
    #[serde(default)]
    pub complexity_score: f64,
    #[serde(default = "default_precision_scale")]
    pub precision_scale: f64,
    #[serde(default)]
    pub source: String,
    /// Individually characterised systematics, when the loader knows them.
    #[serde(default)]
    pub systematic_sources: Vec<SystematicSource>,
}

fn default_precision_scale() -> f64 {
    1.0
}

impl RawMeasurement {
    /// A measurement with no theory uncertainty, zero complexity and unit precision scale.
    pub fn new(
        prediction_id: impl Into<PredictionId>,
        domain: Domain,
        predicted_value: f64,
        observed_value: f64,
        observed_uncertainty: f64,
    ) -> Self {
        Self {
            prediction_id: prediction_id.into(),
            domain,
            predicted_value,
            predicted_uncertainty: 0.0,
            observed_value,
            observed_uncertainty,
            complexity_score: 0.0,
            precision_scale: default_precision_scale(),
            source: String::new(),
            systematic_sources: Vec::new(),
        }
    }

    pub fn with_predicted_uncertainty(mut self, uncertainty: f64) -> Self {
        self.predicted_uncertainty = uncertainty;
        self
    }

    pub fn with_complexity(mut self, complexity_score: f64, precision_scale: f64) -> Self {
        self.complexity_score = complexity_score;
        self.precision_scale = precision_scale;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_systematic_source(mut self, source: SystematicSource) -> Self {
        self.systematic_sources.push(source);
        self
    }
}

/// Outcome of the systematic budget estimator for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystematicAnnotation {
    /// Complexity-to-precision ratio the decision was based on.
    pub ratio: f64,
    /// Whether a systematic term is included.
    pub included: bool,
    /// Systematic uncertainty added in quadrature; zero when not included.
    pub uncertainty: f64,
    /// Named sources that passed their own inclusion test.
    pub sources_included: usize,
}

/// A validated measurement.
///
/// Immutable after construction except for the systematic annotation,
/// which the estimator sets exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    prediction_id: PredictionId,
    domain: Domain,
    predicted_value: f64,
    predicted_uncertainty: f64,
    observed_value: f64,
    observed_uncertainty: f64,
    complexity_score: f64,
    precision_scale: f64,
    source: String,
    systematic_sources: Vec<SystematicSource>,
    systematic: Option<SystematicAnnotation>,
}

impl MeasurementRecord {
    /// Validate loader output.
    ///
    /// `precision_scale` is checked by the systematic estimator, not here.
    pub fn new(raw: RawMeasurement) -> Result<Self, RecordError> {
        check_finite("predicted_value", raw.predicted_value)?;
        check_finite("observed_value", raw.observed_value)?;
        check_finite("predicted_uncertainty", raw.predicted_uncertainty)?;
        check_finite("observed_uncertainty", raw.observed_uncertainty)?;
        check_finite("complexity_score", raw.complexity_score)?;
        check_finite("precision_scale", raw.precision_scale)?;

        if raw.observed_uncertainty <= 0.0 {
            return Err(RecordError::InvalidField {
                field: "observed_uncertainty",
                message: format!("must be > 0, got {}", raw.observed_uncertainty),
            });
        }
        if raw.predicted_uncertainty < 0.0 {
            return Err(RecordError::InvalidField {
                field: "predicted_uncertainty",
                message: format!("must be >= 0, got {}", raw.predicted_uncertainty),
            });
        }
        for source in &raw.systematic_sources {
            if !source.amplitude.is_finite()
                || !source.complexity.is_finite()
                || source.complexity < 0.0
            {
                return Err(RecordError::InvalidField {
                    field: "systematic_sources",
                    message: format!(
                        "source {} needs a finite amplitude and a finite non-negative complexity",
                        source.name
                    ),
                });
            }
        }
        if raw.complexity_score < 0.0 {
            return Err(RecordError::InvalidField {
                field: "complexity_score",
                message: format!("must be >= 0, got {}", raw.complexity_score),
            });
        }

        Ok(Self {
            prediction_id: raw.prediction_id,
            domain: raw.domain,
            predicted_value: raw.predicted_value,
            predicted_uncertainty: raw.predicted_uncertainty,
            observed_value: raw.observed_value,
            observed_uncertainty: raw.observed_uncertainty,
            complexity_score: raw.complexity_score,
            precision_scale: raw.precision_scale,
            source: raw.source,
            systematic_sources: raw.systematic_sources,
            systematic: None,
        })
    }

    pub fn prediction_id(&self) -> &PredictionId {
        &self.prediction_id
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn predicted_value(&self) -> f64 {
        self.predicted_value
    }

    pub fn predicted_uncertainty(&self) -> f64 {
        self.predicted_uncertainty
    }

    pub fn observed_value(&self) -> f64 {
        self.observed_value
    }

    pub fn observed_uncertainty(&self) -> f64 {
        self.observed_uncertainty
    }

    pub fn complexity_score(&self) -> f64 {
        self.complexity_score
    }

    pub fn precision_scale(&self) -> f64 {
        self.precision_scale
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn systematic_sources(&self) -> &[SystematicSource] {
        &self.systematic_sources
    }

    pub fn systematic(&self) -> Option<&SystematicAnnotation> {
        self.systematic.as_ref()
    }

    pub fn is_annotated(&self) -> bool {
        self.systematic.is_some()
    }

    /// False until annotated.
    pub fn systematic_included(&self) -> bool {
        self.systematic.is_some_and(|s| s.included)
    }

    pub fn systematic_uncertainty(&self) -> f64 {
        self.systematic.map_or(0.0, |s| s.uncertainty)
    }

    /// Set the systematic annotation. Fails if it was already set.
    pub(crate) fn set_systematic(
        &mut self,
        annotation: SystematicAnnotation,
    ) -> Result<(), RecordError> {
        if self.systematic.is_some() {
            return Err(RecordError::AlreadyAnnotated);
        }
        self.systematic = Some(annotation);
        Ok(())
    }

    /// Observed minus predicted.
    pub fn deviation(&self) -> f64 {
        self.observed_value - self.predicted_value
    }

    /// Quadrature sum of observational, systematic and theory uncertainty.
    pub fn effective_uncertainty(&self) -> f64 {
        self.observed_uncertainty
            .hypot(self.systematic_uncertainty())
            .hypot(self.predicted_uncertainty)
    }

    /// Deviation in units of the effective uncertainty.
    pub fn z_score(&self) -> f64 {
        self.deviation() / self.effective_uncertainty()
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), RecordError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RecordError::InvalidField {
            field,
            message: format!("must be finite, got {value}"),
        })
    }
}
