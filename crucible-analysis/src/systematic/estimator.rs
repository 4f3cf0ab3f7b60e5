//! Complexity-to-precision systematic estimator.
//!
//! Inclusion: `𝒜/𝒩 > threshold` (default 1/300).
//! Inflation: `σ_sys = k · σ_obs · (r − t) / r` for `r > t`, else 0.
//! Zero at the threshold, strictly increasing in `r`, saturating at `k · σ_obs`.
//! Named systematic sources on the record are added in quadrature.

use rayon::prelude::*;
use tracing::debug;

use crucible_core::config::SystematicConfig;
use crucible_core::errors::RecordError;

use super::budget::SystematicBudget;
use crate::measurement::{MeasurementRecord, SystematicAnnotation};

/// Annotates measurement records with their systematic budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystematicEstimator {
    threshold: f64,
    inflation_scale: f64,
}

impl SystematicEstimator {
    pub fn new(threshold: f64, inflation_scale: f64) -> Self {
        Self {
            threshold,
            inflation_scale,
        }
    }

    pub fn from_config(config: &SystematicConfig) -> Self {
        Self::new(
            config.effective_threshold(),
            config.effective_inflation_scale(),
        )
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn inflation_scale(&self) -> f64 {
        self.inflation_scale
    }

    /// Whether a ratio calls for an explicit systematic term.
    pub fn requires_systematic(&self, ratio: f64) -> bool {
        ratio > self.threshold
    }

    /// Systematic uncertainty for a ratio and observed uncertainty.
    pub fn inflation(&self, ratio: f64, observed_uncertainty: f64) -> f64 {
        if !self.requires_systematic(ratio) {
            return 0.0;
        }
        let fraction = if ratio.is_finite() {
            (ratio - self.threshold) / ratio
        } else {
            1.0
        };
        (self.inflation_scale * observed_uncertainty * fraction).max(0.0)
    }

    /// Annotate one record. Fails if it is already annotated, its precision
    /// scale is not positive, or the ratio overflows; the record is left
    /// untouched then.
    pub fn annotate(
        &self,
        record: &mut MeasurementRecord,
    ) -> Result<SystematicAnnotation, RecordError> {
        if record.is_annotated() {
            return Err(RecordError::AlreadyAnnotated);
        }
        let precision = record.precision_scale();
        if precision <= 0.0 {
            return Err(RecordError::NonPositivePrecision(precision));
        }

        let ratio = record.complexity_score() / precision;
        if !ratio.is_finite() {
            return Err(RecordError::NonFiniteRatio {
                complexity: record.complexity_score(),
                precision,
            });
        }
        // Named sources pass their own test and add in quadrature to the
        // ratio-based term.
        let budget = SystematicBudget::from_sources(record.systematic_sources(), self.threshold);
        let included = self.requires_systematic(ratio) || !budget.included.is_empty();
        let annotation = SystematicAnnotation {
            ratio,
            included,
            uncertainty: self
                .inflation(ratio, record.observed_uncertainty())
                .hypot(budget.total),
            sources_included: budget.included.len(),
        };
        record.set_systematic(annotation)?;

        debug!(
            prediction = %record.prediction_id(),
            complexity_ratio = ratio,
            included,
            systematic = annotation.uncertainty,
            sources_included = annotation.sources_included,
            "systematic budget annotated"
        );
        Ok(annotation)
    }

    /// Annotate independent records in parallel, one result per record.
    pub fn annotate_all(
        &self,
        records: &mut [MeasurementRecord],
    ) -> Vec<Result<SystematicAnnotation, RecordError>> {
        records
            .par_iter_mut()
            .map(|record| self.annotate(record))
            .collect()
    }
}

impl Default for SystematicEstimator {
    fn default() -> Self {
        Self::from_config(&SystematicConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::RawMeasurement;
    use crate::systematic::SystematicSource;
    use crucible_core::types::Domain;

    fn record(complexity: f64, precision: f64) -> MeasurementRecord {
        MeasurementRecord::new(
            RawMeasurement::new("p", Domain::Neuroscience, 1.0, 1.2, 0.1)
                .with_complexity(complexity, precision),
        )
        .unwrap()
    }

    #[test]
    fn test_below_threshold_not_included() {
        let estimator = SystematicEstimator::default();
        let mut r = record(1.0, 1000.0);
        let annotation = estimator.annotate(&mut r).unwrap();
        assert!(!annotation.included);
        assert_eq!(annotation.uncertainty, 0.0);
        assert!(!r.systematic_included());
    }

    #[test]
    fn test_above_threshold_included() {
        let estimator = SystematicEstimator::default();
        let mut r = record(10.0, 100.0);
        let annotation = estimator.annotate(&mut r).unwrap();
        assert!(annotation.included);
        assert!(annotation.uncertainty > 0.0);
        assert!(annotation.uncertainty <= 0.5 * 0.1);
        assert!(r.effective_uncertainty() > 0.1);
    }

    #[test]
    fn test_exactly_at_threshold_not_included() {
        let estimator = SystematicEstimator::new(0.25, 0.5);
        let mut r = record(1.0, 4.0);
        assert!(!estimator.annotate(&mut r).unwrap().included);
    }

    #[test]
    fn test_double_annotation_fails() {
        let estimator = SystematicEstimator::default();
        let mut r = record(10.0, 100.0);
        estimator.annotate(&mut r).unwrap();
        assert_eq!(estimator.annotate(&mut r), Err(RecordError::AlreadyAnnotated));
    }

    #[test]
    fn test_non_positive_precision_fails_without_annotating() {
        let estimator = SystematicEstimator::default();
        let mut r = record(10.0, 0.0);
        assert_eq!(
            estimator.annotate(&mut r),
            Err(RecordError::NonPositivePrecision(0.0))
        );
        assert!(!r.is_annotated());
    }

    #[test]
    fn test_inflation_monotone_and_saturating() {
        let estimator = SystematicEstimator::new(0.01, 0.5);
        let mut previous = 0.0;
        for i in 1..200 {
            let ratio = 0.01 + i as f64 * 0.01;
            let value = estimator.inflation(ratio, 1.0);
            assert!(value > previous);
            assert!(value < 0.5);
            previous = value;
        }
    }

    #[test]
    fn test_overflowing_ratio_rejected() {
        let estimator = SystematicEstimator::default();
        let mut r = record(1e300, 1e-10);
        assert!(matches!(
            estimator.annotate(&mut r),
            Err(RecordError::NonFiniteRatio { .. })
        ));
        assert!(!r.is_annotated());
    }

    #[test]
    fn test_inflation_saturates_at_infinite_ratio() {
        let estimator = SystematicEstimator::new(0.01, 0.5);
        assert_eq!(estimator.inflation(f64::INFINITY, 1.0), 0.5);
        assert!(estimator.inflation(1e300, 1.0) <= 0.5);
        assert_eq!(estimator.inflation(f64::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_named_sources_fold_into_systematic() {
        let estimator = SystematicEstimator::default();
        let mut r = MeasurementRecord::new(
            RawMeasurement::new("p", Domain::Cosmology, 1.0, 1.2, 0.1)
                .with_systematic_source(SystematicSource::new("beam", 0.03, 1.0))
                .with_systematic_source(SystematicSource::new("foreground", 0.04, 1.0))
                .with_systematic_source(SystematicSource::new("leakage", 0.001, 1.0)),
        )
        .unwrap();
        let annotation = estimator.annotate(&mut r).unwrap();
        // Complexity 0 adds nothing; two sources pass and combine to 0.05.
        assert!(annotation.included);
        assert_eq!(annotation.sources_included, 2);
        assert!((annotation.uncertainty - 0.05).abs() < 1e-12);
        assert!((r.effective_uncertainty() - 0.1f64.hypot(0.05)).abs() < 1e-12);
    }

    #[test]
    fn test_annotate_all_reports_each_record() {
        let estimator = SystematicEstimator::default();
        let mut records = vec![record(1.0, 1000.0), record(10.0, 100.0), record(1.0, -1.0)];
        let results = estimator.annotate_all(&mut records);
        assert_eq!(results.len(), 3);
        assert!(!results[0].as_ref().unwrap().included);
        assert!(results[1].as_ref().unwrap().included);
        assert!(results[2].is_err());
    }
}
