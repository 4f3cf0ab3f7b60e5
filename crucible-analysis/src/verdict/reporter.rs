//! Turns assessed predictions and the FDR outcome into verdicts.

use tracing::debug;

use crucible_core::config::VerdictConfig;
use crucible_core::errors::SamplingError;
use crucible_core::types::{Domain, FalsificationCondition, PredictionId};

use super::types::{Decision, HypothesisTest, InconclusiveReason, Verdict};
use crate::aggregation::DomainAggregate;
use crate::evidence::ModelComparison;
use crate::fdr::FdrOutcome;

/// What the analysis established for one prediction before FDR control.
#[derive(Debug, Clone)]
pub struct PredictionAssessment {
    pub prediction_id: PredictionId,
    pub domain: Option<Domain>,
    pub condition: Option<FalsificationCondition>,
    pub records_rejected: usize,
    pub outcome: AssessmentOutcome,
}

#[derive(Debug, Clone)]
pub enum AssessmentOutcome {
    /// Aggregated and scored. Enters the FDR correction with `significance`.
    Tested {
        aggregate: DomainAggregate,
        test: HypothesisTest,
        significance: f64,
        comparison: Result<ModelComparison, SamplingError>,
    },
    /// Could not be tested at all.
    Failed {
        reason: InconclusiveReason,
        detail: String,
    },
}

impl PredictionAssessment {
    /// The raw p-value this prediction contributes to the FDR correction.
    pub fn significance(&self) -> Option<f64> {
        match &self.outcome {
            AssessmentOutcome::Tested { significance, .. } => Some(*significance),
            AssessmentOutcome::Failed { .. } => None,
        }
    }

    pub fn aggregate(&self) -> Option<&DomainAggregate> {
        match &self.outcome {
            AssessmentOutcome::Tested { aggregate, .. } => Some(aggregate),
            AssessmentOutcome::Failed { .. } => None,
        }
    }
}

/// Applies the decision rule.
#[derive(Debug, Clone, Default)]
pub struct VerdictReporter {
    min_log_bayes_factor: Option<f64>,
}

impl VerdictReporter {
    pub fn new(min_log_bayes_factor: Option<f64>) -> Self {
        Self {
            min_log_bayes_factor,
        }
    }

    pub fn from_config(config: &VerdictConfig) -> Self {
        Self::new(config.effective_min_log_bayes_factor())
    }

    /// One verdict per assessment, ordered by prediction id.
    pub fn report(&self, assessments: &[PredictionAssessment], fdr: &FdrOutcome) -> Vec<Verdict> {
        let mut verdicts: Vec<Verdict> = assessments.iter().map(|a| self.decide(a, fdr)).collect();
        verdicts.sort_by(|a, b| a.prediction_id.cmp(&b.prediction_id));
        verdicts
    }

    /// Decide a single prediction.
    ///
    /// Falsified requires an FDR discovery on the falsification test with a
    /// deviation in the frozen direction. Confirmed requires a discovery on
    /// the confirmation test and, when configured, enough Bayes-factor support.
    pub fn decide(&self, assessment: &PredictionAssessment, fdr: &FdrOutcome) -> Verdict {
        let mut verdict = Verdict::inconclusive(
            assessment.prediction_id.clone(),
            assessment.domain,
            InconclusiveReason::NotDiscovered,
        );
        verdict.records_rejected = assessment.records_rejected;

        let (aggregate, test, significance, comparison) = match &assessment.outcome {
            AssessmentOutcome::Failed { reason, detail } => {
                verdict.reason = Some(*reason);
                verdict.detail = Some(detail.clone());
                return verdict;
            }
            AssessmentOutcome::Tested {
                aggregate,
                test,
                significance,
                comparison,
            } => (aggregate, *test, *significance, comparison),
        };

        verdict.records_used = aggregate.len();
        verdict.test = Some(test);
        verdict.z_score = Some(aggregate.z);
        verdict.raw_significance = Some(significance);
        if let Ok(comparison) = comparison {
            verdict.log_bayes_factor = Some(comparison.log_bayes_factor);
            verdict.log_bayes_factor_error = Some(comparison.log_bayes_factor_error);
            verdict.evidence_strength = Some(comparison.strength);
        }

        let discovered = match fdr.get(&assessment.prediction_id) {
            Some(decision) => {
                verdict.adjusted_significance = Some(decision.adjusted_significance);
                verdict.fdr_threshold_used = Some(decision.threshold);
                decision.discovered
            }
            None => false,
        };

        let condition = assessment.condition.clone().unwrap_or_default();
        let decision = match comparison {
            Err(error) => Err((InconclusiveReason::from(error), Some(error.to_string()))),
            Ok(_) if !discovered => Err((InconclusiveReason::NotDiscovered, None)),
            Ok(_) => match test {
                HypothesisTest::Falsification => {
                    if condition.direction.matches(aggregate.z) {
                        Ok(Decision::Falsified)
                    } else {
                        Err((InconclusiveReason::DirectionMismatch, None))
                    }
                }
                HypothesisTest::Confirmation => {
                    let supported = match (self.min_log_bayes_factor, verdict.log_bayes_factor) {
                        (Some(min), Some(lbf)) => lbf >= min,
                        (Some(_), None) => false,
                        (None, _) => true,
                    };
                    if !condition.within_band(aggregate.z) {
                        Err((InconclusiveReason::DirectionMismatch, None))
                    } else if supported {
                        Ok(Decision::Confirmed)
                    } else {
                        Err((InconclusiveReason::InsufficientBayesSupport, None))
                    }
                }
            },
        };

        match decision {
            Ok(decision) => {
                verdict.decision = decision;
                verdict.reason = None;
            }
            Err((reason, detail)) => {
                verdict.reason = Some(reason);
                verdict.detail = detail;
            }
        }

        debug!(
            prediction = %verdict.prediction_id,
            decision = %verdict.decision,
            reason = verdict.reason.map(|r| r.name()),
            "verdict decided"
        );
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::DomainAggregator;
    use crate::evidence::{BayesianComparator, NullModel, PriorSpec};
    use crate::fdr::{FdrCandidate, FdrController};
    use crate::measurement::{MeasurementRecord, RawMeasurement};
    use crate::systematic::SystematicEstimator;
    use crate::verdict::select_hypothesis_test;
    use crucible_core::types::FalsificationDirection;

    fn assess(id: &str, predicted: f64, observed: f64, condition: FalsificationCondition) -> PredictionAssessment {
        let mut record = MeasurementRecord::new(RawMeasurement::new(
            id,
            Domain::Cosmology,
            predicted,
            observed,
            0.1,
        ))
        .unwrap();
        SystematicEstimator::default().annotate(&mut record).unwrap();
        let aggregate = DomainAggregator::new().aggregate(vec![record]).unwrap();
        let (test, significance) = select_hypothesis_test(&aggregate, &condition);
        let comparison = BayesianComparator::default().compare(
            &aggregate,
            &PriorSpec::new(),
            &NullModel::Reference {
                value: condition.null_reference,
            },
            1,
        );
        PredictionAssessment {
            prediction_id: PredictionId::from(id),
            domain: Some(Domain::Cosmology),
            condition: Some(condition),
            records_rejected: 0,
            outcome: AssessmentOutcome::Tested {
                aggregate,
                test,
                significance,
                comparison,
            },
        }
    }

    fn run(reporter: &VerdictReporter, assessments: &[PredictionAssessment]) -> Vec<Verdict> {
        let candidates: Vec<FdrCandidate> = assessments
            .iter()
            .filter_map(|a| a.significance().map(|p| FdrCandidate::new(a.prediction_id.clone(), p)))
            .collect();
        let fdr = FdrController::new(0.05).unwrap().adjust(&candidates).unwrap();
        reporter.report(assessments, &fdr)
    }

    #[test]
    fn test_direction_mismatch_is_not_falsified() {
        let condition = FalsificationCondition::new(FalsificationDirection::Above, (-2.0, 2.0));
        let verdicts = run(&VerdictReporter::default(), &[assess("a", 1.0, 0.4, condition)]);
        assert_eq!(verdicts[0].decision, Decision::Inconclusive);
        assert_eq!(verdicts[0].reason, Some(InconclusiveReason::DirectionMismatch));
    }

    #[test]
    fn test_matching_direction_is_falsified() {
        let condition = FalsificationCondition::new(FalsificationDirection::Below, (-2.0, 2.0));
        let verdicts = run(&VerdictReporter::default(), &[assess("a", 1.0, 0.4, condition)]);
        assert_eq!(verdicts[0].decision, Decision::Falsified);
        assert_eq!(verdicts[0].test, Some(HypothesisTest::Falsification));
        assert!(verdicts[0].fdr_threshold_used.is_some());
    }

    #[test]
    fn test_confirmation_with_bayes_requirement() {
        let condition = FalsificationCondition::new(FalsificationDirection::Either, (-2.0, 2.0));
        let verdicts = run(&VerdictReporter::default(), &[assess("a", 1.0, 1.0, condition.clone())]);
        assert_eq!(verdicts[0].decision, Decision::Confirmed);

        // lbf is 50 here (10σ from the null); demand more than that.
        let strict = VerdictReporter::new(Some(60.0));
        let verdicts = run(&strict, &[assess("a", 1.0, 1.0, condition)]);
        assert_eq!(verdicts[0].reason, Some(InconclusiveReason::InsufficientBayesSupport));
    }

    #[test]
    fn test_failed_assessment_carries_reason() {
        let assessment = PredictionAssessment {
            prediction_id: PredictionId::from("ghost"),
            domain: None,
            condition: None,
            records_rejected: 2,
            outcome: AssessmentOutcome::Failed {
                reason: InconclusiveReason::InvalidRecord,
                detail: "every record rejected".to_string(),
            },
        };
        let verdicts = run(&VerdictReporter::default(), &[assessment]);
        assert_eq!(verdicts[0].reason, Some(InconclusiveReason::InvalidRecord));
        assert_eq!(verdicts[0].records_rejected, 2);
        assert!(verdicts[0].raw_significance.is_none());
    }
}
