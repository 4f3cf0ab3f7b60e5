//! Per-domain rollup of verdicts.

use serde::Serialize;
use tracing::warn;

use crucible_core::types::Domain;

use super::reporter::PredictionAssessment;
use super::types::{Decision, InconclusiveReason, Verdict};
use crate::aggregation::DomainAggregator;

/// How a domain fared across its predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSummary {
    pub domain: Domain,
    /// Falsified if any prediction is, confirmed if all are, else inconclusive.
    pub decision: Decision,
    pub predictions: usize,
    pub confirmed: usize,
    pub falsified: usize,
    pub inconclusive: usize,
    /// Aggregate z over every valid record of the domain.
    pub z_score: Option<f64>,
    pub p_value: Option<f64>,
    pub records_used: usize,
}

impl DomainSummary {
    /// Summaries for every domain that has at least one verdict, in
    /// `Domain::ALL` order.
    pub fn rollup(verdicts: &[Verdict], assessments: &[PredictionAssessment]) -> Vec<Self> {
        Domain::ALL
            .iter()
            .filter_map(|&domain| Self::for_domain(domain, verdicts, assessments))
            .collect()
    }

    fn for_domain(
        domain: Domain,
        verdicts: &[Verdict],
        assessments: &[PredictionAssessment],
    ) -> Option<Self> {
        // Data without a pre-registered condition does not speak for the domain.
        let in_domain: Vec<&Verdict> = verdicts
            .iter()
            .filter(|v| v.domain == Some(domain))
            .filter(|v| v.reason != Some(InconclusiveReason::NotPreregistered))
            .collect();
        if in_domain.is_empty() {
            return None;
        }
        let count = |d: Decision| in_domain.iter().filter(|v| v.decision == d).count();
        let confirmed = count(Decision::Confirmed);
        let falsified = count(Decision::Falsified);
        let inconclusive = count(Decision::Inconclusive);

        let decision = if falsified > 0 {
            Decision::Falsified
        } else if confirmed == in_domain.len() {
            Decision::Confirmed
        } else {
            Decision::Inconclusive
        };

        let records: Vec<_> = assessments
            .iter()
            .filter_map(|a| a.aggregate())
            .filter(|agg| agg.domain == domain)
            .flat_map(|agg| agg.records.iter().cloned())
            .collect();
        let records_used = records.len();
        let (z_score, p_value) = if records.is_empty() {
            (None, None)
        } else {
            match DomainAggregator::new().aggregate(records) {
                Ok(agg) => (Some(agg.z), Some(agg.p_value)),
                Err(e) => {
                    warn!(domain = %domain, error = %e, "domain-wide aggregation failed");
                    (None, None)
                }
            }
        };

        Some(Self {
            domain,
            decision,
            predictions: in_domain.len(),
            confirmed,
            falsified,
            inconclusive,
            z_score,
            p_value,
            records_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_core::types::PredictionId;

    fn verdict(id: &str, domain: Domain, decision: Decision) -> Verdict {
        let mut v = Verdict::inconclusive(PredictionId::from(id), Some(domain), InconclusiveReason::NotDiscovered);
        v.decision = decision;
        v
    }

    #[test]
    fn test_rollup_rules() {
        let verdicts = vec![
            verdict("a", Domain::Cosmology, Decision::Confirmed),
            verdict("b", Domain::Cosmology, Decision::Confirmed),
            verdict("c", Domain::Neuroscience, Decision::Confirmed),
            verdict("d", Domain::Neuroscience, Decision::Inconclusive),
            verdict("e", Domain::FundamentalPhysics, Decision::Confirmed),
            verdict("f", Domain::FundamentalPhysics, Decision::Falsified),
        ];
        let summaries = DomainSummary::rollup(&verdicts, &[]);
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].decision, Decision::Confirmed);
        assert_eq!(summaries[1].decision, Decision::Inconclusive);
        assert_eq!(summaries[2].decision, Decision::Falsified);
        assert_eq!(summaries[2].falsified, 1);
        assert!(summaries[0].z_score.is_none());
    }

    #[test]
    fn test_unregistered_predictions_do_not_count() {
        let stray = Verdict::inconclusive(
            PredictionId::from("stray"),
            Some(Domain::Cosmology),
            InconclusiveReason::NotPreregistered,
        );
        let verdicts = vec![verdict("a", Domain::Cosmology, Decision::Confirmed), stray];
        let summaries = DomainSummary::rollup(&verdicts, &[]);
        assert_eq!(summaries[0].decision, Decision::Confirmed);
        assert_eq!(summaries[0].predictions, 1);
    }

    #[test]
    fn test_domain_without_verdicts_is_skipped() {
        let summaries = DomainSummary::rollup(&[verdict("a", Domain::Neuroscience, Decision::Confirmed)], &[]);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].domain, Domain::Neuroscience);
    }
}
