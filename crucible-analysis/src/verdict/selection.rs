//! Hypothesis test selection from pre-registered quantities only.

use crucible_core::types::FalsificationCondition;

use super::types::HypothesisTest;
use crate::aggregation::{two_sided_p_value, DomainAggregate};

/// Pick the test a prediction enters the FDR correction with, and its p-value.
///
/// Inside the confirmation band the question is whether the data tells the
/// prediction apart from the null reference; outside it, whether the data
/// deviates from the prediction.
pub fn select_hypothesis_test(
    aggregate: &DomainAggregate,
    condition: &FalsificationCondition,
) -> (HypothesisTest, f64) {
    if condition.within_band(aggregate.z) {
        let z_null = aggregate.z_against(condition.null_reference);
        (HypothesisTest::Confirmation, two_sided_p_value(z_null))
    } else {
        (HypothesisTest::Falsification, aggregate.p_value)
    }
}
