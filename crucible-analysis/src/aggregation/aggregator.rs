//! Inverse-variance weighted combination of annotated records.

use tracing::debug;

use crucible_core::errors::AggregationError;

use super::significance::{chi_square_p_value, two_sided_p_value};
use super::types::{relative_weights, DomainAggregate};
use crate::measurement::MeasurementRecord;

/// Combines annotated records that share a domain.
#[derive(Debug, Default, Clone, Copy)]
pub struct DomainAggregator;

impl DomainAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Combine records into a domain aggregate.
    ///
    /// Every record must already carry its systematic annotation so the
    /// weights use the inflated uncertainty. Record order does not affect
    /// the result beyond summation rounding.
    pub fn aggregate(
        &self,
        records: Vec<MeasurementRecord>,
    ) -> Result<DomainAggregate, AggregationError> {
        let first = records.first().ok_or(AggregationError::EmptyDomain)?;
        let domain = first.domain();

        for (index, record) in records.iter().enumerate() {
            if record.domain() != domain {
                return Err(AggregationError::MixedDomain {
                    index,
                    expected: domain.to_string(),
                    found: record.domain().to_string(),
                });
            }
            if !record.is_annotated() {
                return Err(AggregationError::NotAnnotated { index });
            }
        }

        // Weights are relative to the most precise record: w_i = (σ_min/σ_i)².
        let weights = relative_weights(&records);
        let sigma_min = records
            .iter()
            .map(|r| r.effective_uncertainty())
            .fold(f64::INFINITY, f64::min);
        let mut weighted_z = 0.0;
        let mut sum_w = 0.0;
        let mut sum_w2 = 0.0;
        let mut weighted_deviation = 0.0;
        for (record, &w) in records.iter().zip(&weights) {
            weighted_z += w * record.z_score();
            sum_w += w;
            sum_w2 += w * w;
            weighted_deviation += w * record.deviation();
        }

        let z = weighted_z / sum_w2.sqrt();
        let weighted_mean_deviation = weighted_deviation / sum_w;
        let mean_uncertainty = sigma_min / sum_w.sqrt();

        let chi_square: f64 = records
            .iter()
            .map(|r| ((r.deviation() - weighted_mean_deviation) / r.effective_uncertainty()).powi(2))
            .sum();
        let chi_square_p_value = chi_square_p_value(chi_square, records.len() - 1);

        debug!(
            domain = %domain,
            records = records.len(),
            aggregate_z = z,
            chi_square,
            "records aggregated"
        );

        Ok(DomainAggregate {
            domain,
            p_value: two_sided_p_value(z),
            z,
            weighted_mean_deviation,
            mean_uncertainty,
            chi_square,
            chi_square_p_value,
            records,
        })
    }
}
