//! Gaussian likelihood over a set of observations.

use crate::measurement::MeasurementRecord;

use super::prior::{ParameterRole, PriorSpec};

const HALF_LN_2PI: f64 = 0.918_938_533_204_672_8;

/// One observation with the center a model assigns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub observed: f64,
    pub center: f64,
    pub sigma: f64,
}

impl Observation {
    /// Center on the record's prediction.
    pub fn predicted(record: &MeasurementRecord) -> Self {
        Self {
            observed: record.observed_value(),
            center: record.predicted_value(),
            sigma: record.effective_uncertainty(),
        }
    }

    /// Center on a fixed reference value.
    pub fn reference(record: &MeasurementRecord, value: f64) -> Self {
        Self {
            observed: record.observed_value(),
            center: value,
            sigma: record.effective_uncertainty(),
        }
    }
}

/// Anything the nested sampler can integrate: a likelihood over the unit cube.
pub trait EvidenceModel: Sync {
    fn dim(&self) -> usize;

    /// Log-likelihood at a unit-cube point. NaN is never returned.
    fn log_likelihood(&self, unit: &[f64]) -> f64;
}

/// `observed_i ~ N(center_i + offset + deviation, sigma_i · error_scale)`.
#[derive(Debug, Clone)]
pub struct GaussianModel {
    observations: Vec<Observation>,
    prior: PriorSpec,
}

impl GaussianModel {
    pub fn new(observations: Vec<Observation>, prior: PriorSpec) -> Self {
        Self { observations, prior }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Log-likelihood for explicit parameter values in prior order.
    pub fn log_likelihood_at(&self, params: &[f64]) -> f64 {
        let mut shift = 0.0;
        let mut scale = 1.0;
        for (role, value) in self.prior.roles().zip(params) {
            match role {
                ParameterRole::Offset | ParameterRole::Deviation => shift += value,
                ParameterRole::ErrorScale => scale *= value,
            }
        }
        if scale.is_nan() || scale <= 0.0 {
            return f64::NEG_INFINITY;
        }

        let total: f64 = self
            .observations
            .iter()
            .map(|obs| {
                let sigma = obs.sigma * scale;
                let residual = (obs.observed - obs.center - shift) / sigma;
                -0.5 * residual * residual - sigma.ln() - HALF_LN_2PI
            })
            .sum();
        if total.is_nan() {
            f64::NEG_INFINITY
        } else {
            total
        }
    }
}

impl EvidenceModel for GaussianModel {
    fn dim(&self) -> usize {
        self.prior.dim()
    }

    fn log_likelihood(&self, unit: &[f64]) -> f64 {
        let mut params = Vec::with_capacity(self.prior.dim());
        self.prior.transform(unit, &mut params);
        self.log_likelihood_at(&params)
    }
}
