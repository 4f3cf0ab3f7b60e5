//! Prior specifications and their unit-cube transforms.

use std::collections::BTreeMap;

use statrs::distribution::{ContinuousCDF, Normal};

use crucible_core::errors::SamplingError;
use crucible_core::types::PriorDistribution;

/// Probability mass kept away from 0 and 1 before inverting a normal CDF.
const QUANTILE_CLAMP: f64 = 1e-12;

/// Maps a point of the unit interval to parameter space.
pub trait PriorTransform {
    fn quantile(&self, u: f64) -> f64;
}

impl PriorTransform for PriorDistribution {
    fn quantile(&self, u: f64) -> f64 {
        match *self {
            PriorDistribution::Uniform { low, high } => low + u * (high - low),
            PriorDistribution::Normal { mean, std_dev } => {
                let u = u.clamp(QUANTILE_CLAMP, 1.0 - QUANTILE_CLAMP);
                match Normal::new(mean, std_dev) {
                    Ok(dist) => dist.inverse_cdf(u),
                    Err(_) => mean,
                }
            }
            PriorDistribution::LogUniform { low, high } => {
                (low.ln() + u * (high.ln() - low.ln())).exp()
            }
        }
    }
}

/// What a named parameter does to the Gaussian likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRole {
    /// Additive shift of every model center.
    Offset,
    /// Multiplicative scale on every uncertainty.
    ErrorScale,
    /// Free deviation of the null model from the prediction.
    Deviation,
}

impl ParameterRole {
    pub fn name(self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::ErrorScale => "error_scale",
            Self::Deviation => "deviation",
        }
    }

    /// Roles a caller may place a prior on. `deviation` belongs to the null model.
    fn from_user_name(name: &str) -> Option<Self> {
        match name {
            "offset" => Some(Self::Offset),
            "error_scale" => Some(Self::ErrorScale),
            _ => None,
        }
    }
}

/// Ordered priors on the nuisance parameters of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorSpec {
    parameters: Vec<(ParameterRole, PriorDistribution)>,
}

impl PriorSpec {
    /// No free parameters: the evidence equals the likelihood.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a name → distribution map (as read from configuration).
    pub fn from_map(priors: &BTreeMap<String, PriorDistribution>) -> Result<Self, SamplingError> {
        let mut spec = Self::new();
        for (name, dist) in priors {
            spec.insert(name, *dist)?;
        }
        Ok(spec)
    }

    /// Add or replace the prior on a named nuisance parameter.
    pub fn insert(&mut self, name: &str, dist: PriorDistribution) -> Result<(), SamplingError> {
        let role = ParameterRole::from_user_name(name).ok_or_else(|| SamplingError::InvalidPrior {
            parameter: name.to_string(),
            message: "unknown parameter; expected `offset` or `error_scale`".to_string(),
        })?;
        check_support(role, &dist)?;
        self.set(role, dist);
        Ok(())
    }

    /// This spec with an additional free deviation parameter.
    pub(crate) fn with_deviation(&self, prior: PriorDistribution) -> Result<Self, SamplingError> {
        check_support(ParameterRole::Deviation, &prior)?;
        let mut spec = self.clone();
        spec.set(ParameterRole::Deviation, prior);
        Ok(spec)
    }

    fn set(&mut self, role: ParameterRole, dist: PriorDistribution) {
        match self.parameters.iter_mut().find(|(r, _)| *r == role) {
            Some(slot) => slot.1 = dist,
            None => self.parameters.push((role, dist)),
        }
    }

    pub fn dim(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = ParameterRole> + '_ {
        self.parameters.iter().map(|(role, _)| *role)
    }

    /// Map a unit-cube point to parameter values, in declaration order.
    pub fn transform(&self, unit: &[f64], out: &mut Vec<f64>) {
        out.clear();
        out.extend(
            self.parameters
                .iter()
                .zip(unit)
                .map(|((_, dist), &u)| dist.quantile(u)),
        );
    }
}

fn check_support(role: ParameterRole, dist: &PriorDistribution) -> Result<(), SamplingError> {
    dist.check().map_err(|message| SamplingError::InvalidPrior {
        parameter: role.name().to_string(),
        message,
    })?;
    if role == ParameterRole::ErrorScale {
        let positive = match *dist {
            PriorDistribution::Uniform { low, .. } => low > 0.0,
            PriorDistribution::LogUniform { .. } => true,
            PriorDistribution::Normal { .. } => false,
        };
        if !positive {
            return Err(SamplingError::InvalidPrior {
                parameter: role.name().to_string(),
                message: "needs strictly positive support".to_string(),
            });
        }
    }
    Ok(())
}
