//! Named-source systematic budget.
//!
//! A source with amplitude `a` and complexity `c` is worth modelling only if
//! `a > c · threshold`; included amplitudes combine in quadrature.

use serde::{Deserialize, Serialize};

/// One characterised systematic effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystematicSource {
    pub name: String,
    pub amplitude: f64,
    pub complexity: f64,
}

impl SystematicSource {
    pub fn new(name: impl Into<String>, amplitude: f64, complexity: f64) -> Self {
        Self {
            name: name.into(),
            amplitude,
            complexity,
        }
    }

    /// Amplitude a source of this complexity must exceed to be included.
    pub fn inclusion_threshold(&self, threshold: f64) -> f64 {
        self.complexity * threshold
    }
}

/// Sources split by the inclusion rule, with their quadrature total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystematicBudget {
    pub included: Vec<SystematicSource>,
    pub excluded: Vec<SystematicSource>,
    pub total: f64,
}

impl SystematicBudget {
    pub fn from_sources(sources: &[SystematicSource], threshold: f64) -> Self {
        let (included, excluded): (Vec<_>, Vec<_>) = sources
            .iter()
            .cloned()
            .partition(|s| s.amplitude.abs() > s.inclusion_threshold(threshold));
        let total = included.iter().fold(0.0, |acc: f64, s| acc.hypot(s.amplitude));
        Self {
            included,
            excluded,
            total,
        }
    }

    /// Quadrature sum of this budget and a statistical uncertainty.
    pub fn combined_with(&self, statistical: f64) -> f64 {
        statistical.hypot(self.total)
    }
}
