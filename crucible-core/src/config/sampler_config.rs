//! Nested-sampling configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DLOGZ, DEFAULT_LIVE_POINTS, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_LOG_EVIDENCE_ERROR,
    DEFAULT_WALK_STEPS,
};

/// Configuration for the evidence estimator.
///
/// `seed` has no default: a run without an explicit seed is rejected by
/// validation so every result can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of live points. Default: 400.
    pub live_points: Option<usize>,
    /// Iteration budget. Default: 20 000.
    pub max_iterations: Option<usize>,
    /// Seed for every sampler stream. Required.
    pub seed: Option<u64>,
    /// Random-walk steps per replacement. Default: 20.
    pub walk_steps: Option<usize>,
    /// Termination threshold on the remaining log-evidence. Default: 0.01.
    pub dlogz: Option<f64>,
    /// Largest acceptable log-evidence uncertainty. Default: 0.5.
    pub max_log_evidence_error: Option<f64>,
    /// Wall-clock budget per sampler run in milliseconds. Default: unbounded.
    pub timeout_ms: Option<u64>,
}

impl SamplerConfig {
    pub fn effective_live_points(&self) -> usize {
        self.live_points.unwrap_or(DEFAULT_LIVE_POINTS)
    }

    pub fn effective_max_iterations(&self) -> usize {
        self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS)
    }

    pub fn effective_walk_steps(&self) -> usize {
        self.walk_steps.unwrap_or(DEFAULT_WALK_STEPS)
    }

    pub fn effective_dlogz(&self) -> f64 {
        self.dlogz.unwrap_or(DEFAULT_DLOGZ)
    }

    pub fn effective_max_log_evidence_error(&self) -> f64 {
        self.max_log_evidence_error
            .unwrap_or(DEFAULT_MAX_LOG_EVIDENCE_ERROR)
    }
}
