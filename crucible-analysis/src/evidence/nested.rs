//! Nested sampling evidence estimator.
//!
//! Skilling's algorithm: a fixed population of live points climbs the
//! likelihood by repeatedly replacing the worst point with a new draw from
//! the prior constrained to higher likelihood. Each replacement shrinks the
//! enclosed prior volume by `e^{-1/N}`; the evidence is the sum of
//! likelihood times shell volume. Replacements come from a random walk
//! started at a surviving live point, with a step size adapted to keep the
//! acceptance rate near one half.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crucible_core::config::SamplerConfig;
use crucible_core::constants::{
    DEFAULT_DLOGZ, DEFAULT_LIVE_POINTS, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_LOG_EVIDENCE_ERROR,
    DEFAULT_WALK_STEPS,
};
use crucible_core::errors::SamplingError;
use crucible_core::traits::Cancellable;

use super::likelihood::EvidenceModel;

const INITIAL_STEP: f64 = 0.1;
const MIN_STEP: f64 = 1e-6;
const MAX_STEP: f64 = 1.0;

/// Resolved sampler settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerSettings {
    pub live_points: usize,
    pub max_iterations: usize,
    pub walk_steps: usize,
    pub dlogz: f64,
    pub max_log_evidence_error: f64,
    pub timeout: Option<Duration>,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            live_points: DEFAULT_LIVE_POINTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            walk_steps: DEFAULT_WALK_STEPS,
            dlogz: DEFAULT_DLOGZ,
            max_log_evidence_error: DEFAULT_MAX_LOG_EVIDENCE_ERROR,
            timeout: None,
        }
    }
}

impl SamplerSettings {
    pub fn from_config(config: &SamplerConfig) -> Self {
        Self {
            live_points: config.effective_live_points(),
            max_iterations: config.effective_max_iterations(),
            walk_steps: config.effective_walk_steps(),
            dlogz: config.effective_dlogz(),
            max_log_evidence_error: config.effective_max_log_evidence_error(),
            timeout: config.timeout_ms.map(Duration::from_millis),
        }
    }

    fn check(&self) -> Result<(), SamplingError> {
        if self.live_points < 2 {
            return Err(SamplingError::InvalidSettings(format!(
                "live_points must be at least 2, got {}",
                self.live_points
            )));
        }
        if self.walk_steps == 0 {
            return Err(SamplingError::InvalidSettings(
                "walk_steps must be greater than 0".to_string(),
            ));
        }
        if !(self.dlogz.is_finite() && self.dlogz > 0.0) {
            return Err(SamplingError::InvalidSettings(format!(
                "dlogz must be positive, got {}",
                self.dlogz
            )));
        }
        Ok(())
    }
}

/// Result of one nested-sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvidenceEstimate {
    /// Natural log of the marginal likelihood.
    pub log_evidence: f64,
    /// `sqrt(H / N)`.
    pub log_evidence_error: f64,
    /// Kullback-Leibler information `H` of posterior relative to prior, in nats.
    pub information: f64,
    pub iterations: usize,
    /// Remaining-evidence estimate at termination.
    pub remaining_dlogz: f64,
}

#[derive(Debug, Clone)]
struct LivePoint {
    unit: Vec<f64>,
    log_l: f64,
}

/// Nested sampler bound to a set of settings. Each `run` owns its RNG.
#[derive(Debug, Clone, Default)]
pub struct NestedSampler {
    settings: SamplerSettings,
}

impl NestedSampler {
    pub fn new(settings: SamplerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    /// Estimate the evidence of `model` with a stream seeded from `seed`.
    /// Identical inputs give bit-identical output.
    pub fn run(
        &self,
        model: &dyn EvidenceModel,
        seed: u64,
        cancel: Option<&dyn Cancellable>,
    ) -> Result<EvidenceEstimate, SamplingError> {
        self.settings.check()?;

        let dim = model.dim();
        if dim == 0 {
            // No free parameters: the evidence is the likelihood itself.
            return Ok(EvidenceEstimate {
                log_evidence: model.log_likelihood(&[]),
                log_evidence_error: 0.0,
                information: 0.0,
                iterations: 0,
                remaining_dlogz: 0.0,
            });
        }

        let started = Instant::now();
        let n = self.settings.live_points;
        let n_f = n as f64;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut live: Vec<LivePoint> = (0..n)
            .map(|_| {
                let unit: Vec<f64> = (0..dim).map(|_| rng.gen::<f64>()).collect();
                let log_l = model.log_likelihood(&unit);
                LivePoint { unit, log_l }
            })
            .collect();

        let shrink = -1.0 / n_f;
        let log_shell_fraction = (-(shrink.exp_m1())).ln();
        let mut log_z = f64::NEG_INFINITY;
        let mut information = 0.0;
        let mut log_x = 0.0;
        let mut step = INITIAL_STEP;
        let mut iterations = 0;
        let mut remaining = f64::INFINITY;
        let mut converged = false;

        while iterations < self.settings.max_iterations {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                return Err(SamplingError::Cancelled);
            }
            if let Some(timeout) = self.settings.timeout {
                let elapsed = started.elapsed();
                if elapsed > timeout {
                    return Err(SamplingError::TimedOut {
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
            }

            let (worst, l_star, l_max) = extremes(&live);
            remaining = remaining_log_evidence(l_max, log_x, log_z);
            if remaining < self.settings.dlogz || l_max <= l_star {
                converged = true;
                break;
            }

            let log_weight = log_x + log_shell_fraction + l_star;
            accumulate(&mut log_z, &mut information, log_weight, l_star);
            log_x += shrink;

            // Start the walk from a uniformly chosen survivor above the contour.
            let survivors: Vec<usize> = (0..n).filter(|&i| live[i].log_l > l_star).collect();
            let start = survivors[rng.gen_range(0..survivors.len())];
            let (point, acceptance) =
                self.constrained_walk(model, &live[start], l_star, step, &mut rng);
            step = if acceptance > 0.5 { step * 1.1 } else { step * 0.9 }.clamp(MIN_STEP, MAX_STEP);
            live[worst] = point;

            iterations += 1;
        }

        if !converged {
            // The budget may run out exactly as the criterion is met.
            let (_, l_star, l_max) = extremes(&live);
            remaining = remaining_log_evidence(l_max, log_x, log_z);
            if remaining >= self.settings.dlogz && l_max > l_star {
                debug!(iterations, remaining_dlogz = remaining, "nested sampling exhausted its budget");
                return Err(SamplingError::DidNotConverge {
                    iterations,
                    remaining_dlogz: remaining,
                    tolerance: self.settings.dlogz,
                });
            }
        }

        // Spread the final prior volume evenly over the surviving live points.
        let log_final_share = log_x - n_f.ln();
        for point in &live {
            accumulate(&mut log_z, &mut information, log_final_share + point.log_l, point.log_l);
        }

        let information = information.max(0.0);
        let log_evidence_error = (information / n_f).sqrt();
        if log_evidence_error > self.settings.max_log_evidence_error {
            return Err(SamplingError::EvidenceTooUncertain {
                log_evidence_error,
                tolerance: self.settings.max_log_evidence_error,
            });
        }

        debug!(
            iterations,
            log_evidence = log_z,
            log_evidence_error,
            information,
            "nested sampling converged"
        );

        Ok(EvidenceEstimate {
            log_evidence: log_z,
            log_evidence_error,
            information,
            iterations,
            remaining_dlogz: remaining,
        })
    }

    /// Random walk from `start` constrained to `log_l > l_star`.
    /// Returns the final point and the acceptance rate.
    fn constrained_walk(
        &self,
        model: &dyn EvidenceModel,
        start: &LivePoint,
        l_star: f64,
        step: f64,
        rng: &mut StdRng,
    ) -> (LivePoint, f64) {
        let mut current = start.clone();
        let mut proposal = vec![0.0; current.unit.len()];
        let mut accepted = 0usize;

        for _ in 0..self.settings.walk_steps {
            for (p, &u) in proposal.iter_mut().zip(&current.unit) {
                *p = u + step * (2.0 * rng.gen::<f64>() - 1.0);
            }
            if proposal.iter().any(|&p| !(0.0..=1.0).contains(&p)) {
                continue;
            }
            let log_l = model.log_likelihood(&proposal);
            if log_l > l_star {
                current.unit.copy_from_slice(&proposal);
                current.log_l = log_l;
                accepted += 1;
            }
        }

        (current, accepted as f64 / self.settings.walk_steps as f64)
    }
}

/// Index of the lowest live point, its log-likelihood, and the highest.
/// Ties resolve to the lowest index.
fn extremes(live: &[LivePoint]) -> (usize, f64, f64) {
    let mut worst = 0;
    let mut l_min = f64::INFINITY;
    let mut l_max = f64::NEG_INFINITY;
    for (i, point) in live.iter().enumerate() {
        if point.log_l < l_min {
            l_min = point.log_l;
            worst = i;
        }
        if point.log_l > l_max {
            l_max = point.log_l;
        }
    }
    (worst, l_min, l_max)
}

/// `ln(1 + L_max · X / Z)`.
fn remaining_log_evidence(l_max: f64, log_x: f64, log_z: f64) -> f64 {
    if log_z == f64::NEG_INFINITY {
        return f64::INFINITY;
    }
    let delta = l_max + log_x - log_z;
    if delta > 30.0 {
        delta
    } else {
        delta.exp().ln_1p()
    }
}

/// Add a weight to the running evidence and update the information `H`.
fn accumulate(log_z: &mut f64, information: &mut f64, log_weight: f64, log_l: f64) {
    if log_weight == f64::NEG_INFINITY {
        return;
    }
    let log_z_new = log_add_exp(*log_z, log_weight);
    let from_new = (log_weight - log_z_new).exp() * log_l;
    let from_old = if *log_z == f64::NEG_INFINITY {
        0.0
    } else {
        (*log_z - log_z_new).exp() * (*information + *log_z)
    };
    *information = from_new + from_old - log_z_new;
    *log_z = log_z_new;
}

fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let max = a.max(b);
    max + ((a - max).exp() + (b - max).exp()).ln()
}
