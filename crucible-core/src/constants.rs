//! Shared constants for the Crucible validation engine.

/// Crucible version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ---- Systematic Budget ----

/// Default complexity-to-precision ratio above which a systematic term is included.
pub const DEFAULT_SYSTEMATIC_THRESHOLD: f64 = 1.0 / 300.0;

/// Default proportionality constant for the systematic inflation term.
/// The inflation saturates at this multiple of the observed uncertainty.
pub const DEFAULT_INFLATION_SCALE: f64 = 0.5;

// ---- False Discovery Rate ----

/// Default global false-discovery-rate budget.
pub const DEFAULT_FDR_ALPHA: f64 = 0.05;

// ---- Nested Sampling ----

/// Default number of live points.
pub const DEFAULT_LIVE_POINTS: usize = 400;

/// Default iteration budget before a sampler run is declared non-converged.
pub const DEFAULT_MAX_ITERATIONS: usize = 20_000;

/// Default number of random-walk steps per replacement point.
pub const DEFAULT_WALK_STEPS: usize = 20;

/// Default termination criterion: remaining log-evidence contribution.
pub const DEFAULT_DLOGZ: f64 = 0.01;

/// Default ceiling on the log-evidence uncertainty of a converged run.
pub const DEFAULT_MAX_LOG_EVIDENCE_ERROR: f64 = 0.5;

// ---- Verdicts ----

/// Default confirmation band, in standard deviations of the aggregate deviation.
pub const DEFAULT_CONFIRMATION_BAND: (f64, f64) = (-2.0, 2.0);

/// Default reference value predicted by the null model.
pub const DEFAULT_NULL_REFERENCE: f64 = 0.0;

/// Jeffreys scale: Bayes factor above which evidence is "substantial".
pub const BAYES_FACTOR_SUBSTANTIAL: f64 = 3.0;

/// Jeffreys scale: Bayes factor above which evidence is "strong".
pub const BAYES_FACTOR_STRONG: f64 = 10.0;

/// Jeffreys scale: Bayes factor above which evidence is "decisive".
pub const BAYES_FACTOR_DECISIVE: f64 = 100.0;

// ---- Blind Analysis ----

/// Parameter name under which the FDR budget is frozen.
pub const PARAM_FDR_ALPHA: &str = "fdr_alpha";

/// Parameter name under which the systematic threshold is frozen.
pub const PARAM_SYSTEMATIC_THRESHOLD: &str = "systematic_threshold";

/// Parameter name under which the systematic inflation scale is frozen.
pub const PARAM_INFLATION_SCALE: &str = "inflation_scale";

/// Setting name under which the FDR step rule is frozen.
pub const SETTING_FDR_STEP_RULE: &str = "fdr_step_rule";

/// Setting name under which the verdict Bayes-factor requirement is frozen.
pub const SETTING_MIN_LOG_BAYES_FACTOR: &str = "min_log_bayes_factor";

/// Setting name under which the resolved sampler settings and seed are frozen.
pub const SETTING_SAMPLER: &str = "sampler";

/// Prefix of the per-prediction model settings (`prediction.<id>.model`).
pub const SETTING_PREDICTION_PREFIX: &str = "prediction.";

/// Hash value used as `prev_hash` of the first blind-log entry.
pub const BLIND_LOG_GENESIS_HASH: u64 = 0;

// ---- Environment ----

/// Environment variable read by `init_tracing`.
pub const LOG_ENV_VAR: &str = "CRUCIBLE_LOG";

/// Project-level configuration file name.
pub const PROJECT_CONFIG_FILE: &str = "crucible.toml";
