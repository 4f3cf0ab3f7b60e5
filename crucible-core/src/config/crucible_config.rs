//! Top-level Crucible configuration with layered resolution.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{FdrConfig, PredictionConfig, SamplerConfig, SystematicConfig, VerdictConfig};
use super::prediction_config::NullModelConfig;
use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`CRUCIBLE_*`)
/// 3. Project config (`crucible.toml` in the analysis root)
/// 4. User config (`~/.crucible/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrucibleConfig {
    pub systematic: SystematicConfig,
    pub fdr: FdrConfig,
    pub sampler: SamplerConfig,
    pub verdict: VerdictConfig,
    /// Pre-registered predictions keyed by prediction id.
    pub predictions: BTreeMap<String, PredictionConfig>,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub sampler_seed: Option<u64>,
    pub sampler_max_iterations: Option<usize>,
    pub fdr_alpha: Option<f64>,
    pub systematic_threshold: Option<f64>,
}

impl CrucibleConfig {
    /// Load configuration with layered resolution, then validate it.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(ConfigError::ParseError { .. }) => {
                        return Err(ConfigError::ParseError {
                            path: user_config_path.display().to_string(),
                            message: "invalid TOML in user config".to_string(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string. Does not validate.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &CrucibleConfig) -> Result<(), ConfigError> {
        let threshold = config.systematic.effective_threshold();
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "systematic.threshold".to_string(),
                message: "must be a positive finite number".to_string(),
            });
        }
        let scale = config.systematic.effective_inflation_scale();
        if !scale.is_finite() || scale < 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "systematic.inflation_scale".to_string(),
                message: "must be finite and non-negative".to_string(),
            });
        }
        let alpha = config.fdr.effective_alpha();
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::ValidationFailed {
                field: "fdr.alpha".to_string(),
                message: "must be between 0.0 and 1.0 (exclusive)".to_string(),
            });
        }
        if config.sampler.seed.is_none() {
            return Err(ConfigError::ValidationFailed {
                field: "sampler.seed".to_string(),
                message: "an explicit seed is required".to_string(),
            });
        }
        if config.sampler.effective_live_points() < 2 {
            return Err(ConfigError::ValidationFailed {
                field: "sampler.live_points".to_string(),
                message: "must be at least 2".to_string(),
            });
        }
        if config.sampler.effective_max_iterations() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "sampler.max_iterations".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.sampler.effective_walk_steps() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "sampler.walk_steps".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        let dlogz = config.sampler.effective_dlogz();
        if !dlogz.is_finite() || dlogz <= 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "sampler.dlogz".to_string(),
                message: "must be a positive finite number".to_string(),
            });
        }
        let max_error = config.sampler.effective_max_log_evidence_error();
        if !max_error.is_finite() || max_error <= 0.0 {
            return Err(ConfigError::ValidationFailed {
                field: "sampler.max_log_evidence_error".to_string(),
                message: "must be a positive finite number".to_string(),
            });
        }
        if let Some(min_lbf) = config.verdict.min_log_bayes_factor {
            if !min_lbf.is_finite() {
                return Err(ConfigError::ValidationFailed {
                    field: "verdict.min_log_bayes_factor".to_string(),
                    message: "must be finite".to_string(),
                });
            }
        }
        for (id, prediction) in &config.predictions {
            prediction.condition().validate(id)?;
            for (name, prior) in &prediction.prior {
                prior.check().map_err(|message| ConfigError::InvalidValue {
                    field: format!("predictions.{id}.prior.{name}"),
                    message,
                })?;
            }
            if let NullModelConfig::FreeDeviation { prior } = prediction.effective_null_model() {
                prior.check().map_err(|message| ConfigError::InvalidValue {
                    field: format!("predictions.{id}.null_model.prior"),
                    message,
                })?;
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.crucible/config.toml`.
    fn user_config_path() -> Option<std::path::PathBuf> {
        dirs_path().map(|d| d.join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut CrucibleConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: CrucibleConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value. Predictions merge per id.
    fn merge(base: &mut CrucibleConfig, other: &CrucibleConfig) {
        // Systematic
        if other.systematic.threshold.is_some() {
            base.systematic.threshold = other.systematic.threshold;
        }
        if other.systematic.inflation_scale.is_some() {
            base.systematic.inflation_scale = other.systematic.inflation_scale;
        }

        // FDR
        if other.fdr.alpha.is_some() {
            base.fdr.alpha = other.fdr.alpha;
        }
        if other.fdr.step_rule.is_some() {
            base.fdr.step_rule = other.fdr.step_rule;
        }

        // Sampler
        if other.sampler.live_points.is_some() {
            base.sampler.live_points = other.sampler.live_points;
        }
        if other.sampler.max_iterations.is_some() {
            base.sampler.max_iterations = other.sampler.max_iterations;
        }
        if other.sampler.seed.is_some() {
            base.sampler.seed = other.sampler.seed;
        }
        if other.sampler.walk_steps.is_some() {
            base.sampler.walk_steps = other.sampler.walk_steps;
        }
        if other.sampler.dlogz.is_some() {
            base.sampler.dlogz = other.sampler.dlogz;
        }
        if other.sampler.max_log_evidence_error.is_some() {
            base.sampler.max_log_evidence_error = other.sampler.max_log_evidence_error;
        }
        if other.sampler.timeout_ms.is_some() {
            base.sampler.timeout_ms = other.sampler.timeout_ms;
        }

        // Verdict
        if other.verdict.require_bayes_support.is_some() {
            base.verdict.require_bayes_support = other.verdict.require_bayes_support;
        }
        if other.verdict.min_log_bayes_factor.is_some() {
            base.verdict.min_log_bayes_factor = other.verdict.min_log_bayes_factor;
        }

        // Predictions
        for (id, prediction) in &other.predictions {
            base.predictions.insert(id.clone(), prediction.clone());
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `CRUCIBLE_FDR_ALPHA`, `CRUCIBLE_SAMPLER_SEED`, etc.
    fn apply_env_overrides(config: &mut CrucibleConfig) {
        if let Ok(val) = std::env::var("CRUCIBLE_SYSTEMATIC_THRESHOLD") {
            if let Ok(v) = val.parse::<f64>() {
                config.systematic.threshold = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CRUCIBLE_FDR_ALPHA") {
            if let Ok(v) = val.parse::<f64>() {
                config.fdr.alpha = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CRUCIBLE_SAMPLER_SEED") {
            if let Ok(v) = val.parse::<u64>() {
                config.sampler.seed = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CRUCIBLE_SAMPLER_MAX_ITERATIONS") {
            if let Ok(v) = val.parse::<usize>() {
                config.sampler.max_iterations = Some(v);
            }
        }
        if let Ok(val) = std::env::var("CRUCIBLE_SAMPLER_LIVE_POINTS") {
            if let Ok(v) = val.parse::<usize>() {
                config.sampler.live_points = Some(v);
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut CrucibleConfig, cli: &CliOverrides) {
        if let Some(v) = cli.sampler_seed {
            config.sampler.seed = Some(v);
        }
        if let Some(v) = cli.sampler_max_iterations {
            config.sampler.max_iterations = Some(v);
        }
        if let Some(v) = cli.fdr_alpha {
            config.fdr.alpha = Some(v);
        }
        if let Some(v) = cli.systematic_threshold {
            config.systematic.threshold = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Returns the user-level config directory: `~/.crucible/`.
fn dirs_path() -> Option<std::path::PathBuf> {
    home_dir().map(|h| h.join(".crucible"))
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<std::path::PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(std::path::PathBuf::from)
}
