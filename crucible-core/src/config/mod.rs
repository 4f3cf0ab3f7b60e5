//! Configuration system for Crucible.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod crucible_config;
pub mod fdr_config;
pub mod prediction_config;
pub mod sampler_config;
pub mod systematic_config;
pub mod verdict_config;

pub use crucible_config::{CliOverrides, CrucibleConfig};
pub use fdr_config::{FdrConfig, StepRule};
pub use prediction_config::{NullModelConfig, PredictionConfig};
pub use sampler_config::SamplerConfig;
pub use systematic_config::SystematicConfig;
pub use verdict_config::VerdictConfig;
