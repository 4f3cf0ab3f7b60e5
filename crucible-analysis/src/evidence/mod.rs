//! Bayesian model comparison by nested sampling.

pub mod comparator;
pub mod likelihood;
pub mod nested;
pub mod prior;

pub use comparator::{derive_seed, BayesianComparator, EvidenceStrength, ModelComparison, NullModel};
pub use likelihood::{EvidenceModel, GaussianModel, Observation};
pub use nested::{EvidenceEstimate, NestedSampler, SamplerSettings};
pub use prior::{ParameterRole, PriorSpec, PriorTransform};
