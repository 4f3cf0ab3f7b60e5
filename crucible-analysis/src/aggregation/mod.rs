//! Domain aggregation: inverse-variance weighted combination of the records
//! that test one prediction (or one domain) into a single z statistic.

pub mod aggregator;
pub mod significance;
pub mod types;

pub use aggregator::DomainAggregator;
pub use significance::{chi_square_p_value, two_sided_p_value};
pub use types::DomainAggregate;
