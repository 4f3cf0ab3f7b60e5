//! Measurement records: one observed quantity, its uncertainty, the
//! prediction it tests, and its provenance.

pub mod types;

pub use types::{MeasurementRecord, RawMeasurement, SystematicAnnotation};
