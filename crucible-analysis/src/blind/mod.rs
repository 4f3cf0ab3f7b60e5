//! Blind analysis: decision thresholds are frozen before the data is
//! revealed, and every protocol step is recorded in a hash-chained log.

pub mod gate;
pub mod log;

pub use gate::BlindAnalysisGate;
pub use log::{verify_chain, BlindEvent, BlindLogEntry, BlindLogSink, InMemoryBlindLog, JsonlBlindLog};
