//! ValidationEventHandler trait with no-op defaults.

use super::types::*;

/// Trait for observing a validation run.
///
/// All methods have no-op default implementations, so handlers only need
/// to override the events they care about. Handlers are called from rayon
/// worker threads, hence `Send + Sync`.
pub trait ValidationEventHandler: Send + Sync {
    // ---- Run Lifecycle ----
    fn on_run_started(&self, _event: &RunStartedEvent) {}
    fn on_run_complete(&self, _event: &RunCompleteEvent) {}

    // ---- Records ----
    fn on_record_rejected(&self, _event: &RecordRejectedEvent) {}

    // ---- Evidence ----
    fn on_sampling_failed(&self, _event: &SamplingFailedEvent) {}

    // ---- Blind Analysis ----
    fn on_unblinded(&self, _event: &UnblindedEvent) {}

    // ---- Verdicts ----
    fn on_verdict_issued(&self, _event: &VerdictIssuedEvent) {}
}

/// Handler that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEventHandler;

impl ValidationEventHandler for NoOpEventHandler {}
