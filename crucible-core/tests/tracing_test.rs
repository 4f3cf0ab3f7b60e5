//! Tests for the Crucible tracing setup.

use std::sync::Mutex;

use crucible_core::tracing::init_tracing;

/// Serializes tests that manipulate `CRUCIBLE_LOG`.
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_per_subsystem_filter_accepted() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("CRUCIBLE_LOG", "crucible_analysis::evidence=debug,crucible_core=warn");
    init_tracing();
    std::env::remove_var("CRUCIBLE_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_filter_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("CRUCIBLE_LOG", "=====not a filter");
    init_tracing();
    std::env::remove_var("CRUCIBLE_LOG");
}
