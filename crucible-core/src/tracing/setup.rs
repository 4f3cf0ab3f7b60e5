//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV_VAR;

static INIT: Once = Once::new();

/// Initialize the Crucible tracing/logging system.
///
/// Reads the `CRUCIBLE_LOG` environment variable for per-subsystem levels.
/// Format: `CRUCIBLE_LOG=crucible_analysis::evidence=debug,crucible_analysis::blind=info`
///
/// Falls back to `info` for both Crucible crates if `CRUCIBLE_LOG` is unset
/// or invalid. Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("crucible_core=info,crucible_analysis=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
