//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Fallback filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "queue_task_executor=info";

/// Initialize tracing. Users can install their own subscriber; this helper
/// installs a default env-based subscriber if none is set.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_FILTER);
}

/// Like [`init_tracing`], with `default_filter` applied when `RUST_LOG` is
/// unset or unparsable. Safe to call repeatedly.
pub fn init_tracing_with(default_filter: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
