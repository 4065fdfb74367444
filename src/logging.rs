//! Logging setup
//!
//! Initializes the tracing subscriber for the CLI tools. `RUST_LOG`
//! overrides the configured level when set.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber with the given default level.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
