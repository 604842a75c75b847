//! Structured logging bootstrap: `tracing` + `tracing-subscriber`, an
//! `EnvFilter` layered under the `fmt` layer. One entry point, called once
//! from the CLI binary, driven by the configured `log_level` (spec §6).

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global `tracing` subscriber. `level` is the configured
/// `log_level` (spec §6); `RUST_LOG`, if set, always takes precedence,
/// matching `tracing_subscriber::EnvFilter`'s usual behavior.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
