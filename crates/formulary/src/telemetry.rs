//! Tracing initialization.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// filter; calling twice is a no-op.
pub fn init(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(logging.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    });
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
