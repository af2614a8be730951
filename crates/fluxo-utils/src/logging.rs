//! Logging and tracing utilities

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    init_tracing_with(&LoggingConfig::default());
}

/// Initialize tracing subscriber from logging settings
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing_with(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }

    tracing::debug!(level = %config.level, format = ?config.format, "Tracing initialized");
}
