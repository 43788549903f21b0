//! Log setup and the status markers used across the client

use anyhow::{Context, Result};
use tidepool_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Standard emoji set for client logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅";
    pub const ERROR: &'static str = "❌";
    pub const WARNING: &'static str = "⚠️";

    // Module-specific
    pub const NETWORK: &'static str = "🌐";
    pub const POOL: &'static str = "🏊";
    pub const REFRESH: &'static str = "🔄";
    pub const MONEY: &'static str = "💰";
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to install JSON log subscriber")
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to install log subscriber")
    }
}

#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SUCCESS, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        tracing::error!("{} {}", $crate::logging::LogEmoji::ERROR, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_refresh {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::REFRESH, format!($($arg)*))
    };
}
