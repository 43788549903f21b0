//! # Tidepool Client Configuration
//!
//! Loads [`ClientConfig`] from built-in defaults, an optional TOML file and
//! `TIDEPOOL__SECTION__KEY` environment variables, in that order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tidepool_config::ClientConfig;
//!
//! let config = ClientConfig::load(None)?;
//! let settings = config.engine_settings()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod client_config;

pub use client_config::{
    ClientConfig, ContractsConfig, FallbackConfig, FeesConfig, LoggingConfig, NetworkConfig,
    RefreshConfig, ENV_PREFIX,
};
