//! Client Configuration Module
//!
//! Layered loading: built-in defaults, then an optional TOML file, then
//! `TIDEPOOL__SECTION__KEY` environment variables.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tidepool_amm::{EngineSettings, RetryPolicy};
use tidepool_types::{Address, FeeSchedule, Fraction, TokenSide};
use tracing::{debug, info};
use url::Url;

/// Environment variable prefix, e.g. `TIDEPOOL__NETWORK__RPC_URL`
pub const ENV_PREFIX: &str = "TIDEPOOL";
const ENV_SEPARATOR: &str = "__";

/// Complete configuration for the pool client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub contracts: ContractsConfig,
    pub fees: FeesConfig,
    pub refresh: RefreshConfig,
    pub fallback: FallbackConfig,
    pub logging: LoggingConfig,
}

/// Ledger connectivity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint; `${VAR}` references are expanded at load
    pub rpc_url: String,
    /// Upper bound on every ledger call
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Deployed contract addresses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    pub token0: Address,
    pub token1: Address,
    pub pool: Address,
    pub token0_symbol: String,
    pub token1_symbol: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        // First three deployments on a fresh local development node
        Self {
            token0: parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            token1: parse_address("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            pool: parse_address("0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
            token0_symbol: "ALPHA".to_string(),
            token1_symbol: "BETA".to_string(),
        }
    }
}

fn parse_address(s: &str) -> Address {
    Address::from_str(s).unwrap_or_default()
}

/// Pool fee parameters, mirrored from the deployed contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    /// Fraction of each trade input kept by the pool
    pub fee_rate: Decimal,
    /// Portion of collected fees credited to liquidity providers
    pub lp_reward_share: Decimal,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.003),
            lp_reward_share: dec!(0.7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    /// Snapshots older than this are re-read before use, and serve the
    /// fallback only with a warning. Capped at one refresh interval.
    pub max_snapshot_age_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 15,
            max_snapshot_age_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub policy: RetryPolicy,
    /// Multiplier on reserves used when accumulated fees cannot be read.
    /// An approximation with unknown error bounds.
    pub accumulated_fee_estimate_rate: Decimal,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::FallbackOnce,
            accumulated_fee_estimate_rate: dec!(0.05),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter; `RUST_LOG` takes precedence
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ClientConfig {
    /// Load defaults, an optional TOML file, then process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`ClientConfig::load`] with an explicit environment instead of
    /// the process one
    pub fn load_with_env(
        path: Option<&Path>,
        environment: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading client config: {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .source(environment),
        );

        let mut config: ClientConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.expand_env_vars()?;
        config.validate()?;
        debug!(?config, "client configuration loaded");
        Ok(config)
    }

    /// Expand `${VAR}` references in the RPC endpoint
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let expanded = shellexpand::env(&self.network.rpc_url)
            .context("Failed to expand rpc_url")?;
        self.network.rpc_url = expanded.into_owned();
        Ok(())
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.network.rpc_url)
            .with_context(|| format!("Invalid rpc_url: {}", self.network.rpc_url))?;

        if self.network.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }

        if self.contracts.token0 == self.contracts.token1 {
            bail!("token0 and token1 must be different contracts");
        }

        if self.contracts.token0_symbol.trim().is_empty()
            || self.contracts.token1_symbol.trim().is_empty()
        {
            bail!("token symbols must not be empty");
        }

        if self.fees.fee_rate < Decimal::ZERO || self.fees.fee_rate >= Decimal::ONE {
            bail!("fee_rate must be in [0, 1), got {}", self.fees.fee_rate);
        }

        if self.fees.lp_reward_share < Decimal::ZERO || self.fees.lp_reward_share > Decimal::ONE {
            bail!(
                "lp_reward_share must be in [0, 1], got {}",
                self.fees.lp_reward_share
            );
        }

        let rate = self.fallback.accumulated_fee_estimate_rate;
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            bail!("accumulated_fee_estimate_rate must be in [0, 1], got {}", rate);
        }

        if self.refresh.interval_secs == 0 {
            bail!("refresh interval_secs must be positive");
        }

        // Exact 18-digit conversion, so nothing is silently rounded later
        self.fee_schedule()?;
        Fraction::from_decimal(rate).context("accumulated_fee_estimate_rate")?;

        Ok(())
    }

    /// Fee parameters as exact fixed-point fractions
    pub fn fee_schedule(&self) -> Result<FeeSchedule> {
        let fee_rate = Fraction::from_decimal(self.fees.fee_rate).context("fee_rate")?;
        let lp_reward_share =
            Fraction::from_decimal(self.fees.lp_reward_share).context("lp_reward_share")?;
        Ok(FeeSchedule::new(fee_rate, lp_reward_share)?)
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        Ok(EngineSettings {
            schedule: self.fee_schedule()?,
            policy: self.fallback.policy,
            accumulated_fee_estimate_rate: Fraction::from_decimal(
                self.fallback.accumulated_fee_estimate_rate,
            )
            .context("accumulated_fee_estimate_rate")?,
            max_snapshot_age: self.max_snapshot_age(),
        })
    }

    /// Reuse bound for a stored snapshot, never beyond one refresh cycle
    pub fn max_snapshot_age(&self) -> Duration {
        Duration::from_secs(
            self.refresh
                .max_snapshot_age_secs
                .min(self.refresh.interval_secs),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.interval_secs)
    }

    /// Display symbol for one side of the pool
    pub fn symbol(&self, side: TokenSide) -> &str {
        match side {
            TokenSide::Token0 => &self.contracts.token0_symbol,
            TokenSide::Token1 => &self.contracts.token1_symbol,
        }
    }
}
