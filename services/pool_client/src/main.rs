use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tidepool_amm::{QuoteError, QuotingEngine};
use tidepool_client::logging::{self, LogEmoji};
use tidepool_client::notice::{self, Symbols};
use tidepool_client::{log_refresh, log_success, run_refresh_loop, EvmGateway};
use tidepool_config::ClientConfig;
use tidepool_types::{Address, Amount, TokenSide};
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "tidepool", version, about = "Quotes against a constant-product liquidity pool")]
struct Cli {
    /// TOML configuration file; TIDEPOOL__SECTION__KEY variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of panels
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reserves, LP supply, fee schedule and fees collected
    Pool,
    /// Wallet balances of an account
    Balances { account: String },
    /// Output and fee for selling an amount of one token
    QuoteSwap {
        #[arg(long, value_enum, default_value = "token0")]
        from: Side,
        amount: String,
    },
    /// Token1 required alongside a token0 deposit
    QuoteDeposit { amount0: String },
    /// Tokens returned for burning LP tokens
    QuoteWithdraw { lp_amount: String },
    /// Pool share and fees earned by an account
    Rewards { account: String },
    /// Refresh the pool periodically until Ctrl-C
    Watch {
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    Token0,
    Token1,
}

impl From<Side> for TokenSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Token0 => TokenSide::Token0,
            Side::Token1 => TokenSide::Token1,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init(&config.logging)?;

    let gateway = EvmGateway::connect(&config)?;
    let engine = QuotingEngine::new(gateway, config.engine_settings()?);
    let symbols = Symbols::from_config(&config);

    match run(cli.command, cli.json, &engine, &config, &symbols).await {
        Ok(()) => Ok(()),
        Err(error) => match error.downcast_ref::<QuoteError>() {
            Some(quote_error) => {
                eprintln!("{}", notice::render_failure(quote_error));
                std::process::exit(notice::exit_code(quote_error));
            }
            None => Err(error),
        },
    }
}

async fn run(
    command: Command,
    json: bool,
    engine: &QuotingEngine<EvmGateway>,
    config: &ClientConfig,
    symbols: &Symbols,
) -> Result<()> {
    match command {
        Command::Pool => {
            let overview = engine.pool_overview().await?;
            emit(json, &overview, || notice::render_overview(&overview, symbols))
        }
        Command::Balances { account } => {
            let balances = engine.holder_balances(parse_account(&account)?).await?;
            emit(json, &balances, || notice::render_balances(&balances, symbols))
        }
        Command::QuoteSwap { from, amount } => {
            let amount_in = parse_amount(&amount)?;
            prime(engine).await;
            let quote = engine.quote_swap(from.into(), amount_in).await?;
            let impact = engine.price_impact(&quote.value).ok();
            emit(json, &quote, || notice::render_quote(&quote, impact, symbols))
        }
        Command::QuoteDeposit { amount0 } => {
            let amount0 = parse_amount(&amount0)?;
            prime(engine).await;
            let required = engine.quote_paired_deposit(amount0).await?;
            emit(json, &required, || {
                notice::render_paired_deposit(amount0, &required, symbols)
            })
        }
        Command::QuoteWithdraw { lp_amount } => {
            let lp_amount = parse_amount(&lp_amount)?;
            let preview = engine.quote_withdraw(lp_amount).await?;
            emit(json, &preview, || {
                notice::render_withdraw(lp_amount, &preview, symbols)
            })
        }
        Command::Rewards { account } => {
            let account = parse_account(&account)?;
            prime(engine).await;
            let rewards = engine.holder_rewards(account).await?;
            emit(json, &rewards, || notice::render_rewards(&rewards, symbols))
        }
        Command::Watch { interval_secs } => {
            let period = interval_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.refresh_interval());
            log_refresh!("Watching pool every {}s, Ctrl-C to stop", period.as_secs());
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            let stats = run_refresh_loop(engine, period, shutdown, |overview| {
                if json {
                    match serde_json::to_string(overview) {
                        Ok(line) => println!("{line}"),
                        Err(e) => warn!("Failed to encode overview: {}", e),
                    }
                } else {
                    print!("{}", notice::render_overview(overview, symbols));
                }
            })
            .await;
            log_success!(
                "Stopped after {} refreshes ({} failed)",
                stats.succeeded + stats.failed,
                stats.failed
            );
            Ok(())
        }
    }
}

/// Read the pool before a quote so the fallback has reserves to work from
async fn prime(engine: &QuotingEngine<EvmGateway>) {
    if let Err(e) = engine.refresh().await {
        warn!("{} Pool refresh failed, quoting without a snapshot: {}", LogEmoji::WARNING, e);
    }
}

fn parse_amount(input: &str) -> Result<Amount> {
    Amount::from_decimal_str(input)
        .map_err(QuoteError::from)
        .map_err(Into::into)
}

fn parse_account(input: &str) -> Result<Address> {
    Address::from_str(input.trim())
        .map_err(|_| QuoteError::invalid(format!("not an account address: {input}")))
        .map_err(Into::into)
}

fn emit<T: Serialize>(json: bool, value: &T, panel: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", panel());
    }
    Ok(())
}
