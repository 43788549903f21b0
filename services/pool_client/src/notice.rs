//! Terminal rendering of quotes, balances and failures
//!
//! Every figure that came from the local fallback is printed with an
//! explicit approximate marker.

use crate::logging::LogEmoji;
use std::fmt::Write;
use tidepool_amm::{ErrorClass, HolderRewards, PoolOverview, QuoteError};
use tidepool_config::ClientConfig;
use tidepool_types::{
    Amount, Estimate, Fidelity, Fraction, HolderBalances, PairAmounts, Quote, TokenSide,
};

pub const APPROXIMATE_MARKER: &str = "(approximate)";

/// Process exit codes by failure class, from sysexits(3)
pub const EXIT_INVALID_INPUT: i32 = 65;
pub const EXIT_UNEXPECTED: i32 = 70;
pub const EXIT_TRANSIENT: i32 = 75;

/// Token symbols for display
#[derive(Debug, Clone)]
pub struct Symbols {
    pub token0: String,
    pub token1: String,
}

impl Symbols {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            token0: config.symbol(TokenSide::Token0).to_string(),
            token1: config.symbol(TokenSide::Token1).to_string(),
        }
    }

    pub fn get(&self, side: TokenSide) -> &str {
        match side {
            TokenSide::Token0 => &self.token0,
            TokenSide::Token1 => &self.token1,
        }
    }
}

fn marker(fidelity: Fidelity) -> &'static str {
    match fidelity {
        Fidelity::Authoritative => "",
        Fidelity::Approximate => APPROXIMATE_MARKER,
    }
}

fn line(out: &mut String, label: &str, value: String, fidelity: Fidelity) {
    let marker = marker(fidelity);
    if marker.is_empty() {
        let _ = writeln!(out, "  {label:<22}{value}");
    } else {
        let _ = writeln!(out, "  {label:<22}{value} {marker}");
    }
}

fn pair(amounts: PairAmounts, symbols: &Symbols) -> String {
    format!(
        "{} {} / {} {}",
        amounts.token0, symbols.token0, amounts.token1, symbols.token1
    )
}

pub fn render_quote(
    quote: &Estimate<Quote>,
    price_impact: Option<Fraction>,
    symbols: &Symbols,
) -> String {
    let q = &quote.value;
    let mut out = String::new();
    let _ = writeln!(out, "{} Swap quote", LogEmoji::REFRESH);
    line(
        &mut out,
        "You pay",
        format!("{} {}", q.amount_in, symbols.get(q.token_in)),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        "You receive",
        format!("{} {}", q.amount_out, symbols.get(q.token_out)),
        quote.fidelity,
    );
    line(
        &mut out,
        "Fee",
        format!("{} {}", q.fee_amount, symbols.get(q.token_in)),
        quote.fidelity,
    );
    if let Some(impact) = price_impact {
        line(
            &mut out,
            "Price impact",
            format!("{}%", impact.to_percent_string()),
            Fidelity::Approximate,
        );
    }
    out
}

pub fn render_paired_deposit(
    amount0: Amount,
    required: &Estimate<Amount>,
    symbols: &Symbols,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Add liquidity", LogEmoji::POOL);
    line(
        &mut out,
        "Deposit",
        format!("{} {}", amount0, symbols.token0),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        "Required",
        format!("{} {}", required.value, symbols.token1),
        required.fidelity,
    );
    out
}

pub fn render_withdraw(
    lp_amount: Amount,
    preview: &Estimate<PairAmounts>,
    symbols: &Symbols,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Withdraw liquidity", LogEmoji::POOL);
    line(&mut out, "Burn", format!("{lp_amount} LP"), Fidelity::Authoritative);
    line(&mut out, "Receive", pair(preview.value, symbols), preview.fidelity);
    out
}

pub fn render_overview(overview: &PoolOverview, symbols: &Symbols) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Pool", LogEmoji::POOL);
    line(&mut out, "Reserves", pair(overview.reserves, symbols), Fidelity::Authoritative);
    line(
        &mut out,
        "LP supply",
        overview.total_supply.to_string(),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        "Fee rate",
        format!("{}%", overview.schedule.fee_rate.to_percent_string()),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        "LP reward share",
        format!("{}%", overview.schedule.lp_reward_share.to_percent_string()),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        "Fees collected",
        pair(overview.accumulated_fees.value, symbols),
        overview.accumulated_fees.fidelity,
    );
    let _ = writeln!(out, "  {:<22}{}s ago", "Read", overview.snapshot_age_secs);
    out
}

pub fn render_balances(balances: &HolderBalances, symbols: &Symbols) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Balances", LogEmoji::MONEY);
    line(
        &mut out,
        &symbols.token0,
        balances.token0.to_string(),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        &symbols.token1,
        balances.token1.to_string(),
        Fidelity::Authoritative,
    );
    line(&mut out, "LP", balances.lp.to_string(), Fidelity::Authoritative);
    out
}

pub fn render_rewards(rewards: &HolderRewards, symbols: &Symbols) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Rewards", LogEmoji::MONEY);
    line(
        &mut out,
        "LP balance",
        rewards.position.lp_balance.to_string(),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        "Pool share",
        format!("{}%", rewards.share.to_percent_string()),
        Fidelity::Authoritative,
    );
    line(
        &mut out,
        "Fees earned",
        pair(rewards.entitlement.value, symbols),
        rewards.entitlement.fidelity,
    );
    out
}

/// User-facing failure text
pub fn render_failure(error: &QuoteError) -> String {
    let prefix = match error.class() {
        ErrorClass::Transient => LogEmoji::WARNING,
        ErrorClass::InvalidInput | ErrorClass::Unexpected => LogEmoji::ERROR,
    };
    format!("{prefix} {}", error.user_message())
}

pub fn exit_code(error: &QuoteError) -> i32 {
    match error.class() {
        ErrorClass::Transient => EXIT_TRANSIENT,
        ErrorClass::InvalidInput => EXIT_INVALID_INPUT,
        ErrorClass::Unexpected => EXIT_UNEXPECTED,
    }
}
