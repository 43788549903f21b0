//! Pool data model: snapshots, holder positions and quotes
//!
//! Everything here is a point-in-time copy of ledger state. A
//! [`PoolSnapshot`] is immutable once built; the quoting code receives it
//! behind an `Arc` so a refresh never mutates reserves under a running
//! calculation.

use crate::common::errors::PoolError;
use crate::common::fixed_point::{Amount, Fraction};
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// One of the two pooled assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenSide {
    Token0,
    Token1,
}

impl TokenSide {
    /// The opposite asset
    pub fn other(self) -> Self {
        match self {
            TokenSide::Token0 => TokenSide::Token1,
            TokenSide::Token1 => TokenSide::Token0,
        }
    }
}

impl fmt::Display for TokenSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSide::Token0 => f.write_str("token0"),
            TokenSide::Token1 => f.write_str("token1"),
        }
    }
}

/// A pair of amounts, one per pooled asset
///
/// Used for reserves, accumulated fees, entitlements and withdrawal previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PairAmounts {
    pub token0: Amount,
    pub token1: Amount,
}

impl PairAmounts {
    pub fn new(token0: Amount, token1: Amount) -> Self {
        Self { token0, token1 }
    }

    pub fn get(&self, side: TokenSide) -> Amount {
        match side {
            TokenSide::Token0 => self.token0,
            TokenSide::Token1 => self.token1,
        }
    }

    /// `(side, side.other())`, i.e. `(reserve_in, reserve_out)` for a trade
    pub fn oriented(&self, side_in: TokenSide) -> (Amount, Amount) {
        (self.get(side_in), self.get(side_in.other()))
    }
}

/// Fees collected by the pool since inception
pub type AccumulatedFees = PairAmounts;

/// A holder's claim on accumulated fees
pub type Entitlement = PairAmounts;

/// Pool fee parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Fraction of every trade input retained as fee, in [0, 1)
    pub fee_rate: Fraction,
    /// Portion of collected fees accruing to liquidity providers
    pub lp_reward_share: Fraction,
}

impl FeeSchedule {
    pub fn new(fee_rate: Fraction, lp_reward_share: Fraction) -> Result<Self, PoolError> {
        if fee_rate.is_one() {
            return Err(PoolError::FeeRateOutOfRange(fee_rate.to_string()));
        }
        Ok(Self {
            fee_rate,
            lp_reward_share,
        })
    }
}

/// Whether a figure came from the ledger or from the local fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fidelity {
    /// Computed by the ledger itself
    Authoritative,
    /// Recomputed locally from a possibly stale snapshot
    Approximate,
}

/// A value tagged with the path that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate<T> {
    pub value: T,
    pub fidelity: Fidelity,
}

impl<T> Estimate<T> {
    pub fn authoritative(value: T) -> Self {
        Self {
            value,
            fidelity: Fidelity::Authoritative,
        }
    }

    pub fn approximate(value: T) -> Self {
        Self {
            value,
            fidelity: Fidelity::Approximate,
        }
    }

    pub fn is_approximate(&self) -> bool {
        self.fidelity == Fidelity::Approximate
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Estimate<U> {
        Estimate {
            value: f(self.value),
            fidelity: self.fidelity,
        }
    }
}

/// Immutable copy of pool state as of one refresh
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    reserves: PairAmounts,
    total_supply: Amount,
    accumulated_fees: Option<AccumulatedFees>,
    schedule: FeeSchedule,
    read_at: Instant,
}

impl PoolSnapshot {
    /// Build a snapshot, rejecting LP supply against an empty reserve
    ///
    /// `accumulated_fees` is `None` when the ledger's fee accessor could not
    /// be read; consumers then fall back to an estimate.
    pub fn new(
        reserves: PairAmounts,
        total_supply: Amount,
        accumulated_fees: Option<AccumulatedFees>,
        schedule: FeeSchedule,
    ) -> Result<Self, PoolError> {
        if !total_supply.is_zero() && (reserves.token0.is_zero() || reserves.token1.is_zero()) {
            return Err(PoolError::SupplyWithoutReserves {
                total_supply: total_supply.to_string(),
                reserve0: reserves.token0.to_string(),
                reserve1: reserves.token1.to_string(),
            });
        }
        Ok(Self {
            reserves,
            total_supply,
            accumulated_fees,
            schedule,
            read_at: Instant::now(),
        })
    }

    pub fn reserves(&self) -> PairAmounts {
        self.reserves
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Ledger-reported accumulated fees, if that read succeeded
    pub fn accumulated_fees(&self) -> Option<AccumulatedFees> {
        self.accumulated_fees
    }

    pub fn schedule(&self) -> FeeSchedule {
        self.schedule
    }

    /// Time since the underlying reads completed
    pub fn age(&self) -> Duration {
        self.read_at.elapsed()
    }

    pub fn is_older_than(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }

    /// True before the first deposit
    pub fn is_empty(&self) -> bool {
        self.reserves.token0.is_zero() || self.reserves.token1.is_zero()
    }
}

/// An account and its LP-token balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderPosition {
    pub account: Address,
    pub lp_balance: Amount,
}

/// Wallet balances shown next to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderBalances {
    pub token0: Amount,
    pub token1: Amount,
    pub lp: Amount,
}

/// Point-in-time swap estimate; never binding on settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub token_in: TokenSide,
    pub amount_in: Amount,
    pub token_out: TokenSide,
    pub amount_out: Amount,
    pub fee_amount: Amount,
}
