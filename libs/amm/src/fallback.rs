//! Local recomputation of ledger quotes from the last snapshot
//!
//! Nothing here makes a live call. Figures are computed from reserves and
//! the configured fee schedule as of the snapshot, so they drift from the
//! ledger as trades land.

use crate::constant_product::ConstantProduct;
use crate::error::{QuoteError, QuoteResult};
use crate::rewards::{compute_entitlement, compute_share};
use std::sync::Arc;
use tidepool_types::{
    AccumulatedFees, Amount, Entitlement, Estimate, Fraction, PairAmounts, PoolSnapshot, Quote,
    TokenSide,
};
use tracing::debug;

/// Quotes recomputed from one immutable [`PoolSnapshot`]
#[derive(Debug, Clone)]
pub struct FallbackCalculator {
    snapshot: Arc<PoolSnapshot>,
    /// Multiplier applied to reserves when the ledger's fee accessor failed
    accumulated_fee_estimate_rate: Fraction,
}

impl FallbackCalculator {
    pub fn new(snapshot: Arc<PoolSnapshot>, accumulated_fee_estimate_rate: Fraction) -> Self {
        Self {
            snapshot,
            accumulated_fee_estimate_rate,
        }
    }

    pub fn snapshot(&self) -> &PoolSnapshot {
        &self.snapshot
    }

    pub fn quote_swap(&self, token_in: TokenSide, amount_in: Amount) -> QuoteResult<Quote> {
        if self.snapshot.is_empty() {
            return Err(QuoteError::EmptyPool);
        }
        let (reserve_in, reserve_out) = self.snapshot.reserves().oriented(token_in);
        let outcome = ConstantProduct::quote_swap(
            reserve_in,
            reserve_out,
            amount_in,
            self.snapshot.schedule().fee_rate,
        )?;

        Ok(Quote {
            token_in,
            amount_in,
            token_out: token_in.other(),
            amount_out: outcome.amount_out,
            fee_amount: outcome.fee_amount,
        })
    }

    pub fn required_paired_amount(&self, amount0: Amount) -> QuoteResult<Amount> {
        let reserves = self.snapshot.reserves();
        ConstantProduct::quote_required_paired_amount(reserves.token0, reserves.token1, amount0)
    }

    pub fn fee(&self, amount_in: Amount) -> QuoteResult<Amount> {
        ConstantProduct::calculate_fee(amount_in, self.snapshot.schedule().fee_rate)
    }

    /// Accumulated fees as read, or `reserves * estimate_rate` when the read
    /// failed
    ///
    /// Only the heuristic is tagged approximate; a successfully read figure
    /// is the ledger's own even if the snapshot has aged.
    pub fn accumulated_fees(&self) -> Estimate<AccumulatedFees> {
        match self.snapshot.accumulated_fees() {
            Some(fees) => Estimate::authoritative(fees),
            None => {
                let reserves = self.snapshot.reserves();
                let rate = self.accumulated_fee_estimate_rate;
                debug!(%rate, "estimating accumulated fees from reserves");
                Estimate::approximate(PairAmounts::new(
                    reserves.token0.mul_fraction(rate),
                    reserves.token1.mul_fraction(rate),
                ))
            }
        }
    }

    /// Share-based entitlement for an LP balance
    pub fn entitlement(&self, lp_balance: Amount) -> Entitlement {
        let share = compute_share(lp_balance, self.snapshot.total_supply());
        compute_entitlement(
            share,
            self.accumulated_fees().value,
            self.snapshot.schedule().lp_reward_share,
        )
    }

    /// Reserves returned for burning `lp_amount`
    pub fn withdraw(&self, lp_amount: Amount) -> QuoteResult<PairAmounts> {
        ConstantProduct::quote_withdraw(
            lp_amount,
            self.snapshot.total_supply(),
            self.snapshot.reserves(),
        )
    }

    /// Price impact of a quote against this snapshot's spot rate
    pub fn price_impact(&self, quote: &Quote) -> QuoteResult<Fraction> {
        let (reserve_in, reserve_out) = self.snapshot.reserves().oriented(quote.token_in);
        ConstantProduct::price_impact(reserve_in, reserve_out, quote.amount_in, quote.amount_out)
    }
}
