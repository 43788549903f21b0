//! Constant-product pool math with exact fixed-point arithmetic
//!
//! Mirrors the ledger's integer math: the fee comes off the input first, the
//! remainder trades against `x * y = k`, and every division truncates at
//! 10^-18 so a client figure never promises more than the ledger will pay.

use crate::error::{QuoteError, QuoteResult};
use tidepool_types::{Amount, Fraction, PairAmounts, WAD};
use tracing::debug;

/// Result of quoting one trade against a pair of reserves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    pub amount_out: Amount,
    pub fee_amount: Amount,
    /// Portion of the input that actually trades against the curve
    pub amount_in_after_fee: Amount,
}

impl SwapOutcome {
    pub const ZERO: Self = Self {
        amount_out: Amount::ZERO,
        fee_amount: Amount::ZERO,
        amount_in_after_fee: Amount::ZERO,
    };
}

/// Constant-product math functions with zero precision loss
pub struct ConstantProduct;

impl ConstantProduct {
    /// Calculate the output of a swap using the x*y=k formula
    ///
    /// # Arguments
    /// * `reserve_in` - Reserve of the token being sold to the pool
    /// * `reserve_out` - Reserve of the token being bought
    /// * `amount_in` - Amount sold, before fees
    /// * `fee_rate` - Fraction of `amount_in` retained by the pool, below 1
    ///
    /// # Returns
    /// Output amount and fee. `amount_out` is strictly below `reserve_out`,
    /// and the post-trade reserve product is never below the pre-trade one.
    /// A zero `amount_in` quotes `(0, 0)`.
    pub fn quote_swap(
        reserve_in: Amount,
        reserve_out: Amount,
        amount_in: Amount,
        fee_rate: Fraction,
    ) -> QuoteResult<SwapOutcome> {
        validate_fee_rate(fee_rate)?;
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(QuoteError::invalid("reserves must be positive"));
        }
        if amount_in.is_zero() {
            return Ok(SwapOutcome::ZERO);
        }

        let amount_in_after_fee = amount_in.mul_fraction(fee_rate.complement());
        let fee_amount = amount_in.saturating_sub(amount_in_after_fee);

        let new_reserve_in = reserve_in
            .checked_add(amount_in_after_fee)
            .ok_or_else(|| QuoteError::overflow("quote_swap"))?;

        // Rounding the remaining reserve up rounds the payout down, which
        // keeps (x + dx) * (y - dy) >= x * y exact at 10^-18
        let new_reserve_out = reserve_in
            .mul_div_ceil(reserve_out, new_reserve_in)
            .ok_or_else(|| QuoteError::overflow("quote_swap"))?;
        let amount_out = reserve_out.saturating_sub(new_reserve_out);

        debug!(
            %reserve_in, %reserve_out, %amount_in, %amount_in_after_fee, %amount_out,
            "constant-product swap quote"
        );

        Ok(SwapOutcome {
            amount_out,
            fee_amount,
            amount_in_after_fee,
        })
    }

    /// Amount of token1 that keeps the reserve ratio when depositing `amount0`
    ///
    /// Fails with [`QuoteError::EmptyPool`] before the first deposit, when
    /// there is no ratio to preserve.
    pub fn quote_required_paired_amount(
        reserve0: Amount,
        reserve1: Amount,
        amount0: Amount,
    ) -> QuoteResult<Amount> {
        if reserve0.is_zero() || reserve1.is_zero() {
            return Err(QuoteError::EmptyPool);
        }
        amount0
            .mul_div(reserve1, reserve0)
            .ok_or_else(|| QuoteError::overflow("quote_required_paired_amount"))
    }

    /// Fee charged on `amount_in`, truncated
    pub fn calculate_fee(amount_in: Amount, fee_rate: Fraction) -> QuoteResult<Amount> {
        validate_fee_rate(fee_rate)?;
        Ok(amount_in.mul_fraction(fee_rate))
    }

    /// Reserves returned for burning `lp_amount` of `total_supply`
    pub fn quote_withdraw(
        lp_amount: Amount,
        total_supply: Amount,
        reserves: PairAmounts,
    ) -> QuoteResult<PairAmounts> {
        if total_supply.is_zero() || lp_amount.is_zero() {
            return Ok(PairAmounts::default());
        }
        if lp_amount > total_supply {
            return Err(QuoteError::invalid(format!(
                "cannot withdraw {lp_amount} LP tokens from a supply of {total_supply}"
            )));
        }

        let token0 = reserves
            .token0
            .mul_div(lp_amount, total_supply)
            .ok_or_else(|| QuoteError::overflow("quote_withdraw"))?;
        let token1 = reserves
            .token1
            .mul_div(lp_amount, total_supply)
            .ok_or_else(|| QuoteError::overflow("quote_withdraw"))?;

        Ok(PairAmounts::new(token0, token1))
    }

    /// Relative gap between the spot rate and the quote's execution rate
    ///
    /// Includes the fee, so it is what the trader actually gives up against
    /// the displayed pool price.
    pub fn price_impact(
        reserve_in: Amount,
        reserve_out: Amount,
        amount_in: Amount,
        amount_out: Amount,
    ) -> QuoteResult<Fraction> {
        if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
            return Ok(Fraction::ZERO);
        }

        // execution_rate / spot_rate = (amount_out * reserve_in) / (amount_in * reserve_out)
        let execution_rate = amount_out
            .mul_div(Amount::from_raw(WAD), amount_in)
            .ok_or_else(|| QuoteError::overflow("price_impact"))?;
        let relative = execution_rate
            .mul_div(reserve_in, reserve_out)
            .ok_or_else(|| QuoteError::overflow("price_impact"))?;

        Ok(Fraction::from_raw(relative.raw())
            .unwrap_or(Fraction::ONE)
            .complement())
    }
}

fn validate_fee_rate(fee_rate: Fraction) -> QuoteResult<()> {
    if fee_rate.is_one() {
        return Err(QuoteError::invalid("fee rate must be below 1"));
    }
    Ok(())
}
