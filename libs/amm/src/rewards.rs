//! Liquidity provider share and fee entitlement estimation
//!
//! This is the share-based approximation. When the ledger tracks per-holder
//! accrual itself (time-weighted or otherwise), its figure wins; these
//! functions are what the fallback path uses in its place.

use serde::Serialize;
use tidepool_types::{AccumulatedFees, Amount, Entitlement, Estimate, Fraction, HolderPosition};
use tracing::debug;

/// A holder's ownership of the pool and the fees it is entitled to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolderRewards {
    pub position: HolderPosition,
    pub share: Fraction,
    pub entitlement: Estimate<Entitlement>,
}

/// `holder_balance / total_supply` on the 10^18 scale, 0 for an empty supply
///
/// A balance above the supply can only come from two reads straddling a
/// withdrawal; it is clamped to a full share.
pub fn compute_share(holder_balance: Amount, total_supply: Amount) -> Fraction {
    if total_supply.is_zero() || holder_balance.is_zero() {
        return Fraction::ZERO;
    }
    if holder_balance > total_supply {
        debug!(%holder_balance, %total_supply, "holder balance above LP supply, clamping share");
    }
    holder_balance
        .ratio_of(total_supply)
        .unwrap_or(Fraction::ZERO)
}

/// `accumulated_fees * lp_reward_share * share` for each asset
///
/// Pure projection; identical inputs always give identical outputs.
pub fn compute_entitlement(
    share: Fraction,
    accumulated_fees: AccumulatedFees,
    lp_reward_share: Fraction,
) -> Entitlement {
    let project = |fees: Amount| fees.mul_fraction(lp_reward_share).mul_fraction(share);
    Entitlement::new(
        project(accumulated_fees.token0),
        project(accumulated_fees.token1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Amount {
        Amount::from_decimal_str(s).unwrap()
    }

    #[test]
    fn test_share_reference_scenario() {
        let share = compute_share(amount("2500"), amount("10000"));
        assert_eq!(share, Fraction::from_decimal_str("0.25").unwrap());
    }

    #[test]
    fn test_share_without_division_by_zero() {
        assert_eq!(compute_share(Amount::ZERO, amount("10000")), Fraction::ZERO);
        assert_eq!(compute_share(amount("10"), Amount::ZERO), Fraction::ZERO);
    }

    #[test]
    fn test_share_keeps_precision_on_imbalanced_pool() {
        // one wei of LP against a billion-token supply
        let share = compute_share(amount("0.000000001"), amount("1000000000"));
        assert_eq!(share, Fraction::from_decimal_str("0.000000000000000001").unwrap());
    }

    #[test]
    fn test_share_clamps_to_one() {
        assert_eq!(compute_share(amount("11"), amount("10")), Fraction::ONE);
    }

    #[test]
    fn test_entitlement_reference_scenario() {
        let entitlement = compute_entitlement(
            Fraction::from_decimal_str("0.25").unwrap(),
            AccumulatedFees::new(amount("40"), amount("400")),
            Fraction::from_decimal_str("0.7").unwrap(),
        );
        assert_eq!(entitlement.token0, amount("7"));
        assert_eq!(entitlement.token1, amount("70"));
    }

    #[test]
    fn test_entitlement_is_idempotent() {
        let share = Fraction::from_decimal_str("0.333333333333333333").unwrap();
        let fees = AccumulatedFees::new(amount("12.345"), amount("0.000000000000000007"));
        let lp = Fraction::from_decimal_str("0.7").unwrap();
        assert_eq!(
            compute_entitlement(share, fees, lp),
            compute_entitlement(share, fees, lp)
        );
    }
}
