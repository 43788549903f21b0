//! Quote and Reward Property Tests
//!
//! Invariants that must hold for every reserve configuration, checked on
//! raw 10^-18 integers so rounding is covered exactly.

use proptest::prelude::*;
use tidepool_amm::{compute_entitlement, compute_share, ConstantProduct};
use tidepool_types::{Amount, Fraction, PairAmounts, U256, WAD};

// Raw values stay below 2^100 so products of two fit in 256 bits
const MAX_RAW: u128 = 1 << 100;

fn raw(amount: Amount) -> U256 {
    amount.raw()
}

prop_compose! {
    fn positive_amount()
        (value in 1u128..MAX_RAW) -> Amount {
        Amount::from_raw(U256::from(value))
    }
}

prop_compose! {
    fn any_amount()
        (value in 0u128..MAX_RAW) -> Amount {
        Amount::from_raw(U256::from(value))
    }
}

prop_compose! {
    fn valid_fee()
        (basis_points in 0u64..10_000u64) -> Fraction {
        // basis points scaled to 10^18
        Fraction::from_raw(U256::from(basis_points) * U256::from(100_000_000_000_000u64))
            .unwrap_or(Fraction::ZERO)
    }
}

prop_compose! {
    fn any_fraction()
        (value in 0u64..=1_000_000_000_000_000_000u64) -> Fraction {
        Fraction::from_raw(U256::from(value)).unwrap_or(Fraction::ONE)
    }
}

proptest! {
    /// Property: a trade never drains the output reserve
    #[test]
    fn swap_output_below_reserve(
        reserve_in in positive_amount(),
        reserve_out in positive_amount(),
        amount_in in any_amount(),
        fee_rate in valid_fee(),
    ) {
        let outcome = ConstantProduct::quote_swap(reserve_in, reserve_out, amount_in, fee_rate)
            .unwrap();
        prop_assert!(outcome.amount_out < reserve_out,
                    "output {} reaches reserve {}", outcome.amount_out, reserve_out);
    }

    /// Property: the reserve product never decreases
    #[test]
    fn swap_preserves_product(
        reserve_in in positive_amount(),
        reserve_out in positive_amount(),
        amount_in in any_amount(),
        fee_rate in valid_fee(),
    ) {
        let outcome = ConstantProduct::quote_swap(reserve_in, reserve_out, amount_in, fee_rate)
            .unwrap();
        let before = raw(reserve_in) * raw(reserve_out);
        let after = (raw(reserve_in) + raw(amount_in) - raw(outcome.fee_amount))
            * (raw(reserve_out) - raw(outcome.amount_out));
        prop_assert!(after >= before);
        prop_assert_eq!(raw(outcome.fee_amount) + raw(outcome.amount_in_after_fee), raw(amount_in));
    }

    /// Property: selling nothing quotes nothing
    #[test]
    fn zero_input_quotes_zero(
        reserve_in in positive_amount(),
        reserve_out in positive_amount(),
        fee_rate in valid_fee(),
    ) {
        let outcome = ConstantProduct::quote_swap(reserve_in, reserve_out, Amount::ZERO, fee_rate)
            .unwrap();
        prop_assert_eq!(outcome.amount_out, Amount::ZERO);
        prop_assert_eq!(outcome.fee_amount, Amount::ZERO);
    }

    /// Property: the paired amount is the truncated pool ratio
    #[test]
    fn paired_amount_keeps_ratio(
        reserve0 in positive_amount(),
        reserve1 in positive_amount(),
        amount0 in any_amount(),
    ) {
        let amount1 = ConstantProduct::quote_required_paired_amount(reserve0, reserve1, amount0)
            .unwrap();
        let exact = raw(amount0) * raw(reserve1);
        prop_assert!(raw(amount1) * raw(reserve0) <= exact);
        prop_assert!(exact < (raw(amount1) + U256::one()) * raw(reserve0));
    }

    /// Property: an empty balance or an empty supply has no share
    #[test]
    fn share_zero_cases(balance in any_amount(), supply in any_amount()) {
        prop_assert_eq!(compute_share(Amount::ZERO, supply), Fraction::ZERO);
        prop_assert_eq!(compute_share(balance, Amount::ZERO), Fraction::ZERO);
    }

    /// Property: a share never exceeds one
    #[test]
    fn share_bounded(balance in any_amount(), supply in positive_amount()) {
        let share = compute_share(balance, supply);
        prop_assert!(share.raw() <= WAD);
    }

    /// Property: entitlement is a pure function of its inputs
    #[test]
    fn entitlement_idempotent(
        share in any_fraction(),
        lp_reward_share in any_fraction(),
        fees0 in any_amount(),
        fees1 in any_amount(),
    ) {
        let fees = PairAmounts::new(fees0, fees1);
        let first = compute_entitlement(share, fees, lp_reward_share);
        let second = compute_entitlement(share, fees, lp_reward_share);
        prop_assert_eq!(first, second);
        prop_assert!(first.token0 <= fees0);
        prop_assert!(first.token1 <= fees1);
    }
}
