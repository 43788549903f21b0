//! # Tidepool Types
//!
//! Shared type system for the Tidepool pool client.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: token amounts are 256-bit integers of 10^-18 units
//! - **Decimal Strings at the Boundary**: the ledger and the user speak
//!   base-10 strings; parsing is exact or it fails
//! - **Immutable Snapshots**: pool reads are copied once and shared by `Arc`
//! - **Explicit Fidelity**: every figure that may come from the local
//!   fallback carries a [`Fidelity`] tag
//!
//! ## Quick Start
//!
//! ```rust
//! use tidepool_types::{Amount, Fraction};
//!
//! let amount_in = Amount::from_decimal_str("100").unwrap();
//! let fee_rate = Fraction::from_decimal_str("0.003").unwrap();
//! assert_eq!(amount_in.mul_fraction(fee_rate).to_string(), "0.3");
//! ```

pub mod common;
pub mod pool;

pub use common::errors::{FixedPointError, PoolError};
pub use common::fixed_point::{mul_div, mul_div_ceil, Amount, Fraction, DECIMALS, WAD};
pub use pool::{
    AccumulatedFees, Entitlement, Estimate, FeeSchedule, Fidelity, HolderBalances,
    HolderPosition, PairAmounts, PoolSnapshot, Quote, TokenSide,
};

/// Account identifier on the ledger
pub use ethers_core::types::Address;
/// Raw 256-bit integer used by contract calls
pub use ethers_core::types::U256;
