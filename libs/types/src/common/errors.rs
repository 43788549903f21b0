//! Error types for fixed-point parsing and pool snapshot validation
//!
//! Amounts arrive as decimal strings from the ledger and from user input, so
//! most failures here are format errors. Overflow is reported separately:
//! the input was well formed but out of range.

use thiserror::Error;

/// Errors that can occur while parsing or combining fixed-point values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    /// Input is not an unsigned base-10 decimal
    #[error("Invalid decimal string: '{input}' - expected unsigned base-10 digits")]
    InvalidDecimal { input: String },

    /// Input carries more fractional digits than the fixed-point scale
    #[error("Precision loss: '{input}' has more than {max_decimals} fractional digits")]
    PrecisionLoss { input: String, max_decimals: u32 },

    /// Input does not fit in 256 bits once scaled
    #[error("Overflow: '{input}' exceeds the fixed-point range")]
    Overflow { input: String },

    /// A fraction was given outside of [0, 1]
    #[error("Fraction {value} is outside [0, 1]")]
    FractionOutOfRange { value: String },
}

/// Errors raised when pool reads do not form a consistent snapshot
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// LP tokens exist while one of the reserves is empty
    #[error("LP supply {total_supply} exists against an empty reserve ({reserve0} / {reserve1})")]
    SupplyWithoutReserves {
        total_supply: String,
        reserve0: String,
        reserve1: String,
    },

    /// Fee rate must be strictly below 100%
    #[error("Fee rate {0} must be below 1")]
    FeeRateOutOfRange(String),
}
