//! Fixed-point arithmetic types for ledger amounts
//!
//! Every token quantity the ledger reports is an integer count of 10^-18
//! units. [`Amount`] keeps that integer as-is in a `U256`, and [`Fraction`]
//! reuses the same scale for rates such as the trade fee or a holder's pool
//! share.
//!
//! ## Design Principles
//!
//! - **No Precision Loss**: values are never routed through `f64`
//! - **Wide Intermediates**: `a * b / c` multiplies into a `U512` before
//!   dividing, so the product cannot overflow
//! - **Truncation**: every division floors, matching the ledger's own integer
//!   math, unless the caller asks for the ceiling explicitly
//! - **Strict Parsing**: more than 18 fractional digits is an error, not a
//!   silent truncation

use crate::common::errors::FixedPointError;
use ethers_core::types::{U256, U512};
use ethers_core::utils::format_units;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits carried by every fixed-point value
pub const DECIMALS: u32 = 18;

/// 10^18, the raw representation of 1.0
pub const WAD: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);

/// `floor(a * b / denominator)` with a 512-bit intermediate
///
/// Returns `None` when the denominator is zero or the quotient does not fit
/// back into 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    narrow(a.full_mul(b) / U512::from(denominator))
}

/// `ceil(a * b / denominator)` with a 512-bit intermediate
pub fn mul_div_ceil(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = a.full_mul(b);
    let denominator = U512::from(denominator);
    let quotient = product / denominator;
    if (product % denominator).is_zero() {
        narrow(quotient)
    } else {
        narrow(quotient + U512::one())
    }
}

fn narrow(value: U512) -> Option<U256> {
    let words = value.0;
    if words[4..].iter().any(|word| *word != 0) {
        return None;
    }
    Some(U256([words[0], words[1], words[2], words[3]]))
}

/// Parse an unsigned decimal string into its 18-decimal scaled integer
fn parse_scaled(input: &str) -> Result<U256, FixedPointError> {
    let trimmed = input.trim();
    let invalid = || FixedPointError::InvalidDecimal {
        input: input.to_string(),
    };

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    // Rejects signs, exponents, separators and a second decimal point
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(invalid());
    }
    if fraction.len() > DECIMALS as usize {
        return Err(FixedPointError::PrecisionLoss {
            input: input.to_string(),
            max_decimals: DECIMALS,
        });
    }

    // whole digits followed by the fraction padded to 18 places is the scaled integer
    let whole = if whole.is_empty() { "0" } else { whole };
    let scaled = format!("{whole}{fraction:0<width$}", width = DECIMALS as usize);

    U256::from_dec_str(&scaled).map_err(|_| FixedPointError::Overflow {
        input: input.to_string(),
    })
}

/// Render a scaled integer as a full 18-digit decimal string
fn format_scaled(raw: U256) -> String {
    // format_units only fails for unit counts above 77
    format_units(raw, DECIMALS).unwrap_or_else(|_| raw.to_string())
}

/// Drop trailing fractional zeros for display
fn trim_fraction(full: &str) -> &str {
    if !full.contains('.') {
        return full;
    }
    full.trim_end_matches('0').trim_end_matches('.')
}

/// Token quantity in 10^-18 units
///
/// Examples:
/// - 1 token = Amount(10^18)
/// - 0.3 tokens = Amount(3 * 10^17)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    /// Zero tokens
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));

    /// Exactly one token
    pub const ONE: Self = Self(WAD);

    /// Create from a decimal string with exact parsing
    ///
    /// This is the PRIMARY way to build an `Amount` from user input or a
    /// ledger response.
    ///
    /// # Examples
    /// ```
    /// use tidepool_types::Amount;
    ///
    /// let amount = Amount::from_decimal_str("99.7").unwrap();
    /// assert_eq!(amount.to_decimal_string(), "99.700000000000000000");
    /// ```
    pub fn from_decimal_str(s: &str) -> Result<Self, FixedPointError> {
        parse_scaled(s).map(Self)
    }

    /// Whole number of tokens
    pub fn from_whole(tokens: u64) -> Self {
        // u64 * 10^18 always fits in 256 bits
        Self(U256::from(tokens) * WAD)
    }

    /// Create from raw 10^-18 units, as returned by a contract call
    pub const fn from_raw(raw: U256) -> Self {
        Self(raw)
    }

    /// Raw 10^-18 units, for submitting to a contract call
    pub fn raw(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Wire representation: always 18 fractional digits
    pub fn to_decimal_string(self) -> String {
        format_scaled(self.0)
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// `floor(self * numerator / denominator)`
    pub fn mul_div(self, numerator: Self, denominator: Self) -> Option<Self> {
        mul_div(self.0, numerator.0, denominator.0).map(Self)
    }

    /// `ceil(self * numerator / denominator)`
    pub fn mul_div_ceil(self, numerator: Self, denominator: Self) -> Option<Self> {
        mul_div_ceil(self.0, numerator.0, denominator.0).map(Self)
    }

    /// `floor(self * fraction)`; never exceeds `self`
    pub fn mul_fraction(self, fraction: Fraction) -> Self {
        // fraction <= 1 keeps the quotient within 256 bits
        mul_div(self.0, fraction.0, WAD).map_or(self, Self)
    }

    /// The share `self / total` as a fraction, floored and capped at one
    pub fn ratio_of(self, total: Self) -> Option<Fraction> {
        if total.is_zero() {
            return None;
        }
        if self >= total {
            return Some(Fraction::ONE);
        }
        mul_div(self.0, WAD, total.0).map(Fraction)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(trim_fraction(&self.to_decimal_string()))
    }
}

impl FromStr for Amount {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_decimal_str(&raw).map_err(de::Error::custom)
    }
}

/// Rate in [0, 1] on the same 10^18 scale as [`Amount`]
///
/// Examples:
/// - 0.3% trade fee = Fraction(3 * 10^15)
/// - 70% LP reward share = Fraction(7 * 10^17)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fraction(U256);

impl Fraction {
    /// 0%
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));

    /// 100%
    pub const ONE: Self = Self(WAD);

    /// Create from a decimal string such as `"0.003"`
    pub fn from_decimal_str(s: &str) -> Result<Self, FixedPointError> {
        let raw = parse_scaled(s)?;
        Self::from_raw(raw).ok_or_else(|| FixedPointError::FractionOutOfRange {
            value: s.trim().to_string(),
        })
    }

    /// Exact conversion from a configuration decimal
    pub fn from_decimal(value: Decimal) -> Result<Self, FixedPointError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(FixedPointError::FractionOutOfRange {
                value: value.to_string(),
            });
        }
        Self::from_decimal_str(&value.normalize().to_string())
    }

    /// Create from raw 10^-18 units; `None` when above one
    pub fn from_raw(raw: U256) -> Option<Self> {
        (raw <= WAD).then_some(Self(raw))
    }

    pub fn raw(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_one(self) -> bool {
        self.0 == WAD
    }

    /// `1 - self`
    pub fn complement(self) -> Self {
        Self(WAD - self.0)
    }

    /// `floor(self * rhs)`
    pub fn mul(self, rhs: Self) -> Self {
        mul_div(self.0, rhs.0, WAD).map_or(Self::ZERO, Self)
    }

    pub fn to_decimal_string(self) -> String {
        format_scaled(self.0)
    }

    /// Percentage for display, e.g. `"0.3"` for a 0.3% fee
    pub fn to_percent_string(self) -> String {
        let percent = self.0 * U256::from(100u8);
        trim_fraction(&format_scaled(percent)).to_string()
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(trim_fraction(&self.to_decimal_string()))
    }
}

impl FromStr for Fraction {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_decimal_str(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_exact_decimal() {
        let amount = Amount::from_decimal_str("99.7").unwrap();
        assert_eq!(amount.raw(), U256::from(99_700_000_000_000_000_000u128));
        assert_eq!(amount.to_decimal_string(), "99.700000000000000000");
        assert_eq!(amount.to_string(), "99.7");
    }

    #[test]
    fn test_parse_smallest_unit() {
        let amount = Amount::from_decimal_str("0.000000000000000001").unwrap();
        assert_eq!(amount.raw(), U256::one());
        assert_eq!(Amount::from_decimal_str(".5").unwrap().to_string(), "0.5");
        assert_eq!(Amount::from_decimal_str("12.").unwrap(), Amount::from_whole(12));
    }

    #[test]
    fn test_parse_rejects_signed_and_malformed() {
        for input in ["-1", "+1", "1e18", "", ".", "1.2.3", "1,000", "abc"] {
            assert!(
                matches!(
                    Amount::from_decimal_str(input),
                    Err(FixedPointError::InvalidDecimal { .. })
                ),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        let result = Amount::from_decimal_str("1.0000000000000000001");
        assert!(matches!(result, Err(FixedPointError::PrecisionLoss { .. })));
    }

    #[test]
    fn test_parse_reports_overflow_when_scaling() {
        // fits in 256 bits as a whole number but not once scaled by 10^18
        let huge = format!("1{}", "0".repeat(69));
        let result = Amount::from_decimal_str(&huge);
        assert!(matches!(result, Err(FixedPointError::Overflow { .. })));

        let result = Fraction::from_decimal_str(&format!("{huge}.5"));
        assert!(matches!(result, Err(FixedPointError::Overflow { .. })));
    }

    #[test]
    fn test_parse_largest_scaled_value() {
        // floor((2^256 - 1) / 10^18) whole tokens still fit
        let max_whole = U256::MAX / WAD;
        let amount = Amount::from_decimal_str(&max_whole.to_string()).unwrap();
        assert_eq!(amount.raw(), max_whole * WAD);

        let one_more = (max_whole + U256::one()).to_string();
        assert!(matches!(
            Amount::from_decimal_str(&one_more),
            Err(FixedPointError::Overflow { .. })
        ));
    }

    #[test]
    fn test_parse_pads_short_fraction() {
        assert_eq!(
            Amount::from_decimal_str(".5").unwrap().raw(),
            U256::from(500_000_000_000_000_000u64)
        );
        assert_eq!(
            Amount::from_decimal_str("7.").unwrap().raw(),
            U256::from(7_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn test_mul_div_uses_wide_intermediate() {
        // (2^255 * 4) / 8 overflows a 256-bit product but not the quotient
        let big = U256::one() << 255;
        assert_eq!(mul_div(big, U256::from(4), U256::from(8)), Some(big / 2));
        assert_eq!(mul_div(big, U256::from(4), U256::one()), None);
        assert_eq!(mul_div(U256::one(), U256::one(), U256::zero()), None);
    }

    #[test]
    fn test_mul_div_ceil_rounds_up_only_on_remainder() {
        assert_eq!(mul_div_ceil(U256::from(10), U256::from(1), U256::from(3)), Some(U256::from(4)));
        assert_eq!(mul_div_ceil(U256::from(9), U256::from(1), U256::from(3)), Some(U256::from(3)));
    }

    #[test]
    fn test_fraction_bounds() {
        assert_eq!(Fraction::from_decimal_str("1").unwrap(), Fraction::ONE);
        assert!(matches!(
            Fraction::from_decimal_str("1.000000000000000001"),
            Err(FixedPointError::FractionOutOfRange { .. })
        ));
        assert_eq!(Fraction::from_decimal(dec!(0.003)).unwrap().to_string(), "0.003");
        assert!(Fraction::from_decimal(dec!(-0.1)).is_err());
        assert_eq!(Fraction::from_decimal(dec!(0.7)).unwrap().to_percent_string(), "70");
    }

    #[test]
    fn test_ratio_of_caps_at_one() {
        let supply = Amount::from_whole(10_000);
        assert_eq!(
            Amount::from_whole(2_500).ratio_of(supply).unwrap().to_string(),
            "0.25"
        );
        assert_eq!(Amount::from_whole(20_000).ratio_of(supply), Some(Fraction::ONE));
        assert_eq!(Amount::from_whole(1).ratio_of(Amount::ZERO), None);
    }

    #[test]
    fn test_serde_uses_decimal_strings() {
        let amount = Amount::from_decimal_str("0.3").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"0.300000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<Amount>("\"-5\"").is_err());
    }
}
