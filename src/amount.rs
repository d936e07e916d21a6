//! Fixed-point conversion between human decimal amounts and token units
//!
//! TRC-20 tokens store balances as integers scaled by `10^decimals`
//! (USDT uses 6). Conversion goes through [`rust_decimal::Decimal`] so that
//! amounts with at most `decimals` fractional digits convert exactly:
//!
//! ```
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//! use tron_payroll_sdk::amount::{from_token_units, to_token_units};
//!
//! let amount = Decimal::from_str("99999.999999").unwrap();
//! let units = to_token_units(amount, 6).unwrap();
//! assert_eq!(units, 99_999_999_999);
//! assert_eq!(from_token_units(units, 6).unwrap(), amount);
//! ```

use crate::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Largest exponent a `Decimal` can scale by
const MAX_DECIMALS: u32 = 28;

fn scale_factor(decimals: u32) -> Result<Decimal> {
    if decimals > MAX_DECIMALS {
        return Err(Error::Amount(format!(
            "Token decimals {} exceeds maximum of {}",
            decimals, MAX_DECIMALS
        )));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(decimals), 0))
}

/// Convert a decimal amount to integer token units.
///
/// The scaled value is rounded half-to-even before truncation, so inputs with
/// more than `decimals` fractional digits are rounded rather than rejected.
pub fn to_token_units(amount: Decimal, decimals: u32) -> Result<u128> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::Amount(format!(
            "Amount cannot be negative: {}",
            amount
        )));
    }

    let scaled = amount
        .checked_mul(scale_factor(decimals)?)
        .ok_or_else(|| Error::Amount(format!("Amount {} overflows at {} decimals", amount, decimals)))?;

    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_u128()
        .ok_or_else(|| Error::Amount(format!("Amount {} is not representable in token units", amount)))
}

/// Convert integer token units back to a decimal amount. Exact for any value
/// that fits in a `Decimal` mantissa (96 bits).
pub fn from_token_units(units: u128, decimals: u32) -> Result<Decimal> {
    scale_factor(decimals)?;
    let mantissa = i128::try_from(units)
        .map_err(|_| Error::Amount(format!("Token units {} out of range", units)))?;
    Decimal::try_from_i128_with_scale(mantissa, decimals)
        .map(|d| d.normalize())
        .map_err(|e| Error::Amount(format!("Token units {} out of range: {}", units, e)))
}

/// Total a list of token-unit amounts, failing on overflow.
pub fn sum_units(amounts: &[u128]) -> Result<u128> {
    amounts.iter().try_fold(0u128, |acc, amount| {
        acc.checked_add(*amount)
            .ok_or_else(|| Error::Amount("Batch total overflows".to_string()))
    })
}

/// An amount held in both representations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub decimal: Decimal,
    pub units: u128,
    pub decimals: u32,
}

impl TokenAmount {
    pub fn from_decimal(decimal: Decimal, decimals: u32) -> Result<Self> {
        let units = to_token_units(decimal, decimals)?;
        Ok(Self {
            decimal: from_token_units(units, decimals)?,
            units,
            decimals,
        })
    }

    pub fn from_units(units: u128, decimals: u32) -> Result<Self> {
        Ok(Self {
            decimal: from_token_units(units, decimals)?,
            units,
            decimals,
        })
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.decimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_token_units_known_values() {
        let cases = [
            (dec!(0.000001), 1u128),
            (dec!(0.000099), 99),
            (dec!(0.0099), 9_900),
            (dec!(2.31), 2_310_000),
            (dec!(530.31), 530_310_000),
            (dec!(99999.999999), 99_999_999_999),
        ];
        for (amount, units) in cases {
            assert_eq!(to_token_units(amount, 6).unwrap(), units, "{}", amount);
            assert_eq!(from_token_units(units, 6).unwrap(), amount, "{}", units);
        }
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // 0.0000005 * 10^6 = 0.5 -> 0, 0.0000015 * 10^6 = 1.5 -> 2
        assert_eq!(to_token_units(dec!(0.0000005), 6).unwrap(), 0);
        assert_eq!(to_token_units(dec!(0.0000015), 6).unwrap(), 2);
        assert_eq!(to_token_units(dec!(0.0000025), 6).unwrap(), 2);
    }

    #[test]
    fn test_zero_and_whole_amounts() {
        assert_eq!(to_token_units(Decimal::ZERO, 6).unwrap(), 0);
        assert_eq!(to_token_units(dec!(42), 6).unwrap(), 42_000_000);
        assert_eq!(to_token_units(dec!(42), 0).unwrap(), 42);
    }

    #[test]
    fn test_negative_amount_rejected() {
        assert!(matches!(
            to_token_units(dec!(-1.5), 6),
            Err(Error::Amount(_))
        ));
    }

    #[test]
    fn test_excessive_decimals_rejected() {
        assert!(to_token_units(dec!(1), 29).is_err());
        assert!(from_token_units(1, 29).is_err());
    }

    #[test]
    fn test_sum_units_overflow() {
        assert_eq!(sum_units(&[1, 2, 3]).unwrap(), 6);
        assert!(sum_units(&[u128::MAX, 1]).is_err());
    }

    #[test]
    fn test_token_amount_normalizes() {
        let amount = TokenAmount::from_decimal(dec!(2.310), 6).unwrap();
        assert_eq!(amount.units, 2_310_000);
        assert_eq!(amount.to_string(), "2.31");
    }
}
