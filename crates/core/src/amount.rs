//! Amount - Native value in its smallest unit
//!
//! Collateral, principal and repayments are all whole numbers of wei.
//! Negative amounts cannot be represented; arithmetic is checked.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimals between one ether and one wei
pub const ETHER_DECIMALS: u32 = 18;

const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount cannot be negative: {0}")]
    NegativeAmount(Decimal),

    #[error("Amount has more precision than 1 wei: {0}")]
    SubWeiPrecision(Decimal),

    #[error("Amount out of range: {0}")]
    Overflow(String),

    #[error("Invalid amount: {0}")]
    InvalidFormat(String),
}

/// A non-negative amount of native value, counted in wei.
///
/// # Example
/// ```
/// use lendbook_core::Amount;
/// use rust_decimal::Decimal;
///
/// let collateral = Amount::from_ether(Decimal::new(100, 0)).unwrap();
/// assert_eq!(collateral.to_ether(), Some(Decimal::new(100, 0)));
///
/// // Negative amounts are rejected
/// assert!(Amount::from_ether(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u128);

impl Amount {
    /// Zero amount constant
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw wei count
    #[inline]
    pub const fn from_wei(wei: u128) -> Self {
        Self(wei)
    }

    /// Get the raw wei count
    #[inline]
    pub const fn wei(&self) -> u128 {
        self.0
    }

    /// Check if the amount is zero
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Convert a decimal ether value into wei.
    ///
    /// Fails for negative values, for values finer than 1 wei, and for
    /// values that do not fit.
    pub fn from_ether(ether: Decimal) -> Result<Self, AmountError> {
        if ether.is_sign_negative() && !ether.is_zero() {
            return Err(AmountError::NegativeAmount(ether));
        }

        let mut wei = ether
            .checked_mul(Decimal::from(WEI_PER_ETHER))
            .ok_or_else(|| AmountError::Overflow(ether.to_string()))?;

        if !wei.fract().is_zero() {
            return Err(AmountError::SubWeiPrecision(ether));
        }

        wei.rescale(0);
        u128::try_from(wei.mantissa())
            .map(Self)
            .map_err(|_| AmountError::Overflow(ether.to_string()))
    }

    /// Express the amount in ether.
    ///
    /// Returns None if the value is too large for a `Decimal`.
    pub fn to_ether(&self) -> Option<Decimal> {
        let wei = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(wei, ETHER_DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }

    /// Checked addition - returns None on overflow
    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Checked subtraction - returns None if result would be negative
    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Checked multiplication by a whole factor
    pub fn checked_mul(&self, factor: u32) -> Option<Amount> {
        self.0.checked_mul(u128::from(factor)).map(Amount)
    }

    /// `percent` percent of this amount, rounded down.
    ///
    /// Hundreds and remainder are scaled separately, so this only returns
    /// None when the result itself does not fit.
    pub fn percent(&self, percent: u32) -> Option<Amount> {
        let percent = u128::from(percent);
        let whole = (self.0 / 100).checked_mul(percent)?;
        // remainder < 100, so this cannot overflow
        let part = (self.0 % 100) * percent / 100;
        whole.checked_add(part).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix('-') {
            return match Decimal::from_str(rest) {
                Ok(value) => Err(AmountError::NegativeAmount(-value)),
                Err(_) => Err(AmountError::InvalidFormat(s.to_string())),
            };
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| AmountError::InvalidFormat(s.to_string()))
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl From<u128> for Amount {
    fn from(wei: u128) -> Self {
        Self(wei)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_ether_whole() {
        let amount = Amount::from_ether(dec!(100)).unwrap();
        assert_eq!(amount.wei(), 100 * u128::from(WEI_PER_ETHER));
    }

    #[test]
    fn test_from_ether_fractional() {
        let amount = Amount::from_ether(dec!(0.5)).unwrap();
        assert_eq!(amount.wei(), 500_000_000_000_000_000);
        assert_eq!(amount.to_ether(), Some(dec!(0.5)));
    }

    #[test]
    fn test_negative_rejected() {
        let result = Amount::from_ether(dec!(-100));
        assert!(matches!(result, Err(AmountError::NegativeAmount(_))));
        assert!(matches!("-5".parse::<Amount>(), Err(AmountError::NegativeAmount(_))));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(
            "-abc".parse::<Amount>(),
            Err(AmountError::InvalidFormat("-abc".to_string()))
        );
        assert!(matches!("1.5".parse::<Amount>(), Err(AmountError::InvalidFormat(_))));
    }

    #[test]
    fn test_sub_wei_rejected() {
        let result = Amount::from_ether(dec!(0.0000000000000000001));
        assert!(matches!(result, Err(AmountError::SubWeiPrecision(_))));
    }

    #[test]
    fn test_checked_sub_prevents_negative() {
        let a = Amount::from_wei(50);
        let b = Amount::from_wei(100);
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(b.checked_sub(&a), Some(Amount::from_wei(50)));
    }

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(Amount::from_wei(200).percent(10), Some(Amount::from_wei(20)));
        assert_eq!(Amount::from_wei(199).percent(10), Some(Amount::from_wei(19)));
        assert_eq!(Amount::from_wei(7).percent(0), Some(Amount::ZERO));
        assert!(Amount::from_wei(u128::MAX).percent(101).is_none());
    }

    #[test]
    fn test_percent_of_huge_amounts() {
        let max = Amount::from_wei(u128::MAX);
        assert_eq!(max.percent(100), Some(max));
        assert_eq!(max.percent(2), Some(Amount::from_wei(u128::MAX / 50)));
        // 12_345 * 7 / 100 = 864.15
        assert_eq!(Amount::from_wei(12_345).percent(7), Some(Amount::from_wei(864)));
    }

    #[test]
    fn test_checked_mul_overflow() {
        assert_eq!(Amount::from_wei(100).checked_mul(2), Some(Amount::from_wei(200)));
        assert!(Amount::from_wei(u128::MAX).checked_mul(2).is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let amount = Amount::from_wei(12345);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"12345\"");
        let parsed: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, parsed);
    }

    #[test]
    fn test_to_ether_too_large() {
        assert!(Amount::from_wei(u128::MAX).to_ether().is_none());
    }
}
