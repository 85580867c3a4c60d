//! Fixed-point money type with 2 decimal places precision.
//!
//! Uses `rust_decimal` internally with scale enforcement so that principals,
//! installments and balances never pass through floating point.
//!
//! Operators saturate at the representable bounds instead of panicking. Code
//! that must reject out-of-range results uses [`Money::checked_add`] and
//! [`Money::checked_sub`].

use crate::error::ParseMoneyError;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// A monetary amount kept at exactly 2 decimal places (currency minor units).
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use debt_ledger::Money;
///
/// let amount = Money::from_str("1234.5").unwrap();
/// assert_eq!(amount.to_string(), "1234.50");
/// assert_eq!(amount.format_currency("KES"), "KES 1,234.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Money(Decimal::ZERO);

    /// Creates a new `Money` from a `Decimal`, rounding to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        Money(normalized)
    }

    /// Returns `None` if the sum is not representable.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Money::new)
    }

    /// Returns `None` if the difference is not representable.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Money::new)
    }

    /// Returns the underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns `true` if the amount is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Formats the amount for display with a currency code and thousands
    /// grouping, e.g. `KES 1,234.50` or `-KES 200.00`.
    pub fn format_currency(&self, code: &str) -> String {
        let digits = format!("{:.2}", self.0.abs());
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{} {}.{}", sign, code, grouped, fraction)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

/// Parses an amount, rejecting input with more than 2 significant decimal
/// places rather than rounding it.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        if decimal.normalize().scale() > Self::SCALE {
            return Err(ParseMoneyError::TooPrecise(trimmed.to_string()));
        }
        Ok(Money::new(decimal))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Money::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_from_str_normalizes_scale() {
        assert_eq!(money("1").to_string(), "1.00");
        assert_eq!(money("1.5").to_string(), "1.50");
        assert_eq!(money("  2.25  ").to_string(), "2.25");
        assert_eq!(money("1.500").to_string(), "1.50");
    }

    #[test]
    fn test_from_str_rejects_extra_precision() {
        for input in ["0.004", "0.005", "12.345"] {
            assert!(matches!(
                Money::from_str(input),
                Err(ParseMoneyError::TooPrecise(_))
            ));
        }
        assert!(matches!(
            Money::from_str("abc"),
            Err(ParseMoneyError::Invalid(_))
        ));
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let big = money("50000000000000000000000000000");
        assert_eq!(big.checked_add(big), None);
        assert_eq!(big.checked_sub(money("-50000000000000000000000000000")), None);
        assert_eq!(money("1").checked_add(money("2")), Some(money("3")));
        assert_eq!(money("1").checked_sub(money("2")), Some(money("-1")));
    }

    #[test]
    fn test_operators_saturate_instead_of_panicking() {
        let big = money("50000000000000000000000000000");
        let sum = big + big;
        assert!(sum > big);
        let total: Money = [big, big, big].iter().sum();
        assert_eq!(total, sum);
    }

    #[test]
    fn test_sign_predicates() {
        assert!(money("0.01").is_positive());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert!(money("-3").is_negative());
        assert!(Money::ZERO.is_zero());
    }

    #[test]
    fn test_arithmetic_preserves_scale() {
        let a = money("600");
        let b = money("400.5");
        assert_eq!((a + b).to_string(), "1000.50");
        assert_eq!((a - b).to_string(), "199.50");
        assert_eq!((money("500") - money("700")).to_string(), "-200.00");
    }

    #[test]
    fn test_sum_of_amounts() {
        let amounts = [money("100"), money("250.25"), money("49.75")];
        let total: Money = amounts.iter().sum();
        assert_eq!(total, money("400"));

        let empty: Vec<Money> = Vec::new();
        assert_eq!(empty.into_iter().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(money("0").format_currency("KES"), "KES 0.00");
        assert_eq!(money("999").format_currency("KES"), "KES 999.00");
        assert_eq!(money("1000").format_currency("KES"), "KES 1,000.00");
        assert_eq!(money("1234567.8").format_currency("USD"), "USD 1,234,567.80");
        assert_eq!(money("-200").format_currency("KES"), "-KES 200.00");
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&money("12.3")).unwrap();
        assert_eq!(json, "\"12.30\"");

        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, money("12.30"));
    }
}
