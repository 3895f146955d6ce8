//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are currency-agnostic amounts. Totals are accumulated at full
//! precision and only rounded to two decimal places when formatted for
//! display.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The input could not be parsed as a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative amount in the store's currency unit.
///
/// Serialized as a plain JSON number (`19.99`) so persisted carts stay
/// readable by other clients of the same storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in hundredths (e.g. cents).
    #[must_use]
    pub fn from_minor_units(minor: u32) -> Self {
        Self(Decimal::new(i64::from(minor), 2))
    }

    /// Parse a price from its decimal string form (e.g. `"5.50"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| PriceError::Invalid(e.to_string()))?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format in the default currency, e.g. `"$25.50"`.
    #[must_use]
    pub fn display(&self) -> String {
        self.display_in(CurrencyCode::default())
    }

    /// Format for display in the given currency (e.g. `"₹25.50"`).
    #[must_use]
    pub fn display_in(&self, currency: CurrencyCode) -> String {
        format!("{}{:.2}", currency.symbol(), self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0.round_dp(2))
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// ISO 4217 currency codes used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    INR,
    #[default]
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(Price::parse("-1"), Err(PriceError::Negative(_))));
        assert!(serde_json::from_str::<Price>("-0.01").is_err());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(Price::parse("ten"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::parse("10").unwrap().times(2), Price::parse("5.50").unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total, Price::parse("25.50").unwrap());
    }

    #[test]
    fn test_display_rounds_only_at_format_time() {
        let third = Price::parse("0.333").unwrap();
        let total = third.times(3);
        assert_eq!(total.amount(), Decimal::new(999, 3));
        assert_eq!(total.to_string(), "1.00");
        assert_eq!(total.display_in(CurrencyCode::USD), "$1.00");
        assert_eq!(Price::parse("25.5").unwrap().display(), "$25.50");
        assert_eq!(CurrencyCode::default(), CurrencyCode::USD);
        assert_eq!(total.display_in(CurrencyCode::INR), "₹1.00");
    }

    #[test]
    fn test_serde_number_form() {
        let price: Price = serde_json::from_str("5.5").unwrap();
        assert_eq!(price, Price::from_minor_units(550));

        let int_price: Price = serde_json::from_str("10").unwrap();
        assert_eq!(int_price, Price::from_minor_units(1000));

        let json = serde_json::to_string(&Price::from_minor_units(1999)).unwrap();
        assert_eq!(json, "19.99");
    }
}
