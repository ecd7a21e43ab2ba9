//! Amount type
//!
//! Validated point quantity used for credits and debits. The stored balance
//! itself is a plain `Decimal` on [`PointRecord`](crate::domain::PointRecord);
//! only the *change* applied to it is constrained here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Maximum points moved by a single operation (1 trillion)
const MAX_POINTS: i64 = 1_000_000_000_000;

/// Maximum decimal places for point quantities
const MAX_SCALE: u32 = 2;

/// Amount represents a validated, strictly positive point quantity.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - At most 2 decimal places
/// - At most 1 trillion points
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use point_ledger::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(1500, 2)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(15, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_POINTS})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        // Trailing zeros do not count against the scale limit
        let normalized = value.normalize();
        if normalized.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(normalized.scale()));
        }

        if normalized > Decimal::from(MAX_POINTS) {
            return Err(AmountError::Overflow);
        }

        Ok(Self(normalized))
    }

    /// Create an Amount from whole points.
    pub fn from_integer(value: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Balance after crediting this amount.
    pub fn credit_to(&self, balance: Decimal) -> Result<Decimal, DomainError> {
        balance
            .checked_add(self.0)
            .ok_or_else(|| DomainError::InvalidAmount("balance overflow".to_string()))
    }

    /// Balance after debiting this amount. Balances never go negative.
    pub fn debit_from(&self, balance: Decimal) -> Result<Decimal, DomainError> {
        if balance < self.0 {
            return Err(DomainError::insufficient_balance(self.0, balance));
        }
        Ok(balance - self.0)
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
        let decimal = Decimal::from_str(s).map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl From<AmountError> for DomainError {
    fn from(err: AmountError) -> Self {
        DomainError::InvalidAmount(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100)).unwrap();
        assert_eq!(amount.value(), dec!(100));
    }

    #[test]
    fn test_amount_zero_and_negative_rejected() {
        assert!(matches!(Amount::new(Decimal::ZERO), Err(AmountError::NotPositive(_))));
        assert!(matches!(Amount::new(dec!(-5)), Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_too_many_decimals() {
        assert!(matches!(Amount::new(dec!(0.125)), Err(AmountError::TooManyDecimals(3))));
        // trailing zeros are fine
        assert!(Amount::new(dec!(1.500)).is_ok());
    }

    #[test]
    fn test_amount_overflow() {
        assert!(matches!(
            Amount::new(dec!(1000000000000.01)),
            Err(AmountError::Overflow)
        ));
        assert!(Amount::new(dec!(1000000000000)).is_ok());
    }

    #[test]
    fn test_amount_from_str() {
        let amount: Amount = "12.34".parse().unwrap();
        assert_eq!(amount.value(), dec!(12.34));
        assert!(matches!("abc".parse::<Amount>(), Err(AmountError::ParseError(_))));
    }

    #[test]
    fn test_credit_and_debit() {
        let amount = Amount::from_integer(30).unwrap();
        assert_eq!(amount.credit_to(dec!(70)).unwrap(), dec!(100));
        assert_eq!(amount.debit_from(dec!(100)).unwrap(), dec!(70));
        assert_eq!(amount.debit_from(dec!(30)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_debit_insufficient() {
        let amount = Amount::from_integer(100).unwrap();
        let err = amount.debit_from(dec!(50)).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientBalance { .. }));
    }
}
