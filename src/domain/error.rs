//! Domain Error Types
//!
//! Business rule failures raised before anything is written to the ledger.

use rust_decimal::Decimal;
use thiserror::Error;

/// Domain-specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Debit would take the balance below zero
    #[error("Insufficient points: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// Invalid amount (zero, negative, or exceeds limit)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl DomainError {
    pub fn insufficient_balance(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientBalance { required, available }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_error() {
        let err = DomainError::insufficient_balance(Decimal::new(100, 0), Decimal::new(50, 0));

        assert!(matches!(err, DomainError::InsufficientBalance { .. }));
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }
}
