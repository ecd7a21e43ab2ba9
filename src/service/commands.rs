//! Command definitions
//!
//! Commands represent intentions to change a point balance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Command to credit points to a balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargePointCommand {
    pub point_id: i64,
    /// Amount to credit (as string for precise decimal)
    pub amount: String,
    /// Generated when absent
    pub transaction_id: Option<String>,
}

impl ChargePointCommand {
    pub fn new(point_id: i64, amount: impl Into<String>) -> Self {
        Self {
            point_id,
            amount: amount.into(),
            transaction_id: None,
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

/// Command to settle a payment with points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayWithPointCommand {
    pub point_id: i64,
    /// Amount to debit (as string for precise decimal)
    pub amount: String,
    pub transaction_id: String,
    /// Business data forwarded to the payment topic
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl PayWithPointCommand {
    pub fn new(point_id: i64, amount: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            point_id,
            amount: amount.into(),
            transaction_id: transaction_id.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Result of a committed balance change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointChangeResult {
    pub point_id: i64,
    pub transaction_id: String,
    pub previous_amount: Decimal,
    pub amount: Decimal,
    pub version: i64,
    /// Read-modify-write attempts it took
    pub attempts: u32,
}
