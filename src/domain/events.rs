//! Domain Events
//!
//! Facts raised after a ledger change commits. They are dispatched in-process
//! through [`EventDispatcher`](crate::dispatch::EventDispatcher) and are not
//! persisted; the point history table is the audit trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Event name raised after every committed balance change
pub const POINT_CHANGED: &str = "point.changed";

/// Event name raised after a payment settled with points
pub const PAYMENT_COMPLETED: &str = "payment.completed";

/// Why a balance changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointChangeReason {
    Charge,
    Payment,
}

impl PointChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointChangeReason::Charge => "charge",
            PointChangeReason::Payment => "payment",
        }
    }
}

impl std::fmt::Display for PointChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events raised by the point use cases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    /// A balance update committed together with its history row
    PointChanged {
        point_id: i64,
        previous_amount: Decimal,
        amount: Decimal,
        version: i64,
        reason: PointChangeReason,
        transaction_id: String,
        changed_at: DateTime<Utc>,
    },

    /// Points were spent to settle a payment
    PaymentCompleted {
        point_id: i64,
        transaction_id: String,
        amount: Decimal,
        /// Business data forwarded untouched to the payment topic
        payload: serde_json::Value,
        completed_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Event name used for listener registration
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::PointChanged { .. } => POINT_CHANGED,
            DomainEvent::PaymentCompleted { .. } => PAYMENT_COMPLETED,
        }
    }

    pub fn transaction_id(&self) -> &str {
        match self {
            DomainEvent::PointChanged { transaction_id, .. } => transaction_id,
            DomainEvent::PaymentCompleted { transaction_id, .. } => transaction_id,
        }
    }
}
