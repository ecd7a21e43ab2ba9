//! Point records
//!
//! Row shapes for the current balance and its append-only history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Version assigned to a freshly opened balance row
pub const INITIAL_VERSION: i64 = 1;

/// Current point balance of one account plus its optimistic-lock version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointRecord {
    pub id: i64,
    pub user_id: Option<i64>,
    pub amount: Decimal,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit row written with every committed balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PointHistory {
    pub id: i64,
    pub point_id: i64,
    pub amount: Decimal,
    pub version: i64,
    pub transaction_id: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit fields supplied by the caller of an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction_id: Option<String>,
    pub reason: Option<String>,
}

impl HistoryEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// History row as handed to the store, before it gets an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPointHistory {
    pub point_id: i64,
    pub amount: Decimal,
    pub version: i64,
    pub entry: HistoryEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_entry_builder() {
        let entry = HistoryEntry::new()
            .with_transaction_id("TX42")
            .with_reason("charge");

        assert_eq!(entry.transaction_id.as_deref(), Some("TX42"));
        assert_eq!(entry.reason.as_deref(), Some("charge"));
    }
}
