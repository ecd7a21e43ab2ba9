//! Storage capability
//!
//! The ledger protocol only needs three row operations (fetch, conditional
//! update, history insert) scoped to one transaction. Adapters implement
//! these traits; [`PointLedger`](super::PointLedger) stays storage-agnostic.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{NewPointHistory, PointHistory, PointRecord};

use super::LedgerError;

/// Row lock requested when reading a balance.
///
/// The ledger passes it through untouched; only the adapter interprets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockMode {
    #[default]
    None,
    ForShare,
    ForUpdate,
    ForUpdateNoWait,
    ForUpdateSkipLocked,
}

impl LockMode {
    /// SQL row-locking clause appended to a `SELECT`
    pub fn as_sql(&self) -> &'static str {
        match self {
            LockMode::None => "",
            LockMode::ForShare => " FOR SHARE",
            LockMode::ForUpdate => " FOR UPDATE",
            LockMode::ForUpdateNoWait => " FOR UPDATE NOWAIT",
            LockMode::ForUpdateSkipLocked => " FOR UPDATE SKIP LOCKED",
        }
    }
}

/// New column values for a version-checked update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointUpdate {
    pub amount: Decimal,
    pub version: i64,
}

/// Durable store holding balance rows and the history table.
#[async_trait]
pub trait PointStore: Send + Sync {
    type Transaction: PointTransaction;

    /// Open a transactional scope. Dropping it without `commit` rolls back.
    async fn begin(&self) -> Result<Self::Transaction, LedgerError>;

    /// Insert a zero balance row for a new account
    async fn create_point(&self, user_id: Option<i64>) -> Result<PointRecord, LedgerError>;

    /// History rows for one balance, oldest first
    async fn history(&self, point_id: i64) -> Result<Vec<PointHistory>, LedgerError>;
}

/// One unit of work against the store.
#[async_trait]
pub trait PointTransaction: Send {
    async fn fetch_for_update(
        &mut self,
        point_id: i64,
        lock: LockMode,
    ) -> Result<Option<PointRecord>, LedgerError>;

    /// Write `update` only where the stored version equals `expected_version`.
    /// Returns the number of rows affected.
    async fn conditional_update(
        &mut self,
        point_id: i64,
        expected_version: i64,
        update: PointUpdate,
    ) -> Result<u64, LedgerError>;

    async fn insert_history(&mut self, row: NewPointHistory) -> Result<(), LedgerError>;

    async fn commit(self) -> Result<(), LedgerError>;
}
