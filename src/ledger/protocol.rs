//! Point ledger protocol
//!
//! Read-modify-write over a [`PointStore`]: fetch with an optional lock,
//! compare-and-swap on `version`, and the paired history append. The balance
//! write and its history row share one store transaction, so a failed append
//! leaves no committed balance change behind.

use rust_decimal::Decimal;

use crate::domain::{HistoryEntry, NewPointHistory, PointHistory, PointRecord};

use super::store::{LockMode, PointStore, PointTransaction, PointUpdate};
use super::LedgerError;

/// Entity name carried by lock conflicts
pub const POINT_ENTITY: &str = "Balance";

/// Storage-agnostic ledger over a point store
#[derive(Debug, Clone)]
pub struct PointLedger<S> {
    store: S,
}

impl<S: PointStore> PointLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open a caller-owned transaction for [`get_balance_in`](Self::get_balance_in)
    /// and [`apply_update_in`](Self::apply_update_in).
    ///
    /// Row locks taken inside it are held until it is committed or dropped.
    pub async fn begin(&self) -> Result<S::Transaction, LedgerError> {
        self.store.begin().await
    }

    /// Open a zero balance for a new account
    pub async fn open_account(&self, user_id: Option<i64>) -> Result<PointRecord, LedgerError> {
        let record = self.store.create_point(user_id).await?;
        tracing::info!(point_id = record.id, user_id = ?user_id, "Point balance opened");
        Ok(record)
    }

    /// Read the current balance row in a transaction of its own.
    ///
    /// Any row lock is released again before this returns; use
    /// [`get_balance_in`](Self::get_balance_in) to keep it.
    pub async fn get_balance(
        &self,
        point_id: i64,
        lock: LockMode,
    ) -> Result<PointRecord, LedgerError> {
        let mut tx = self.store.begin().await?;
        let record = self.get_balance_in(&mut tx, point_id, lock).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Read the balance row inside `tx`, taking `lock` for the rest of it.
    pub async fn get_balance_in(
        &self,
        tx: &mut S::Transaction,
        point_id: i64,
        lock: LockMode,
    ) -> Result<PointRecord, LedgerError> {
        tx.fetch_for_update(point_id, lock)
            .await?
            .ok_or(LedgerError::NotFound { point_id })
    }

    /// Version-checked update paired with a history row, committed on success.
    ///
    /// Succeeds only if the stored version still equals `expected_version`;
    /// the row then holds `new_amount` at `expected_version + 1`, which is
    /// returned. Retrying on conflict is the caller's job.
    pub async fn apply_update(
        &self,
        point_id: i64,
        new_amount: Decimal,
        expected_version: i64,
        entry: HistoryEntry,
    ) -> Result<i64, LedgerError> {
        let mut tx = self.store.begin().await?;

        // Dropping `tx` on error rolls the balance write back
        let version = self
            .apply_update_in(&mut tx, point_id, new_amount, expected_version, entry)
            .await?;
        tx.commit().await?;

        Ok(version)
    }

    /// [`apply_update`](Self::apply_update) inside a caller-owned transaction.
    ///
    /// Nothing is durable until the caller commits `tx`.
    pub async fn apply_update_in(
        &self,
        tx: &mut S::Transaction,
        point_id: i64,
        new_amount: Decimal,
        expected_version: i64,
        entry: HistoryEntry,
    ) -> Result<i64, LedgerError> {
        let attempted_version = expected_version
            .checked_add(1)
            .ok_or(LedgerError::VersionOverflow { point_id, expected_version })?;

        let affected = tx
            .conditional_update(
                point_id,
                expected_version,
                PointUpdate {
                    amount: new_amount,
                    version: attempted_version,
                },
            )
            .await?;

        if affected == 0 {
            tracing::warn!(
                point_id,
                expected_version,
                attempted_version,
                "Optimistic lock conflict on point balance"
            );
            return Err(LedgerError::OptimisticLockConflict {
                entity: POINT_ENTITY,
                attempted_version,
                expected_version,
            });
        }

        tx.insert_history(NewPointHistory {
            point_id,
            amount: new_amount,
            version: attempted_version,
            entry,
        })
        .await?;

        tracing::debug!(
            point_id,
            version = attempted_version,
            amount = %new_amount,
            "Point balance updated"
        );

        Ok(attempted_version)
    }

    pub async fn history(&self, point_id: i64) -> Result<Vec<PointHistory>, LedgerError> {
        self.store.history(point_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryPointStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_get_balance_not_found() {
        let ledger = PointLedger::new(MemoryPointStore::new());

        let err = ledger.get_balance(404, LockMode::ForUpdate).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { point_id: 404 }));
    }

    #[tokio::test]
    async fn test_apply_update_writes_history() {
        let ledger = PointLedger::new(MemoryPointStore::new());
        let point = ledger.open_account(Some(7)).await.unwrap();

        let version = ledger
            .apply_update(point.id, dec!(150), point.version, HistoryEntry::new().with_transaction_id("TX1"))
            .await
            .unwrap();
        assert_eq!(version, point.version + 1);

        let current = ledger.get_balance(point.id, LockMode::None).await.unwrap();
        assert_eq!(current.amount, dec!(150));
        assert_eq!(current.version, version);

        let history = ledger.history(point.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, dec!(150));
        assert_eq!(history[0].version, version);
        assert_eq!(history[0].transaction_id.as_deref(), Some("TX1"));
    }

    #[tokio::test]
    async fn test_apply_update_stale_version_conflicts() {
        let ledger = PointLedger::new(MemoryPointStore::new());
        let point = ledger.open_account(None).await.unwrap();

        ledger
            .apply_update(point.id, dec!(10), point.version, HistoryEntry::new())
            .await
            .unwrap();

        let err = ledger
            .apply_update(point.id, dec!(20), point.version, HistoryEntry::new())
            .await
            .unwrap_err();

        match err {
            LedgerError::OptimisticLockConflict {
                entity,
                attempted_version,
                expected_version,
            } => {
                assert_eq!(entity, "Balance");
                assert_eq!(expected_version, point.version);
                assert_eq!(attempted_version, point.version + 1);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_apply_update_rejects_exhausted_version() {
        let ledger = PointLedger::new(MemoryPointStore::new());
        let point = ledger.open_account(None).await.unwrap();

        let err = ledger
            .apply_update(point.id, dec!(1), i64::MAX, HistoryEntry::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::VersionOverflow { expected_version: i64::MAX, .. }
        ));

        let current = ledger.get_balance(point.id, LockMode::None).await.unwrap();
        assert_eq!(current.version, point.version);
        assert!(ledger.history(point.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_taken_on_read_is_held_until_commit() {
        let ledger = PointLedger::new(MemoryPointStore::new());
        let point = ledger.open_account(None).await.unwrap();

        let mut tx = ledger.begin().await.unwrap();
        let current = ledger
            .get_balance_in(&mut tx, point.id, LockMode::ForUpdate)
            .await
            .unwrap();

        let err = ledger
            .get_balance(point.id, LockMode::ForUpdateNoWait)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::LockNotAvailable { .. }));

        let version = ledger
            .apply_update_in(&mut tx, point.id, dec!(40), current.version, HistoryEntry::new())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let after = ledger.get_balance(point.id, LockMode::ForUpdateNoWait).await.unwrap();
        assert_eq!(after.version, version);
        assert_eq!(after.amount, dec!(40));
    }
}
