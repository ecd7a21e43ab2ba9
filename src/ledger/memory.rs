//! In-memory store for testing.
//!
//! Other transactions only ever see committed rows. A transaction buffers its
//! writes and applies them in `commit`; dropping it discards them.
//!
//! Writers claim a row before touching it and hold the claim until commit or
//! drop, so a second writer waits and then re-checks the version, as it would
//! behind a Postgres row lock. `ForShare` and `ForUpdate` reads take the same
//! exclusive claim, `ForUpdateNoWait` fails instead of waiting and
//! `ForUpdateSkipLocked` treats a claimed row as absent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::domain::{NewPointHistory, PointHistory, PointRecord, INITIAL_VERSION};

use super::store::{LockMode, PointStore, PointTransaction, PointUpdate};
use super::LedgerError;

#[derive(Debug, Default)]
struct MemoryState {
    points: HashMap<i64, PointRecord>,
    history: Vec<PointHistory>,
    /// point id -> owning transaction id
    claims: HashMap<i64, u64>,
    next_point_id: i64,
    next_history_id: i64,
}

fn lock_state(state: &Mutex<MemoryState>) -> Result<MutexGuard<'_, MemoryState>, LedgerError> {
    state
        .lock()
        .map_err(|_| LedgerError::Storage("memory store mutex poisoned".to_string()))
}

/// Mock point store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPointStore {
    state: Arc<Mutex<MemoryState>>,
    released: Arc<Notify>,
    next_tx_id: Arc<AtomicU64>,
    fail_history: Arc<AtomicBool>,
}

impl MemoryPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent history insert fail
    pub fn set_fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    /// Committed row
    pub fn snapshot(&self, point_id: i64) -> Option<PointRecord> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.points.get(&point_id).cloned())
    }

    pub fn history_len(&self) -> usize {
        self.state.lock().map(|state| state.history.len()).unwrap_or(0)
    }
}

#[async_trait]
impl PointStore for MemoryPointStore {
    type Transaction = MemoryPointTransaction;

    async fn begin(&self) -> Result<MemoryPointTransaction, LedgerError> {
        Ok(MemoryPointTransaction {
            id: self.next_tx_id.fetch_add(1, Ordering::SeqCst) + 1,
            state: Arc::clone(&self.state),
            released: Arc::clone(&self.released),
            fail_history: self.fail_history.load(Ordering::SeqCst),
            claimed: Vec::new(),
            pending_points: HashMap::new(),
            pending_history: Vec::new(),
        })
    }

    async fn create_point(&self, user_id: Option<i64>) -> Result<PointRecord, LedgerError> {
        let mut state = lock_state(&self.state)?;
        state.next_point_id += 1;

        let record = PointRecord {
            id: state.next_point_id,
            user_id,
            amount: Decimal::ZERO,
            version: INITIAL_VERSION,
            updated_at: Utc::now(),
        };
        state.points.insert(record.id, record.clone());

        Ok(record)
    }

    async fn history(&self, point_id: i64) -> Result<Vec<PointHistory>, LedgerError> {
        let state = lock_state(&self.state)?;
        let mut rows: Vec<PointHistory> = state
            .history
            .iter()
            .filter(|h| h.point_id == point_id)
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.version);

        Ok(rows)
    }
}

/// Transaction over [`MemoryPointStore`]
#[derive(Debug)]
pub struct MemoryPointTransaction {
    id: u64,
    state: Arc<Mutex<MemoryState>>,
    released: Arc<Notify>,
    fail_history: bool,
    claimed: Vec<i64>,
    pending_points: HashMap<i64, PointRecord>,
    pending_history: Vec<NewPointHistory>,
}

impl MemoryPointTransaction {
    /// Take the row claim for `point_id`.
    ///
    /// Returns `false` without waiting when another transaction holds it and
    /// `wait` is off.
    async fn claim(&mut self, point_id: i64, wait: bool) -> Result<bool, LedgerError> {
        let released = Arc::clone(&self.released);

        loop {
            // registered before the check so a release in between is not missed
            let notified = released.notified();

            {
                let mut state = lock_state(&self.state)?;
                match state.claims.get(&point_id) {
                    Some(owner) if *owner == self.id => return Ok(true),
                    Some(_) if !wait => return Ok(false),
                    Some(_) => {}
                    None => {
                        state.claims.insert(point_id, self.id);
                        self.claimed.push(point_id);
                        return Ok(true);
                    }
                }
            }

            notified.await;
        }
    }

    /// Row as seen by this transaction
    fn visible(&self, point_id: i64) -> Result<Option<PointRecord>, LedgerError> {
        if let Some(pending) = self.pending_points.get(&point_id) {
            return Ok(Some(pending.clone()));
        }
        let state = lock_state(&self.state)?;
        Ok(state.points.get(&point_id).cloned())
    }

    fn release_claims(&mut self, state: &mut MemoryState) {
        for point_id in self.claimed.drain(..) {
            state.claims.remove(&point_id);
        }
    }
}

#[async_trait]
impl PointTransaction for MemoryPointTransaction {
    async fn fetch_for_update(
        &mut self,
        point_id: i64,
        lock: LockMode,
    ) -> Result<Option<PointRecord>, LedgerError> {
        match lock {
            LockMode::None => {}
            LockMode::ForShare | LockMode::ForUpdate => {
                self.claim(point_id, true).await?;
            }
            LockMode::ForUpdateNoWait => {
                if !self.claim(point_id, false).await? {
                    return Err(LedgerError::LockNotAvailable { point_id });
                }
            }
            LockMode::ForUpdateSkipLocked => {
                if !self.claim(point_id, false).await? {
                    return Ok(None);
                }
            }
        }

        self.visible(point_id)
    }

    async fn conditional_update(
        &mut self,
        point_id: i64,
        expected_version: i64,
        update: PointUpdate,
    ) -> Result<u64, LedgerError> {
        self.claim(point_id, true).await?;

        let Some(mut row) = self.visible(point_id)? else {
            return Ok(0);
        };
        if row.version != expected_version {
            return Ok(0);
        }

        row.amount = update.amount;
        row.version = update.version;
        row.updated_at = Utc::now();
        self.pending_points.insert(point_id, row);

        Ok(1)
    }

    async fn insert_history(&mut self, row: NewPointHistory) -> Result<(), LedgerError> {
        if self.fail_history {
            return Err(LedgerError::Storage("history insert rejected".to_string()));
        }

        self.pending_history.push(row);
        Ok(())
    }

    async fn commit(mut self) -> Result<(), LedgerError> {
        {
            let state_handle = Arc::clone(&self.state);
            let mut state = lock_state(&state_handle)?;

            for (point_id, row) in self.pending_points.drain() {
                state.points.insert(point_id, row);
            }

            for row in self.pending_history.drain(..) {
                state.next_history_id += 1;
                let id = state.next_history_id;
                state.history.push(PointHistory {
                    id,
                    point_id: row.point_id,
                    amount: row.amount,
                    version: row.version,
                    transaction_id: row.entry.transaction_id,
                    reason: row.entry.reason,
                    created_at: Utc::now(),
                });
            }

            self.release_claims(&mut state);
        }

        self.released.notify_waiters();
        Ok(())
    }
}

impl Drop for MemoryPointTransaction {
    fn drop(&mut self) {
        if self.claimed.is_empty() {
            return;
        }

        if !self.pending_points.is_empty() || !self.pending_history.is_empty() {
            tracing::debug!(tx = self.id, "Memory point transaction rolled back");
        }

        let state_handle = Arc::clone(&self.state);
        if let Ok(mut state) = state_handle.lock() {
            self.release_claims(&mut state);
        }
        self.released.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HistoryEntry;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn history_row(point_id: i64, amount: Decimal, version: i64) -> NewPointHistory {
        NewPointHistory {
            point_id,
            amount,
            version,
            entry: HistoryEntry::new(),
        }
    }

    #[tokio::test]
    async fn test_conditional_update_checks_version() {
        let store = MemoryPointStore::new();
        let point = store.create_point(Some(1)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let stale = tx
            .conditional_update(point.id, 5, PointUpdate { amount: dec!(10), version: 6 })
            .await
            .unwrap();
        assert_eq!(stale, 0);

        let fresh = tx
            .conditional_update(point.id, 1, PointUpdate { amount: dec!(10), version: 2 })
            .await
            .unwrap();
        assert_eq!(fresh, 1);
        tx.commit().await.unwrap();

        let row = store.snapshot(point.id).unwrap();
        assert_eq!(row.version, 2);
        assert_eq!(row.amount, dec!(10));
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let store = MemoryPointStore::new();
        let point = store.create_point(None).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.conditional_update(point.id, 1, PointUpdate { amount: dec!(99), version: 2 })
                .await
                .unwrap();
            tx.insert_history(history_row(point.id, dec!(99), 2)).await.unwrap();
        }

        let row = store.snapshot(point.id).unwrap();
        assert_eq!(row.version, 1);
        assert_eq!(row.amount, Decimal::ZERO);
        assert_eq!(store.history_len(), 0);
    }

    #[tokio::test]
    async fn test_uncommitted_write_is_invisible_to_others() {
        let store = MemoryPointStore::new();
        let point = store.create_point(None).await.unwrap();

        let mut writer = store.begin().await.unwrap();
        writer
            .conditional_update(point.id, 1, PointUpdate { amount: dec!(1000), version: 2 })
            .await
            .unwrap();

        // the writer sees its own change
        let own = writer.fetch_for_update(point.id, LockMode::None).await.unwrap().unwrap();
        assert_eq!(own.amount, dec!(1000));

        let mut reader = store.begin().await.unwrap();
        let seen = reader.fetch_for_update(point.id, LockMode::None).await.unwrap().unwrap();
        assert_eq!(seen.amount, Decimal::ZERO);
        assert_eq!(seen.version, 1);

        drop(writer);
        assert_eq!(store.snapshot(point.id).unwrap().amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_second_writer_waits_then_sees_new_version() {
        let store = MemoryPointStore::new();
        let point = store.create_point(None).await.unwrap();

        let mut first = store.begin().await.unwrap();
        first
            .conditional_update(point.id, 1, PointUpdate { amount: dec!(5), version: 2 })
            .await
            .unwrap();

        let contender = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut tx = store.begin().await.unwrap();
                tx.conditional_update(point.id, 1, PointUpdate { amount: dec!(7), version: 2 })
                    .await
                    .unwrap()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        first.insert_history(history_row(point.id, dec!(5), 2)).await.unwrap();
        first.commit().await.unwrap();

        assert_eq!(contender.await.unwrap(), 0);
        assert_eq!(store.snapshot(point.id).unwrap().amount, dec!(5));
    }

    #[tokio::test]
    async fn test_nowait_and_skip_locked_on_claimed_row() {
        let store = MemoryPointStore::new();
        let point = store.create_point(None).await.unwrap();

        let mut holder = store.begin().await.unwrap();
        holder
            .fetch_for_update(point.id, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();

        let mut other = store.begin().await.unwrap();
        let err = other
            .fetch_for_update(point.id, LockMode::ForUpdateNoWait)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::LockNotAvailable { point_id } if point_id == point.id));

        let skipped = other
            .fetch_for_update(point.id, LockMode::ForUpdateSkipLocked)
            .await
            .unwrap();
        assert!(skipped.is_none());

        drop(holder);
        let row = other
            .fetch_for_update(point.id, LockMode::ForUpdateNoWait)
            .await
            .unwrap();
        assert!(row.is_some());
    }
}
