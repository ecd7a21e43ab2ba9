//! Postgres store
//!
//! sqlx adapter over the `point` and `point_history` tables.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{NewPointHistory, PointHistory, PointRecord, INITIAL_VERSION};

use super::store::{LockMode, PointStore, PointTransaction, PointUpdate};
use super::LedgerError;

/// SQLSTATE raised by `FOR UPDATE NOWAIT` on a locked row
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Point store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgPointStore {
    pool: PgPool,
}

impl PgPointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PointStore for PgPointStore {
    type Transaction = PgPointTransaction;

    async fn begin(&self) -> Result<PgPointTransaction, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(PgPointTransaction { tx })
    }

    async fn create_point(&self, user_id: Option<i64>) -> Result<PointRecord, LedgerError> {
        let record: PointRecord = sqlx::query_as(
            r#"
            INSERT INTO point (user_id, amount, version)
            VALUES ($1, 0, $2)
            RETURNING id, user_id, amount, version, updated_at
            "#,
        )
        .bind(user_id)
        .bind(INITIAL_VERSION)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn history(&self, point_id: i64) -> Result<Vec<PointHistory>, LedgerError> {
        let rows: Vec<PointHistory> = sqlx::query_as(
            r#"
            SELECT id, point_id, amount, version, transaction_id, reason, created_at
            FROM point_history
            WHERE point_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(point_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Open Postgres transaction. sqlx rolls it back when dropped uncommitted.
#[derive(Debug)]
pub struct PgPointTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PointTransaction for PgPointTransaction {
    async fn fetch_for_update(
        &mut self,
        point_id: i64,
        lock: LockMode,
    ) -> Result<Option<PointRecord>, LedgerError> {
        let sql = format!(
            "SELECT id, user_id, amount, version, updated_at FROM point WHERE id = $1{}",
            lock.as_sql()
        );

        let record: Option<PointRecord> = sqlx::query_as(&sql)
            .bind(point_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.code().as_deref() == Some(LOCK_NOT_AVAILABLE) => {
                    LedgerError::LockNotAvailable { point_id }
                }
                other => LedgerError::Database(other),
            })?;

        Ok(record)
    }

    async fn conditional_update(
        &mut self,
        point_id: i64,
        expected_version: i64,
        update: PointUpdate,
    ) -> Result<u64, LedgerError> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE point
            SET amount = $3, version = $4, updated_at = NOW()
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(point_id)
        .bind(expected_version)
        .bind(update.amount)
        .bind(update.version)
        .execute(&mut *self.tx)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }

    async fn insert_history(&mut self, row: NewPointHistory) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO point_history (point_id, amount, version, transaction_id, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(row.point_id)
        .bind(row.amount)
        .bind(row.version)
        .bind(row.entry.transaction_id)
        .bind(row.entry.reason)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<(), LedgerError> {
        self.tx.commit().await?;
        Ok(())
    }
}
