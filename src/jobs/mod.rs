//! Scheduled Jobs
//!
//! Periodic reconciliation of the balance/history pairing. Every committed
//! version above the initial one must have a history row; rows that do not
//! are reported for manual repair.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::time::interval;

use crate::domain::INITIAL_VERSION;

/// Balance row whose current version has no matching history row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct UnpairedBalance {
    pub point_id: i64,
    pub amount: Decimal,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Find balances whose latest version is missing from the history table
pub async fn find_unpaired_balances(pool: &PgPool) -> Result<Vec<UnpairedBalance>, JobError> {
    let rows: Vec<UnpairedBalance> = sqlx::query_as(
        r#"
        SELECT p.id AS point_id, p.amount, p.version, p.updated_at
        FROM point p
        WHERE p.version > $1
          AND NOT EXISTS (
              SELECT 1 FROM point_history h
              WHERE h.point_id = p.id AND h.version = p.version
          )
        ORDER BY p.id
        "#,
    )
    .bind(INITIAL_VERSION)
    .fetch_all(pool)
    .await?;

    for row in &rows {
        tracing::warn!(
            point_id = row.point_id,
            version = row.version,
            amount = %row.amount,
            "Point balance has no history row for its current version"
        );
    }

    Ok(rows)
}

/// Configuration for the reconcile job
#[derive(Debug, Clone)]
pub struct ReconcileJobConfig {
    /// Interval between runs (default: 5 minutes)
    pub interval: Duration,
}

impl Default for ReconcileJobConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
        }
    }
}

/// Reconcile job - checks history pairing on an interval
pub struct ReconcileJob {
    pool: PgPool,
    config: ReconcileJobConfig,
}

impl ReconcileJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            config: ReconcileJobConfig::default(),
        }
    }

    pub fn with_config(pool: PgPool, config: ReconcileJobConfig) -> Self {
        Self { pool, config }
    }

    /// Run until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(interval = ?self.config.interval, "Reconcile job started");

        let mut ticker = interval(self.config.interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.run_once().await;
                    if !report.errors.is_empty() {
                        tracing::error!(errors = ?report.errors, "Reconcile run failed");
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Reconcile job stopped");
                    break;
                }
            }
        }
    }

    /// Run the check once (for manual trigger or testing)
    pub async fn run_once(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        match find_unpaired_balances(&self.pool).await {
            Ok(rows) => report.unpaired = rows,
            Err(e) => report.errors.push(format!("Unpaired balance check: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from one reconcile run
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub unpaired: Vec<UnpairedBalance>,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.unpaired.is_empty() && self.errors.is_empty()
    }
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
