//! Point Service
//!
//! Use cases that change a balance. Each one owns the read-modify-write retry
//! loop around [`PointLedger::apply_update`] and raises domain events through
//! the synchronous dispatcher once the change committed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dispatch::EventDispatcher;
use crate::domain::{Amount, DomainError, DomainEvent, HistoryEntry, PointChangeReason};
use crate::error::{AppError, AppResult};
use crate::ledger::{LedgerError, LockMode, PointLedger, PointStore};

use super::{ChargePointCommand, PayWithPointCommand, PointChangeResult};

/// Read-modify-write attempts before a conflict is surfaced
const MAX_ATTEMPTS: u32 = 3;

pub struct PointService<S> {
    ledger: PointLedger<S>,
    dispatcher: Arc<EventDispatcher>,
}

impl<S: PointStore> PointService<S> {
    pub fn new(ledger: PointLedger<S>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { ledger, dispatcher }
    }

    pub fn ledger(&self) -> &PointLedger<S> {
        &self.ledger
    }

    /// Credit points to a balance
    pub async fn charge(&self, command: ChargePointCommand) -> AppResult<PointChangeResult> {
        let amount = parse_amount(&command.amount)?;
        let transaction_id = command
            .transaction_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let result = self
            .change_with_retry(command.point_id, &transaction_id, PointChangeReason::Charge, |balance| {
                amount.credit_to(balance)
            })
            .await?;

        self.raise_point_changed(&result, PointChangeReason::Charge).await?;
        Ok(result)
    }

    /// Debit points to settle a payment and announce it
    pub async fn pay(&self, command: PayWithPointCommand) -> AppResult<PointChangeResult> {
        let amount = parse_amount(&command.amount)?;
        if command.transaction_id.trim().is_empty() {
            return Err(AppError::InvalidRequest("transaction_id is required".to_string()));
        }

        let result = self
            .change_with_retry(
                command.point_id,
                &command.transaction_id,
                PointChangeReason::Payment,
                |balance| amount.debit_from(balance),
            )
            .await?;

        self.raise_point_changed(&result, PointChangeReason::Payment).await?;

        self.dispatcher
            .emit(&DomainEvent::PaymentCompleted {
                point_id: result.point_id,
                transaction_id: result.transaction_id.clone(),
                amount: amount.value(),
                payload: command.payload,
                completed_at: Utc::now(),
            })
            .await?;

        Ok(result)
    }

    async fn change_with_retry<F>(
        &self,
        point_id: i64,
        transaction_id: &str,
        reason: PointChangeReason,
        compute: F,
    ) -> AppResult<PointChangeResult>
    where
        F: Fn(Decimal) -> Result<Decimal, DomainError> + Send + Sync,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let current = self
                .ledger
                .get_balance(point_id, LockMode::None)
                .await
                .map_err(|e| ledger_failure(point_id, transaction_id, e))?;
            let new_amount = compute(current.amount)?;

            let entry = HistoryEntry::new()
                .with_transaction_id(transaction_id)
                .with_reason(reason.as_str());

            match self
                .ledger
                .apply_update(point_id, new_amount, current.version, entry)
                .await
            {
                Ok(version) => {
                    return Ok(PointChangeResult {
                        point_id,
                        transaction_id: transaction_id.to_string(),
                        previous_amount: current.amount,
                        amount: new_amount,
                        version,
                        attempts: attempt,
                    });
                }
                Err(e @ LedgerError::OptimisticLockConflict { .. }) => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(e.into());
                    }
                    let delay = Duration::from_millis(50 * attempt as u64);
                    tracing::warn!(
                        point_id,
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        "Concurrent point update, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(ledger_failure(point_id, transaction_id, e)),
            }
        }
    }

    async fn raise_point_changed(
        &self,
        result: &PointChangeResult,
        reason: PointChangeReason,
    ) -> AppResult<()> {
        self.dispatcher
            .emit(&DomainEvent::PointChanged {
                point_id: result.point_id,
                previous_amount: result.previous_amount,
                amount: result.amount,
                version: result.version,
                reason,
                transaction_id: result.transaction_id.clone(),
                changed_at: Utc::now(),
            })
            .await?;
        Ok(())
    }
}

/// Surface a non-conflict ledger error, flagging broken invariants
fn ledger_failure(point_id: i64, transaction_id: &str, error: LedgerError) -> AppError {
    if error.is_integrity_fault() {
        tracing::error!(point_id, transaction_id, error = %error, "Point ledger integrity fault");
    }
    error.into()
}

fn parse_amount(raw: &str) -> AppResult<Amount> {
    raw.parse::<Amount>()
        .map_err(|e| AppError::InvalidRequest(format!("Invalid amount: {}", e)))
}
