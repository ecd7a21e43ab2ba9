//! Error handling module
//!
//! Boundary error type for the point use cases and its retryable/fatal
//! classification.

use crate::dispatch::DispatchError;
use crate::domain::DomainError;
use crate::ledger::LedgerError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A synchronous listener failed after the ledger change committed
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Lock conflicts may succeed on a fresh read-modify-write
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Ledger(e) if e.is_retryable())
    }

    /// Stable machine-readable code for the boundary layer
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Domain(DomainError::InsufficientBalance { .. }) => "insufficient_points",
            AppError::Domain(DomainError::InvalidAmount(_)) => "invalid_amount",
            AppError::Ledger(LedgerError::NotFound { .. }) => "point_not_found",
            AppError::Ledger(LedgerError::OptimisticLockConflict { .. }) => "version_conflict",
            AppError::Ledger(LedgerError::LockNotAvailable { .. }) => "point_locked",
            AppError::Ledger(LedgerError::VersionOverflow { .. }) => "version_exhausted",
            AppError::Ledger(_) => "storage_error",
            AppError::Dispatch(_) => "event_handler_failed",
            AppError::Internal(_) => "internal_error",
        }
    }
}
