//! Ledger Errors
//!
//! Error types for balance reads and version-checked updates.

/// Errors that can occur in the point ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// No balance row for the id. Every valid account has one, so this is a
    /// data-integrity fault rather than a normal outcome.
    #[error("Point balance not found: {point_id}")]
    NotFound { point_id: i64 },

    /// Another writer advanced the version after it was read
    #[error("Optimistic lock conflict on {entity}: attempted version {attempted_version}, expected version {expected_version}")]
    OptimisticLockConflict {
        entity: &'static str,
        attempted_version: i64,
        expected_version: i64,
    },

    /// Row is locked by another transaction and the read asked not to wait
    #[error("Point balance {point_id} is locked by another transaction")]
    LockNotAvailable { point_id: i64 },

    /// The stored version cannot be advanced any further
    #[error("Version of point balance {point_id} exhausted at {expected_version}")]
    VersionOverflow { point_id: i64, expected_version: i64 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-SQL storage failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Check if this error is an optimistic lock conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::OptimisticLockConflict { .. })
    }

    /// Check if re-reading and retrying the whole read-modify-write may succeed
    pub fn is_retryable(&self) -> bool {
        self.is_conflict() || matches!(self, LedgerError::LockNotAvailable { .. })
    }

    /// Check if this error indicates broken invariants elsewhere
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            LedgerError::NotFound { .. } | LedgerError::VersionOverflow { .. }
        )
    }
}
