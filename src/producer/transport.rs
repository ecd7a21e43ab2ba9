//! Message transport seam

use std::time::Duration;

use async_trait::async_trait;

/// Partition every payment record is addressed to
pub const PAYMENT_PARTITION: i32 = 0;

/// Record as handed to the broker client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
    pub partition: i32,
}

/// Errors a transport can report for one submission
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Submit failed: {0}")]
    Submit(String),

    #[error("Submission timed out after {0:?}")]
    Timeout(Duration),
}

/// Broker client able to accept one record at a time.
///
/// Implementations must be safe for concurrent use without extra locking.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Resolves once the broker confirmed the record.
    async fn submit(&self, record: &OutboundRecord) -> Result<(), TransportError>;
}
