//! In-process transports.
//!
//! `RecordingTransport` is a scriptable mock for tests; `NullTransport`
//! acknowledges and drops records when no broker is configured.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{MessageTransport, OutboundRecord, TransportError};

/// Scripted outcome of one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ack,
    Fail,
    /// Never completes; only a timeout ends the attempt
    Hang,
}

/// Mock transport that records every attempt.
#[derive(Debug)]
pub struct RecordingTransport {
    script: Mutex<VecDeque<SubmitOutcome>>,
    fallback: SubmitOutcome,
    attempts: Mutex<Vec<OutboundRecord>>,
}

impl RecordingTransport {
    /// Acknowledges everything
    pub fn new() -> Self {
        Self::with_fallback(SubmitOutcome::Ack)
    }

    /// Uses `fallback` once the script runs out
    pub fn with_fallback(fallback: SubmitOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Fails the first `failures` attempts, then acknowledges
    pub fn failing_first(failures: usize) -> Self {
        Self::scripted(std::iter::repeat(SubmitOutcome::Fail).take(failures), SubmitOutcome::Ack)
    }

    pub fn always_failing() -> Self {
        Self::with_fallback(SubmitOutcome::Fail)
    }

    pub fn scripted(
        outcomes: impl IntoIterator<Item = SubmitOutcome>,
        fallback: SubmitOutcome,
    ) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            fallback,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub async fn attempt_count(&self) -> usize {
        self.attempts.lock().await.len()
    }

    pub async fn attempts(&self) -> Vec<OutboundRecord> {
        self.attempts.lock().await.clone()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn submit(&self, record: &OutboundRecord) -> Result<(), TransportError> {
        self.attempts.lock().await.push(record.clone());

        let outcome = self.script.lock().await.pop_front().unwrap_or(self.fallback);
        match outcome {
            SubmitOutcome::Ack => Ok(()),
            SubmitOutcome::Fail => Err(TransportError::Submit("scripted failure".to_string())),
            SubmitOutcome::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

/// Transport used when no broker is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

#[async_trait]
impl MessageTransport for NullTransport {
    async fn submit(&self, record: &OutboundRecord) -> Result<(), TransportError> {
        tracing::debug!(
            topic = %record.topic,
            key = %record.key,
            "No broker configured, dropping record"
        );
        Ok(())
    }
}
