//! Delivery failure reporting
//!
//! The producer never raises delivery failures; it hands exactly one
//! [`DeliveryFailure`] per exhausted submission to a reporter.

use super::TransportError;

/// Structured record of a dropped payment event
#[derive(Debug, Clone)]
pub struct DeliveryFailure {
    pub topic: String,
    pub delivery_key: String,
    pub transaction_id: String,
    pub attempts: u32,
    pub error: TransportError,
}

pub trait FailureReporter: Send + Sync {
    fn report(&self, failure: &DeliveryFailure);
}

/// Writes failures to the `tracing` error stream
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFailureReporter;

impl FailureReporter for TracingFailureReporter {
    fn report(&self, failure: &DeliveryFailure) {
        tracing::error!(
            topic = %failure.topic,
            delivery_key = %failure.delivery_key,
            transaction_id = %failure.transaction_id,
            attempts = failure.attempts,
            error = %failure.error,
            "Payment event dropped after exhausting retries"
        );
    }
}
