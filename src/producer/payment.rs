//! Payment producer
//!
//! Best-effort publisher: transient broker failures are retried under
//! [`RetryPolicy::PAYMENT`], exhausted submissions are reported and dropped.
//! `emit` never fails its caller.

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    retry_submit, DeliveryFailure, FailureReporter, MessageTransport, OutboundRecord,
    PaymentEvent, RetryPolicy, TracingFailureReporter, PAYMENT_PARTITION,
};

pub struct PaymentProducer {
    transport: Arc<dyn MessageTransport>,
    reporter: Arc<dyn FailureReporter>,
}

impl PaymentProducer {
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self::with_reporter(transport, Arc::new(TracingFailureReporter))
    }

    pub fn with_reporter(
        transport: Arc<dyn MessageTransport>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        Self { transport, reporter }
    }

    /// Publish `event`, retrying transient failures.
    ///
    /// May block for up to [`RetryPolicy::worst_case`]. Returning does not
    /// imply delivery.
    pub async fn emit(&self, event: PaymentEvent) {
        let delivery_key = event.delivery_key();
        let PaymentEvent {
            topic,
            transaction_id,
            payload,
        } = event;

        let record = OutboundRecord {
            topic,
            key: delivery_key,
            payload,
            partition: PAYMENT_PARTITION,
        };

        let transport = &self.transport;
        let record_ref = &record;
        let result = retry_submit(&RetryPolicy::PAYMENT, |attempt| async move {
            debug!(
                topic = %record_ref.topic,
                delivery_key = %record_ref.key,
                attempt,
                "Submitting payment event"
            );
            transport.submit(record_ref).await
        })
        .await;

        match result {
            Ok(attempts) => {
                info!(
                    topic = %record.topic,
                    delivery_key = %record.key,
                    attempts,
                    "Payment event submitted"
                );
            }
            Err(exhausted) => {
                self.reporter.report(&DeliveryFailure {
                    topic: record.topic,
                    delivery_key: record.key,
                    transaction_id,
                    attempts: exhausted.attempts,
                    error: exhausted.last_error,
                });
            }
        }
    }
}

impl std::fmt::Debug for PaymentProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentProducer")
            .field("policy", &RetryPolicy::PAYMENT)
            .finish_non_exhaustive()
    }
}
