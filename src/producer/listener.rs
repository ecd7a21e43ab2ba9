//! Payment notification listener
//!
//! Bridges `payment.completed` domain events to the payment topic.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::EventListener;
use crate::domain::{DomainEvent, PAYMENT_COMPLETED};

use super::{PaymentEvent, PaymentProducer, PAYMENT_SUCCESS_TOPIC};

const EVENTS: &[&str] = &[PAYMENT_COMPLETED];

pub struct PaymentNotificationListener {
    producer: Arc<PaymentProducer>,
}

impl PaymentNotificationListener {
    pub fn new(producer: Arc<PaymentProducer>) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl EventListener for PaymentNotificationListener {
    fn name(&self) -> &str {
        "payment-notification"
    }

    fn events(&self) -> &[&'static str] {
        EVENTS
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        let DomainEvent::PaymentCompleted {
            point_id,
            transaction_id,
            amount,
            payload,
            completed_at,
        } = event
        else {
            return Ok(());
        };

        let message = serde_json::json!({
            "pointId": point_id,
            "transactionId": transaction_id,
            "amount": amount.to_string(),
            "completedAt": completed_at,
            "data": payload,
        });

        // Serialization is the only failure that reaches the emitter;
        // delivery problems are absorbed by the producer.
        let payment_event = PaymentEvent::json(PAYMENT_SUCCESS_TOPIC, transaction_id.as_str(), &message)?;
        self.producer.emit(payment_event).await;

        Ok(())
    }
}
