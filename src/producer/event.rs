//! Payment events and delivery keys

use serde::Serialize;

/// Topic for settled payments
pub const PAYMENT_SUCCESS_TOPIC: &str = "payment.success";

/// A payment fact to announce on the message bus. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    /// Dot-separated logical channel, e.g. `payment.success`
    pub topic: String,
    pub transaction_id: String,
    /// Opaque serialized business data
    pub payload: Vec<u8>,
}

impl PaymentEvent {
    pub fn new(topic: impl Into<String>, transaction_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            transaction_id: transaction_id.into(),
            payload,
        }
    }

    /// Serialize `payload` as JSON
    pub fn json<T: Serialize>(
        topic: impl Into<String>,
        transaction_id: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(topic, transaction_id, serde_json::to_vec(payload)?))
    }

    pub fn delivery_key(&self) -> String {
        delivery_key(&self.topic, &self.transaction_id)
    }
}

/// `{topic with '.' replaced by '_'}_{transaction_id}`.
///
/// Existing consumers match on this exact format.
pub fn delivery_key(topic: &str, transaction_id: &str) -> String {
    format!("{}_{}", topic.replace('.', "_"), transaction_id)
}
