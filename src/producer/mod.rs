//! Resilient payment event producer
//!
//! Announces payment facts on an external message bus with bounded retry
//! and per-attempt timeout. Delivery failures are reported, never raised.

mod event;
#[cfg(feature = "kafka")]
mod kafka;
mod listener;
mod payment;
mod recording;
mod reporter;
mod retry;
mod transport;

pub use event::{delivery_key, PaymentEvent, PAYMENT_SUCCESS_TOPIC};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaTransport, KafkaTransportConfig};
pub use listener::PaymentNotificationListener;
pub use payment::PaymentProducer;
pub use recording::{NullTransport, RecordingTransport, SubmitOutcome};
pub use reporter::{DeliveryFailure, FailureReporter, TracingFailureReporter};
pub use retry::{retry_submit, RetryExhausted, RetryPolicy};
pub use transport::{MessageTransport, OutboundRecord, TransportError, PAYMENT_PARTITION};
