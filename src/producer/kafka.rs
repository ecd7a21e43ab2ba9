//! Kafka transport.
//!
//! Records go to the event's topic unchanged, keyed by the delivery key and
//! pinned to the partition carried on the record.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use tracing::{debug, info};

use super::{MessageTransport, OutboundRecord, TransportError};

/// Kafka connection settings
#[derive(Debug, Clone)]
pub struct KafkaTransportConfig {
    /// Bootstrap servers (comma-separated)
    pub brokers: String,
    pub client_id: String,
}

impl KafkaTransportConfig {
    fn build_producer_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.brokers);
        config.set("client.id", &self.client_id);
        config.set("message.timeout.ms", "5000");
        config.set("acks", "all");
        config
    }
}

pub struct KafkaTransport {
    producer: FutureProducer,
}

impl KafkaTransport {
    pub fn new(config: &KafkaTransportConfig) -> Result<Self, TransportError> {
        let producer: FutureProducer = config.build_producer_config().create().map_err(|e| {
            TransportError::Connection(format!("Failed to create Kafka producer: {}", e))
        })?;

        info!(brokers = %config.brokers, client_id = %config.client_id, "Kafka producer created");

        Ok(Self { producer })
    }
}

#[async_trait]
impl MessageTransport for KafkaTransport {
    async fn submit(&self, record: &OutboundRecord) -> Result<(), TransportError> {
        let kafka_record = FutureRecord::to(&record.topic)
            .key(&record.key)
            .payload(&record.payload)
            .partition(record.partition);

        let (partition, offset) = self
            .producer
            .send(kafka_record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| TransportError::Submit(e.to_string()))?;

        debug!(
            topic = %record.topic,
            key = %record.key,
            partition,
            offset,
            "Record acknowledged by Kafka"
        );

        Ok(())
    }
}
