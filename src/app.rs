//! Application wiring
//!
//! Builds the ledger, dispatcher and payment producer from configuration.
//! Listener registration runs here so misconfiguration stops startup.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::dispatch::EventDispatcher;
use crate::error::AppResult;
use crate::ledger::{PgPointStore, PointLedger};
use crate::producer::{MessageTransport, PaymentNotificationListener, PaymentProducer};
use crate::service::PointService;

/// Broker client selected at compile time
#[cfg(feature = "kafka")]
pub fn build_transport(config: &Config) -> AppResult<Arc<dyn MessageTransport>> {
    use crate::producer::{KafkaTransport, KafkaTransportConfig};

    let transport = KafkaTransport::new(&KafkaTransportConfig {
        brokers: config.kafka_brokers.clone(),
        client_id: config.kafka_client_id.clone(),
    })
    .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;

    Ok(Arc::new(transport))
}

/// Broker client selected at compile time
#[cfg(not(feature = "kafka"))]
pub fn build_transport(config: &Config) -> AppResult<Arc<dyn MessageTransport>> {
    tracing::warn!(
        brokers = %config.kafka_brokers,
        "Built without the `kafka` feature, payment events will not leave the process"
    );
    Ok(Arc::new(crate::producer::NullTransport))
}

/// Dispatcher with every in-process listener registered
pub fn build_dispatcher(producer: Arc<PaymentProducer>) -> AppResult<EventDispatcher> {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register_listener(Arc::new(PaymentNotificationListener::new(producer)))?;
    Ok(dispatcher)
}

/// Point service over Postgres
pub fn build_point_service(
    pool: PgPool,
    transport: Arc<dyn MessageTransport>,
) -> AppResult<PointService<PgPointStore>> {
    let producer = Arc::new(PaymentProducer::new(transport));
    let dispatcher = build_dispatcher(producer)?;

    Ok(PointService::new(
        PointLedger::new(PgPointStore::new(pool)),
        Arc::new(dispatcher),
    ))
}
