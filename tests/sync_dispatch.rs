//! Synchronous, failure-propagating event dispatch

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use point_ledger::dispatch::{DispatchError, EventDispatcher, EventListener};
use point_ledger::domain::{DomainEvent, PointChangeReason, PAYMENT_COMPLETED, POINT_CHANGED};
use point_ledger::ledger::{LockMode, MemoryPointStore, PointLedger};
use point_ledger::producer::{PaymentNotificationListener, PaymentProducer, RecordingTransport};
use point_ledger::service::{ChargePointCommand, PayWithPointCommand, PointService};
use point_ledger::AppError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

type CallLog = Arc<Mutex<Vec<String>>>;

struct RecordingListener {
    name: &'static str,
    fail: bool,
    calls: CallLog,
}

impl RecordingListener {
    fn new(name: &'static str, fail: bool, calls: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail,
            calls: Arc::clone(calls),
        })
    }
}

#[async_trait]
impl EventListener for RecordingListener {
    fn name(&self) -> &str {
        self.name
    }

    fn events(&self) -> &[&'static str] {
        &[POINT_CHANGED, PAYMENT_COMPLETED]
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        // yield so a non-awaiting dispatcher would be caught out
        tokio::task::yield_now().await;
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, event.name()));

        if self.fail {
            anyhow::bail!("{} rejected the event", self.name);
        }
        Ok(())
    }
}

fn point_changed() -> DomainEvent {
    DomainEvent::PointChanged {
        point_id: 1,
        previous_amount: Decimal::ZERO,
        amount: dec!(10),
        version: 2,
        reason: PointChangeReason::Charge,
        transaction_id: "TX1".to_string(),
        changed_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_first_failure_stops_later_listeners() {
    let calls = CallLog::default();
    let mut dispatcher = EventDispatcher::new();
    dispatcher
        .register(POINT_CHANGED, RecordingListener::new("first", true, &calls))
        .unwrap();
    dispatcher
        .register(POINT_CHANGED, RecordingListener::new("second", false, &calls))
        .unwrap();

    let err = dispatcher.emit(&point_changed()).await.unwrap_err();

    match err {
        DispatchError::HandlerFailed { listener, event, source } => {
            assert_eq!(listener, "first");
            assert_eq!(event, POINT_CHANGED);
            assert!(source.to_string().contains("first rejected"));
        }
        other => panic!("expected HandlerFailed, got {:?}", other),
    }
    assert_eq!(*calls.lock().unwrap(), vec!["first:point.changed".to_string()]);
}

#[tokio::test]
async fn test_listeners_run_in_registration_order() {
    let calls = CallLog::default();
    let mut dispatcher = EventDispatcher::new();
    for name in ["a", "b", "c"] {
        dispatcher
            .register(POINT_CHANGED, RecordingListener::new(name, false, &calls))
            .unwrap();
    }

    dispatcher.emit(&point_changed()).await.unwrap();

    assert_eq!(
        *calls.lock().unwrap(),
        vec!["a:point.changed", "b:point.changed", "c:point.changed"]
    );
}

#[tokio::test]
async fn test_emit_without_listeners_is_ok() {
    let dispatcher = EventDispatcher::new();
    assert!(dispatcher.emit(&point_changed()).await.is_ok());
}

#[tokio::test]
async fn test_listener_failure_fails_the_use_case() {
    let calls = CallLog::default();
    let mut dispatcher = EventDispatcher::new();
    dispatcher
        .register(POINT_CHANGED, RecordingListener::new("guard", true, &calls))
        .unwrap();

    let service = PointService::new(
        PointLedger::new(MemoryPointStore::new()),
        Arc::new(dispatcher),
    );
    let point = service.ledger().open_account(None).await.unwrap();

    let err = service
        .charge(ChargePointCommand::new(point.id, "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Dispatch(DispatchError::HandlerFailed { .. })));
    assert!(!err.is_retryable());

    // the ledger change itself committed before the event was raised
    let current = service.ledger().get_balance(point.id, LockMode::None).await.unwrap();
    assert_eq!(current.amount, dec!(10));
}

#[tokio::test]
async fn test_pay_publishes_payment_fact_in_line() {
    let transport = Arc::new(RecordingTransport::new());
    let producer = Arc::new(PaymentProducer::new(transport.clone()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher
        .register_listener(Arc::new(PaymentNotificationListener::new(producer)))
        .unwrap();

    let service = PointService::new(
        PointLedger::new(MemoryPointStore::new()),
        Arc::new(dispatcher),
    );
    let point = service.ledger().open_account(Some(5)).await.unwrap();
    service
        .charge(ChargePointCommand::new(point.id, "50"))
        .await
        .unwrap();

    service
        .pay(
            PayWithPointCommand::new(point.id, "20", "ORDER-9")
                .with_payload(serde_json::json!({ "orderId": 9 })),
        )
        .await
        .unwrap();

    // pay returned only after the listener handed the record to the transport
    let attempts = transport.attempts().await;
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].key, "payment_success_ORDER-9");
}

#[tokio::test]
async fn test_delivery_failure_does_not_fail_payment() {
    let transport = Arc::new(RecordingTransport::always_failing());
    let producer = Arc::new(PaymentProducer::new(transport.clone()));

    let mut dispatcher = EventDispatcher::new();
    dispatcher
        .register_listener(Arc::new(PaymentNotificationListener::new(producer)))
        .unwrap();

    let service = PointService::new(
        PointLedger::new(MemoryPointStore::new()),
        Arc::new(dispatcher),
    );
    let point = service.ledger().open_account(None).await.unwrap();
    service
        .charge(ChargePointCommand::new(point.id, "5"))
        .await
        .unwrap();

    let result = service
        .pay(PayWithPointCommand::new(point.id, "5", "ORDER-1"))
        .await
        .unwrap();

    assert_eq!(result.amount, Decimal::ZERO);
    assert_eq!(transport.attempt_count().await, 4);
}
