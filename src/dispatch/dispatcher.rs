//! Event dispatcher
//!
//! Listener table keyed by event name. Registration happens while wiring the
//! application and rejects misconfiguration immediately; after that the
//! dispatcher is shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::DomainEvent;

use super::DispatchError;

/// A unit that reacts to domain events.
///
/// `events()` declares what the listener subscribes to; the dispatcher only
/// accepts registrations for declared events.
#[async_trait]
pub trait EventListener: Send + Sync {
    fn name(&self) -> &str;

    fn events(&self) -> &[&'static str];

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

/// In-process dispatcher with synchronous, failure-propagating delivery.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: HashMap<String, Vec<Arc<dyn EventListener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `listener` to `event_name`.
    pub fn register(
        &mut self,
        event_name: &str,
        listener: Arc<dyn EventListener>,
    ) -> Result<(), DispatchError> {
        if !is_valid_event_name(event_name) {
            return Err(DispatchError::InvalidEventName(event_name.to_string()));
        }

        if !listener.events().iter().any(|declared| *declared == event_name) {
            return Err(DispatchError::NotSubscribed {
                listener: listener.name().to_string(),
                event: event_name.to_string(),
            });
        }

        info!(
            listener = %listener.name(),
            event = %event_name,
            "Registered synchronous event listener"
        );
        self.listeners
            .entry(event_name.to_string())
            .or_default()
            .push(listener);

        Ok(())
    }

    /// Attach `listener` to every event it declares.
    pub fn register_listener(&mut self, listener: Arc<dyn EventListener>) -> Result<(), DispatchError> {
        let events: Vec<&'static str> = listener.events().to_vec();
        for event_name in events {
            self.register(event_name, Arc::clone(&listener))?;
        }
        Ok(())
    }

    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.get(event_name).map_or(0, Vec::len)
    }

    /// Run every listener for `event` in registration order.
    ///
    /// Each listener is awaited before the next one starts. The first failure
    /// stops the loop and is returned.
    pub async fn emit(&self, event: &DomainEvent) -> Result<(), DispatchError> {
        let event_name = event.name();
        let Some(listeners) = self.listeners.get(event_name) else {
            debug!(event = %event_name, "No listeners registered");
            return Ok(());
        };

        for listener in listeners {
            if let Err(source) = listener.handle(event).await {
                error!(
                    listener = %listener.name(),
                    event = %event_name,
                    transaction_id = %event.transaction_id(),
                    error = %source,
                    "Synchronous listener failed"
                );
                return Err(DispatchError::HandlerFailed {
                    listener: listener.name().to_string(),
                    event: event_name.to_string(),
                    source,
                });
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(event, listeners)| (event.as_str(), listeners.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("listeners", &summary)
            .finish()
    }
}

fn is_valid_event_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
