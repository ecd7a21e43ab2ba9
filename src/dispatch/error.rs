//! Dispatch errors

/// Errors raised while registering or invoking listeners
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Event names are dot-separated segments of `[A-Za-z0-9_]`
    #[error("Invalid event name: '{0}'")]
    InvalidEventName(String),

    /// Listener was registered for an event it does not declare
    #[error("Listener '{listener}' does not declare event '{event}'")]
    NotSubscribed { listener: String, event: String },

    /// A listener failed while handling an emitted event
    #[error("Listener '{listener}' failed handling '{event}': {source}")]
    HandlerFailed {
        listener: String,
        event: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Registration errors are configuration mistakes caught at startup
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidEventName(_) | DispatchError::NotSubscribed { .. }
        )
    }
}
