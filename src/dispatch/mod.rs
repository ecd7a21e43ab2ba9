//! Synchronous event dispatch
//!
//! Domain events are extension points of the operation that raised them:
//! listeners run in-line, in registration order, and the first failure is
//! returned to the emitter instead of being logged and dropped.

mod dispatcher;
mod error;

pub use dispatcher::{EventDispatcher, EventListener};
pub use error::DispatchError;
