//! Domain module
//!
//! Core domain types shared by the ledger, the use cases and the listeners.

pub mod amount;
pub mod error;
pub mod events;
pub mod point;

pub use amount::{Amount, AmountError};
pub use error::DomainError;
pub use events::{DomainEvent, PointChangeReason, PAYMENT_COMPLETED, POINT_CHANGED};
pub use point::{HistoryEntry, NewPointHistory, PointHistory, PointRecord, INITIAL_VERSION};
