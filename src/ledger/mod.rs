//! Point Ledger module
//!
//! Optimistic-concurrency balance updates with a paired audit history.

mod protocol;
mod error;
mod memory;
mod postgres;
mod store;

pub use protocol::{PointLedger, POINT_ENTITY};
pub use error::LedgerError;
pub use memory::{MemoryPointStore, MemoryPointTransaction};
pub use postgres::{PgPointStore, PgPointTransaction};
pub use store::{LockMode, PointStore, PointTransaction, PointUpdate};
