//! point-ledger Library
//!
//! Per-user point balances under optimistic concurrency, synchronous domain
//! events, and best-effort payment notifications.

pub mod app;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod domain;
pub mod jobs;
pub mod ledger;
pub mod producer;
pub mod service;
pub mod telemetry;

mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{Amount, DomainError, DomainEvent, HistoryEntry, PointHistory, PointRecord};
pub use ledger::{LedgerError, LockMode, PointLedger};
