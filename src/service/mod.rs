//! Point use cases
//!
//! Commands and the service that drives the ledger and raises domain events.

mod commands;
mod point_service;

pub use commands::*;
pub use point_service::PointService;
