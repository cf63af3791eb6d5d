//! Procflow Core Library
//!
//! Domain models and business logic for the procurement-to-shipment
//! workflow: request lifecycle, allocation, multi-stage progress tracking,
//! cross-module completion propagation, batch operations, inspection and
//! production scheduling.

pub mod allocation;
pub mod auth;
pub mod batch;
pub mod error;
pub mod export;
pub mod finance;
pub mod inspection;
pub mod progress;
pub mod propagator;
pub mod reminder;
pub mod request;
pub mod schedule;
pub mod watch;

#[cfg(test)]
pub(crate) mod testsupport;

pub use error::{FlowError, FlowResult};
