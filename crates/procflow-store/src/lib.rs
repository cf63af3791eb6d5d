//! Procflow keyed store.
//!
//! In-process keyed collections with get/set/subscribe semantics and an
//! optional JSON snapshot on disk. The domain layer (procflow-core) talks to
//! the pipeline exclusively through this crate.

pub mod broadcast;
pub mod error;
mod store;

pub use broadcast::{create_broadcast_channel, BroadcastReceiver, BroadcastSender, ChangeEvent};
pub use error::{StoreError, StoreResult};
pub use store::Store;
