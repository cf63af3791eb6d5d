//! Broadcast channel for change notifications.
//!
//! Uses a tokio broadcast channel for in-process fan-out. Receivers that lag
//! behind lose messages; subscribers treat events as refresh hints, not as a
//! durable log.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Change events published after successful store mutations.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(tag = "type", content = "data")]
pub enum ChangeEvent {
    /// A purchase request's lifecycle status changed.
    RequestUpdated { request_id: String, status: String },
    /// A progress record's stage list changed.
    ProgressUpdated {
        progress_id: String,
        overall_progress: u8,
    },
    /// A production schedule's status changed.
    ScheduleUpdated {
        schedule_id: String,
        status: String,
    },
    /// An inspection decision was recorded for a SKU.
    InspectionRecorded { request_id: String, sku_id: String },
}

/// Type alias for the broadcast sender.
pub type BroadcastSender = broadcast::Sender<ChangeEvent>;

/// Type alias for the broadcast receiver.
pub type BroadcastReceiver = broadcast::Receiver<ChangeEvent>;

/// Create a new broadcast channel with default capacity.
pub fn create_broadcast_channel() -> BroadcastSender {
    let (tx, _rx) = broadcast::channel(100);
    tx
}
