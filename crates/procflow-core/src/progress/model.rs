//! Progress domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::stages::StageKind;

/// Which functional area a progress record tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressFlavor {
    Procurement,
    Card,
    Accessory,
}

impl ProgressFlavor {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "procurement" => Some(Self::Procurement),
            "card" => Some(Self::Card),
            "accessory" => Some(Self::Accessory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procurement => "procurement",
            Self::Card => "card",
            Self::Accessory => "accessory",
        }
    }
}

/// Status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    NotStarted,
    InProgress,
    Completed,
    Skipped,
    /// Permanent skip decided at creation time. Never leaves this status.
    NoRequirement,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::NoRequirement => "no_requirement",
        }
    }

    /// Counts as done for predecessor gating and percentage purposes.
    pub fn satisfies_gate(&self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::NoRequirement)
    }
}

/// One stage instance on a progress record. The kind is copied from the
/// definition table at creation so the engine can stay table-agnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageInstance {
    pub key: String,
    pub label: String,
    pub kind: StageKind,
    pub status: StageStatus,
    pub completed_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

/// Per-request (or per-request-per-SKU) stage checklist for one flavor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub id: String,
    pub request_id: String,
    pub sku_id: Option<String>,
    pub flavor: ProgressFlavor,
    pub stages: Vec<StageInstance>,
    /// Derived percentage, recomputed on every stage mutation.
    pub overall_progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    /// Store key: flavor + request + optional SKU.
    pub fn storage_key(&self) -> String {
        progress_key(self.flavor, &self.request_id, self.sku_id.as_deref())
    }

    pub fn stage_index(&self, key: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.key == key)
    }

    pub fn is_complete(&self) -> bool {
        self.overall_progress == 100
    }
}

/// Build the storage key for a progress record.
pub fn progress_key(flavor: ProgressFlavor, request_id: &str, sku_id: Option<&str>) -> String {
    match sku_id {
        Some(sku) => format!("{}:{}:{}", flavor.as_str(), request_id, sku),
        None => format!("{}:{}", flavor.as_str(), request_id),
    }
}
