//! Purchase request domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One SKU line on a purchase request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub sku_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// A purchase request. Append-only history: status plus date fields, never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub id: String,
    pub requester: String,
    pub line_items: Vec<LineItem>,
    pub status: RequestStatus,
    pub reject_reason: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub first_approved_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub allocated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseRequest {
    /// SKU ids in line-item order.
    pub fn sku_ids(&self) -> Vec<&str> {
        self.line_items.iter().map(|l| l.sku_id.as_str()).collect()
    }

    /// Planned quantity for a SKU, if it is on this request.
    pub fn planned_quantity(&self, sku_id: &str) -> Option<u32> {
        self.line_items
            .iter()
            .find(|l| l.sku_id == sku_id)
            .map(|l| l.quantity)
    }
}

/// Request lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Submitted,
    FirstApproved,
    Approved,
    Rejected,
    Allocated,
    InProduction,
    QualityCheck,
    ReadyToShip,
    Shipped,
    Completed,
}

impl RequestStatus {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(Self::Submitted),
            "first_approved" => Some(Self::FirstApproved),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "allocated" => Some(Self::Allocated),
            "in_production" => Some(Self::InProduction),
            "quality_check" => Some(Self::QualityCheck),
            "ready_to_ship" => Some(Self::ReadyToShip),
            "shipped" => Some(Self::Shipped),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::FirstApproved => "first_approved",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Allocated => "allocated",
            Self::InProduction => "in_production",
            Self::QualityCheck => "quality_check",
            Self::ReadyToShip => "ready_to_ship",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
        }
    }

    /// Check if transition to another status is valid.
    pub fn can_transition_to(&self, to: &Self) -> bool {
        match (self, to) {
            // Two-tier approval; rejection possible at either gate
            (Self::Submitted, Self::FirstApproved) => true,
            (Self::Submitted, Self::Rejected) => true,
            (Self::FirstApproved, Self::Approved) => true,
            (Self::FirstApproved, Self::Rejected) => true,
            // Fulfillment pipeline, strictly forward
            (Self::Approved, Self::Allocated) => true,
            (Self::Allocated, Self::InProduction) => true,
            (Self::InProduction, Self::QualityCheck) => true,
            (Self::QualityCheck, Self::ReadyToShip) => true,
            (Self::ReadyToShip, Self::Shipped) => true,
            (Self::Shipped, Self::Completed) => true,
            // Same state is always valid
            (a, b) if a == b => true,
            _ => false,
        }
    }
}
