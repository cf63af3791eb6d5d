//! Production schedules.
//!
//! A separate lifecycle from the stage checklists: created manually or by
//! the propagator once in-house inspection passes for every SKU of a
//! request. Carries its own narrow state machine, including the one
//! administrative backward move: "return" from scheduled to pending.

use chrono::{DateTime, Utc};
use procflow_store::{ChangeEvent, Store, StoreError};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{FlowError, FlowResult};
use crate::request;

pub(crate) const COLLECTION: &str = "schedules";

/// Production schedule lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Pending,
    Scheduled,
    InProduction,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "scheduled" => Some(Self::Scheduled),
            "in_production" => Some(Self::InProduction),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::InProduction => "in_production",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Forward transitions only; the scheduled → pending return is a
    /// separate administrative action, not part of this table.
    pub fn can_transition_to(&self, to: &Self) -> bool {
        match (self, to) {
            (Self::Pending, Self::Scheduled) => true,
            (Self::Pending, Self::Cancelled) => true,
            (Self::Scheduled, Self::InProduction) => true,
            (Self::Scheduled, Self::Cancelled) => true,
            (Self::InProduction, Self::Completed) => true,
            (a, b) if a == b => true,
            _ => false,
        }
    }
}

/// One production schedule row, keyed by (request, SKU).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionSchedule {
    pub id: String,
    pub request_id: String,
    pub sku_id: String,
    pub quantity: u32,
    pub status: ScheduleStatus,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn key(request_id: &str, sku_id: &str) -> String {
    format!("{request_id}:{sku_id}")
}

/// Create a schedule row manually.
pub fn create_schedule(
    store: &Store,
    request_id: &str,
    sku_id: &str,
    quantity: u32,
) -> FlowResult<ProductionSchedule> {
    let req = request::get_request(store, request_id)?;
    if req.planned_quantity(sku_id).is_none() {
        return Err(FlowError::validation(format!(
            "SKU '{sku_id}' is not on request {request_id}"
        )));
    }
    insert(store, request_id, sku_id, quantity)
}

/// Create a schedule row from propagation. The caller has already resolved
/// the quantity (arrival quantity, falling back to planned).
pub(crate) fn create_auto(
    store: &Store,
    request_id: &str,
    sku_id: &str,
    quantity: u32,
) -> FlowResult<ProductionSchedule> {
    insert(store, request_id, sku_id, quantity)
}

fn insert(
    store: &Store,
    request_id: &str,
    sku_id: &str,
    quantity: u32,
) -> FlowResult<ProductionSchedule> {
    let now = Utc::now();
    let schedule = ProductionSchedule {
        id: Uuid::new_v4().to_string(),
        request_id: request_id.to_string(),
        sku_id: sku_id.to_string(),
        quantity,
        status: ScheduleStatus::Pending,
        remarks: None,
        created_at: now,
        updated_at: now,
    };
    let storage_key = key(request_id, sku_id);
    store
        .insert(COLLECTION, &storage_key, serde_json::to_value(&schedule)?)
        .map_err(|e| match e {
            StoreError::DuplicateKey { .. } => FlowError::DuplicateSchedule(storage_key.clone()),
            other => FlowError::Store(other),
        })?;
    store.publish(ChangeEvent::ScheduleUpdated {
        schedule_id: schedule.id.clone(),
        status: schedule.status.as_str().to_string(),
    });
    debug!(request_id, sku_id, quantity, "production schedule created");
    Ok(schedule)
}

/// Whether a schedule row exists for (request, SKU).
pub fn schedule_exists(store: &Store, request_id: &str, sku_id: &str) -> FlowResult<bool> {
    store
        .contains(COLLECTION, &key(request_id, sku_id))
        .map_err(FlowError::from)
}

/// Get one schedule row.
pub fn get_schedule(store: &Store, request_id: &str, sku_id: &str) -> FlowResult<ProductionSchedule> {
    let value = store
        .get(COLLECTION, &key(request_id, sku_id))?
        .ok_or_else(|| FlowError::ScheduleNotFound(key(request_id, sku_id)))?;
    Ok(serde_json::from_value(value)?)
}

/// List schedules, optionally for one request, in creation order.
pub fn list_schedules(store: &Store, request_id: Option<&str>) -> FlowResult<Vec<ProductionSchedule>> {
    let mut rows = Vec::new();
    for value in store.list(COLLECTION)? {
        let row: ProductionSchedule = serde_json::from_value(value)?;
        if request_id.is_none() || request_id == Some(row.request_id.as_str()) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Move a schedule forward through its lifecycle.
pub fn set_status(
    store: &Store,
    request_id: &str,
    sku_id: &str,
    target: ScheduleStatus,
) -> FlowResult<ProductionSchedule> {
    let mut schedule = get_schedule(store, request_id, sku_id)?;
    if !schedule.status.can_transition_to(&target) {
        return Err(FlowError::InvalidStateTransition {
            from: schedule.status.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }
    save_status(store, &mut schedule, target)?;
    Ok(schedule)
}

/// Administrative "return" action: scheduled back to pending, and nothing
/// else. Available only while the status is exactly scheduled.
pub fn return_to_pending(
    store: &Store,
    request_id: &str,
    sku_id: &str,
) -> FlowResult<ProductionSchedule> {
    let mut schedule = get_schedule(store, request_id, sku_id)?;
    if schedule.status != ScheduleStatus::Scheduled {
        return Err(FlowError::InvalidStateTransition {
            from: schedule.status.as_str().to_string(),
            to: ScheduleStatus::Pending.as_str().to_string(),
        });
    }
    save_status(store, &mut schedule, ScheduleStatus::Pending)?;
    debug!(request_id, sku_id, "schedule returned to pending");
    Ok(schedule)
}

fn save_status(
    store: &Store,
    schedule: &mut ProductionSchedule,
    target: ScheduleStatus,
) -> FlowResult<()> {
    schedule.status = target;
    schedule.updated_at = Utc::now();
    store.set(
        COLLECTION,
        &key(&schedule.request_id, &schedule.sku_id),
        serde_json::to_value(&*schedule)?,
    )?;
    store.publish(ChangeEvent::ScheduleUpdated {
        schedule_id: schedule.id.clone(),
        status: target.as_str().to_string(),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{allocated_request, line_item};

    #[test]
    fn test_manual_create_and_forward_lifecycle() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        let schedule = create_schedule(&store, &req.id, "SKU-A", 10).unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Pending);

        set_status(&store, &req.id, "SKU-A", ScheduleStatus::Scheduled).unwrap();
        set_status(&store, &req.id, "SKU-A", ScheduleStatus::InProduction).unwrap();
        let schedule = set_status(&store, &req.id, "SKU-A", ScheduleStatus::Completed).unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Completed);
    }

    #[test]
    fn test_duplicate_rejected() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        create_schedule(&store, &req.id, "SKU-A", 10).unwrap();
        let err = create_schedule(&store, &req.id, "SKU-A", 10).unwrap_err();
        assert!(matches!(err, FlowError::DuplicateSchedule(_)));
    }

    #[test]
    fn test_return_only_from_scheduled() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        create_schedule(&store, &req.id, "SKU-A", 10).unwrap();

        // pending cannot be returned
        let err = return_to_pending(&store, &req.id, "SKU-A").unwrap_err();
        assert!(matches!(err, FlowError::InvalidStateTransition { .. }));

        set_status(&store, &req.id, "SKU-A", ScheduleStatus::Scheduled).unwrap();
        let schedule = return_to_pending(&store, &req.id, "SKU-A").unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Pending);

        // in_production cannot be returned either
        set_status(&store, &req.id, "SKU-A", ScheduleStatus::Scheduled).unwrap();
        set_status(&store, &req.id, "SKU-A", ScheduleStatus::InProduction).unwrap();
        let err = return_to_pending(&store, &req.id, "SKU-A").unwrap_err();
        assert!(matches!(err, FlowError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_no_skipping_forward() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        create_schedule(&store, &req.id, "SKU-A", 10).unwrap();
        let err = set_status(&store, &req.id, "SKU-A", ScheduleStatus::Completed).unwrap_err();
        assert!(matches!(err, FlowError::InvalidStateTransition { .. }));
    }
}
