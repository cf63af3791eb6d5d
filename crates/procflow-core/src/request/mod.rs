//! Purchase request lifecycle operations.

pub mod model;

use chrono::Utc;
use procflow_store::{ChangeEvent, Store};
use tracing::debug;
use uuid::Uuid;

use crate::error::{FlowError, FlowResult};
use model::{LineItem, PurchaseRequest, RequestStatus};

pub(crate) const COLLECTION: &str = "requests";

/// Submit a new purchase request.
pub fn create_request(
    store: &Store,
    requester: &str,
    line_items: Vec<LineItem>,
) -> FlowResult<PurchaseRequest> {
    if requester.trim().is_empty() {
        return Err(FlowError::validation("requester must not be empty"));
    }
    if line_items.is_empty() {
        return Err(FlowError::validation("a request needs at least one line item"));
    }
    for item in &line_items {
        if item.quantity == 0 {
            return Err(FlowError::validation(format!(
                "line item '{}' has zero quantity",
                item.sku_id
            )));
        }
    }

    let now = Utc::now();
    let request = PurchaseRequest {
        id: Uuid::new_v4().to_string(),
        requester: requester.to_string(),
        line_items,
        status: RequestStatus::Submitted,
        reject_reason: None,
        submitted_at: now,
        first_approved_at: None,
        approved_at: None,
        rejected_at: None,
        allocated_at: None,
        updated_at: now,
    };

    store.insert(COLLECTION, &request.id, serde_json::to_value(&request)?)?;
    store.publish(ChangeEvent::RequestUpdated {
        request_id: request.id.clone(),
        status: request.status.as_str().to_string(),
    });
    debug!(request_id = %request.id, "purchase request submitted");
    Ok(request)
}

/// Get a request by id.
pub fn get_request(store: &Store, id: &str) -> FlowResult<PurchaseRequest> {
    let value = store
        .get(COLLECTION, id)?
        .ok_or_else(|| FlowError::RequestNotFound(id.to_string()))?;
    Ok(serde_json::from_value(value)?)
}

/// List all requests, in submission order.
pub fn list_requests(store: &Store) -> FlowResult<Vec<PurchaseRequest>> {
    store
        .list(COLLECTION)?
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(FlowError::from))
        .collect()
}

/// First-tier (department) approval.
pub fn approve_first(store: &Store, id: &str) -> FlowResult<PurchaseRequest> {
    transition(store, id, RequestStatus::FirstApproved, |r, now| {
        r.first_approved_at = Some(now);
    })
}

/// Second-tier (general manager) approval.
pub fn approve_final(store: &Store, id: &str) -> FlowResult<PurchaseRequest> {
    transition(store, id, RequestStatus::Approved, |r, now| {
        r.approved_at = Some(now);
    })
}

/// Reject at either approval gate.
pub fn reject(store: &Store, id: &str, reason: Option<&str>) -> FlowResult<PurchaseRequest> {
    let reason = reason.map(str::to_string);
    transition(store, id, RequestStatus::Rejected, move |r, now| {
        r.rejected_at = Some(now);
        r.reject_reason = reason.clone();
    })
}

/// Advance a request through the downstream fulfillment statuses
/// (in_production, quality_check, ready_to_ship, shipped, completed).
pub fn advance_status(store: &Store, id: &str, target: RequestStatus) -> FlowResult<PurchaseRequest> {
    transition(store, id, target, |_, _| {})
}

pub(crate) fn save(store: &Store, request: &PurchaseRequest) -> FlowResult<()> {
    store.set(COLLECTION, &request.id, serde_json::to_value(request)?)?;
    store.publish(ChangeEvent::RequestUpdated {
        request_id: request.id.clone(),
        status: request.status.as_str().to_string(),
    });
    Ok(())
}

fn transition(
    store: &Store,
    id: &str,
    target: RequestStatus,
    stamp: impl Fn(&mut PurchaseRequest, chrono::DateTime<Utc>),
) -> FlowResult<PurchaseRequest> {
    let mut request = get_request(store, id)?;
    if !request.status.can_transition_to(&target) {
        return Err(FlowError::InvalidStateTransition {
            from: request.status.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }
    let now = Utc::now();
    request.status = target;
    request.updated_at = now;
    stamp(&mut request, now);
    save(store, &request)?;
    debug!(request_id = %id, status = target.as_str(), "request status changed");
    Ok(request)
}
