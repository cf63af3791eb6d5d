//! In-house inspection side-channel.
//!
//! Per-SKU pass/fail decisions with arrival quantities. The core consumes
//! the decision and quantity; photo attachments live outside this crate.

use chrono::{DateTime, Utc};
use procflow_store::{ChangeEvent, Store};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlowError, FlowResult};
use crate::propagator;
use crate::request;

pub(crate) const COLLECTION: &str = "inspections";

/// Per-SKU inspection outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionDecision {
    Pending,
    Pass,
    Fail,
}

impl InspectionDecision {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

/// One recorded inspection for a (request, SKU) pair. Overwrite semantics:
/// re-recording replaces the previous decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub request_id: String,
    pub sku_id: String,
    pub decision: InspectionDecision,
    pub arrival_quantity: Option<u32>,
    pub remarks: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

fn key(request_id: &str, sku_id: &str) -> String {
    format!("{request_id}:{sku_id}")
}

/// Record an inspection decision for one SKU. A pass triggers the
/// propagator: when every SKU of the request has passed, production
/// schedules are spawned and the procurement inspection-confirmation stage
/// completes.
pub fn record_decision(
    store: &Store,
    request_id: &str,
    sku_id: &str,
    decision: InspectionDecision,
    arrival_quantity: Option<u32>,
    remarks: Option<&str>,
) -> FlowResult<InspectionRecord> {
    let req = request::get_request(store, request_id)?;
    if req.planned_quantity(sku_id).is_none() {
        return Err(FlowError::validation(format!(
            "SKU '{sku_id}' is not on request {request_id}"
        )));
    }

    let record = InspectionRecord {
        request_id: request_id.to_string(),
        sku_id: sku_id.to_string(),
        decision,
        arrival_quantity,
        remarks: remarks.map(str::to_string),
        recorded_at: Utc::now(),
    };
    store.set(COLLECTION, &key(request_id, sku_id), serde_json::to_value(&record)?)?;
    store.publish(ChangeEvent::InspectionRecorded {
        request_id: request_id.to_string(),
        sku_id: sku_id.to_string(),
    });
    debug!(request_id, sku_id, decision = decision.as_str(), "inspection recorded");

    if decision == InspectionDecision::Pass {
        propagator::sync_inspection_outcome(store, request_id)?;
    }
    Ok(record)
}

/// The inspection record for one SKU, if any.
pub fn record_for_sku(
    store: &Store,
    request_id: &str,
    sku_id: &str,
) -> FlowResult<Option<InspectionRecord>> {
    match store.get(COLLECTION, &key(request_id, sku_id))? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// All inspection records for a request.
pub fn records_for_request(store: &Store, request_id: &str) -> FlowResult<Vec<InspectionRecord>> {
    let mut records = Vec::new();
    for value in store.list(COLLECTION)? {
        let record: InspectionRecord = serde_json::from_value(value)?;
        if record.request_id == request_id {
            records.push(record);
        }
    }
    Ok(records)
}

/// True when every SKU on the request has a recorded pass.
pub fn all_skus_passed(store: &Store, request_id: &str) -> FlowResult<bool> {
    let req = request::get_request(store, request_id)?;
    for sku in req.sku_ids() {
        match record_for_sku(store, request_id, sku)? {
            Some(record) if record.decision == InspectionDecision::Pass => {}
            _ => return Ok(false),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{allocated_request, line_item};

    #[test]
    fn test_record_and_overwrite() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);

        record_decision(&store, &req.id, "SKU-A", InspectionDecision::Fail, Some(8), Some("dents"))
            .unwrap();
        let record = record_for_sku(&store, &req.id, "SKU-A").unwrap().unwrap();
        assert_eq!(record.decision, InspectionDecision::Fail);

        record_decision(&store, &req.id, "SKU-A", InspectionDecision::Pass, Some(9), None).unwrap();
        let record = record_for_sku(&store, &req.id, "SKU-A").unwrap().unwrap();
        assert_eq!(record.decision, InspectionDecision::Pass);
        assert_eq!(record.arrival_quantity, Some(9));
        assert_eq!(records_for_request(&store, &req.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_sku_rejected() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        let err = record_decision(&store, &req.id, "SKU-X", InspectionDecision::Pass, None, None)
            .unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));
    }

    #[test]
    fn test_all_skus_passed() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10), line_item("SKU-B", 5)]);
        assert!(!all_skus_passed(&store, &req.id).unwrap());
        record_decision(&store, &req.id, "SKU-A", InspectionDecision::Pass, None, None).unwrap();
        assert!(!all_skus_passed(&store, &req.id).unwrap());
        record_decision(&store, &req.id, "SKU-B", InspectionDecision::Pass, None, None).unwrap();
        assert!(all_skus_passed(&store, &req.id).unwrap());
    }
}
