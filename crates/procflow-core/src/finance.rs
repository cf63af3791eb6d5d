//! Finance side-channel: payment confirmations.
//!
//! Confirmations are facts recorded by the finance role. The corresponding
//! procurement payment stage is system-linked and only ever completed by
//! propagation from here (immediately when reachable, otherwise on a later
//! sweep).

use chrono::{DateTime, Utc};
use procflow_store::Store;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlowError, FlowResult};
use crate::propagator;

pub(crate) const COLLECTION: &str = "payment_confirmations";

/// Which payment a confirmation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Deposit,
    Final,
}

impl PaymentKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "final" => Some(Self::Final),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Final => "final",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Deposit => "定金",
            Self::Final => "尾款",
        }
    }
}

/// A recorded payment confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub request_id: String,
    pub kind: PaymentKind,
    pub confirmed_at: DateTime<Utc>,
}

fn key(request_id: &str, kind: PaymentKind) -> String {
    format!("{}:{}", request_id, kind.as_str())
}

/// Record a payment confirmation (overwrite semantics) and propagate it to
/// the procurement progress. Returns true when the stage was completed now;
/// false when it was already done or not yet reachable.
pub fn confirm_payment(store: &Store, request_id: &str, kind: PaymentKind) -> FlowResult<bool> {
    crate::request::get_request(store, request_id)?;
    let confirmation = PaymentConfirmation {
        request_id: request_id.to_string(),
        kind,
        confirmed_at: Utc::now(),
    };
    store.set(COLLECTION, &key(request_id, kind), serde_json::to_value(&confirmation)?)?;
    debug!(request_id, kind = kind.as_str(), "payment confirmed");
    propagator::apply_payment_confirmation(store, request_id, kind)
}

/// Whether a payment of this kind has been confirmed.
pub fn is_payment_confirmed(store: &Store, request_id: &str, kind: PaymentKind) -> FlowResult<bool> {
    store
        .contains(COLLECTION, &key(request_id, kind))
        .map_err(FlowError::from)
}

/// When the payment was confirmed, if it was.
pub fn confirmation_time(
    store: &Store,
    request_id: &str,
    kind: PaymentKind,
) -> FlowResult<Option<DateTime<Utc>>> {
    match store.get(COLLECTION, &key(request_id, kind))? {
        Some(value) => {
            let confirmation: PaymentConfirmation = serde_json::from_value(value)?;
            Ok(Some(confirmation.confirmed_at))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation;
    use crate::progress::{self, model::ProgressFlavor, model::StageStatus, stages::ProcurementStage};
    use crate::testsupport::{approved_request, default_allocation_input, line_item};

    #[test]
    fn test_deposit_confirmation_completes_stage_zero() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        allocation::allocate(&store, &req.id, default_allocation_input()).unwrap();

        assert!(confirm_payment(&store, &req.id, PaymentKind::Deposit).unwrap());
        let p = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None).unwrap();
        assert_eq!(p.stages[0].status, StageStatus::Completed);
        // confirming again is a no-op
        assert!(!confirm_payment(&store, &req.id, PaymentKind::Deposit).unwrap());
        assert!(is_payment_confirmed(&store, &req.id, PaymentKind::Deposit).unwrap());
    }

    #[test]
    fn test_final_payment_defers_until_reachable() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        allocation::allocate(&store, &req.id, default_allocation_input()).unwrap();

        // final_payment sits behind several unfinished stages
        assert!(!confirm_payment(&store, &req.id, PaymentKind::Final).unwrap());
        let p = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None).unwrap();
        let idx = p.stage_index(ProcurementStage::FinalPayment.as_str()).unwrap();
        assert_eq!(p.stages[idx].status, StageStatus::NotStarted);
        // but the confirmation fact is recorded for a later sweep
        assert!(is_payment_confirmed(&store, &req.id, PaymentKind::Final).unwrap());
    }

    #[test]
    fn test_confirm_unknown_request() {
        let store = Store::in_memory();
        assert!(matches!(
            confirm_payment(&store, "nope", PaymentKind::Deposit),
            Err(FlowError::RequestNotFound(_))
        ));
    }
}
