//! Reminder side-channel: payment nudges and card-delivery requests.
//!
//! Fire-and-forget facts with overwrite semantics: the latest nudge wins,
//! no acknowledgement is modeled.

use chrono::{DateTime, Utc};
use procflow_store::Store;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlowError, FlowResult};
use crate::finance::PaymentKind;
use crate::progress::{self, model::ProgressFlavor, model::StageStatus, stages::ProcurementStage};
use crate::request;

pub(crate) const COLLECTION: &str = "reminders";

/// What the reminder asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DepositPayment,
    FinalPayment,
    CardDelivery,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepositPayment => "deposit_payment",
            Self::FinalPayment => "final_payment",
            Self::CardDelivery => "card_delivery",
        }
    }
}

impl From<PaymentKind> for ReminderKind {
    fn from(kind: PaymentKind) -> Self {
        match kind {
            PaymentKind::Deposit => Self::DepositPayment,
            PaymentKind::Final => Self::FinalPayment,
        }
    }
}

/// A recorded reminder for (request, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub request_id: String,
    pub kind: ReminderKind,
    pub requested_at: DateTime<Utc>,
}

fn key(request_id: &str, kind: ReminderKind) -> String {
    format!("{}:{}", request_id, kind.as_str())
}

/// Nudge finance about a payment. A deposit stage created `no_requirement`
/// is excluded from nudge eligibility.
pub fn add_payment_reminder(
    store: &Store,
    request_id: &str,
    kind: PaymentKind,
) -> FlowResult<Reminder> {
    let procurement =
        progress::get_progress(store, ProgressFlavor::Procurement, request_id, None)?;
    let stage_key = match kind {
        PaymentKind::Deposit => ProcurementStage::DepositPayment,
        PaymentKind::Final => ProcurementStage::FinalPayment,
    };
    if let Some(index) = procurement.stage_index(stage_key.as_str()) {
        if procurement.stages[index].status == StageStatus::NoRequirement {
            return Err(FlowError::validation(format!(
                "no {} payment is required for request {request_id}",
                kind.as_str()
            )));
        }
    }
    record(store, request_id, kind.into())
}

/// Ask the card designer to deliver the cards.
pub fn request_card_delivery(store: &Store, request_id: &str) -> FlowResult<Reminder> {
    request::get_request(store, request_id)?;
    record(store, request_id, ReminderKind::CardDelivery)
}

/// Latest reminder time for (request, kind), if any.
pub fn reminder_time(
    store: &Store,
    request_id: &str,
    kind: ReminderKind,
) -> FlowResult<Option<DateTime<Utc>>> {
    match store.get(COLLECTION, &key(request_id, kind))? {
        Some(value) => {
            let reminder: Reminder = serde_json::from_value(value)?;
            Ok(Some(reminder.requested_at))
        }
        None => Ok(None),
    }
}

fn record(store: &Store, request_id: &str, kind: ReminderKind) -> FlowResult<Reminder> {
    let reminder = Reminder {
        request_id: request_id.to_string(),
        kind,
        requested_at: Utc::now(),
    };
    store.set(COLLECTION, &key(request_id, kind), serde_json::to_value(&reminder)?)?;
    debug!(request_id, kind = kind.as_str(), "reminder recorded");
    Ok(reminder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation;
    use crate::testsupport::{allocated_request, approved_request, default_allocation_input, line_item};

    #[test]
    fn test_payment_reminder_overwrites() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);

        let first = add_payment_reminder(&store, &req.id, PaymentKind::Deposit).unwrap();
        let second = add_payment_reminder(&store, &req.id, PaymentKind::Deposit).unwrap();
        let stored = reminder_time(&store, &req.id, ReminderKind::DepositPayment)
            .unwrap()
            .unwrap();
        assert_eq!(stored, second.requested_at);
        assert!(stored >= first.requested_at);
    }

    #[test]
    fn test_no_requirement_deposit_is_not_nudgeable() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        let mut input = default_allocation_input();
        input.prepayment_amount = 0.0;
        allocation::allocate(&store, &req.id, input).unwrap();

        let err = add_payment_reminder(&store, &req.id, PaymentKind::Deposit).unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));
        // the final payment is still nudgeable
        add_payment_reminder(&store, &req.id, PaymentKind::Final).unwrap();
    }

    #[test]
    fn test_card_delivery_reminder() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        request_card_delivery(&store, &req.id).unwrap();
        assert!(reminder_time(&store, &req.id, ReminderKind::CardDelivery)
            .unwrap()
            .is_some());
    }
}
