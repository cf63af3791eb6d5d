//! Order allocation: the once-per-request packaging/terms decision that
//! spawns the progress records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use procflow_store::Store;
use tracing::debug;

use crate::error::{FlowError, FlowResult};
use crate::progress::{self, ProcurementSeed};
use crate::request::{self, model::RequestStatus};

pub(crate) const COLLECTION: &str = "allocations";

/// Who packages the goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackagingType {
    External,
    InHouse,
}

impl PackagingType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "external" => Some(Self::External),
            "in_house" => Some(Self::InHouse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::InHouse => "in_house",
        }
    }
}

/// Commercial payment terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    WireTransfer,
    CreditTerms,
}

impl PaymentMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wire_transfer" => Some(Self::WireTransfer),
            "credit_terms" => Some(Self::CreditTerms),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WireTransfer => "wire_transfer",
            Self::CreditTerms => "credit_terms",
        }
    }
}

/// Card material decided at allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    ColorCard,
    HangTag,
    InsertCard,
}

impl CardType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "color_card" => Some(Self::ColorCard),
            "hang_tag" => Some(Self::HangTag),
            "insert_card" => Some(Self::InsertCard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColorCard => "color_card",
            Self::HangTag => "hang_tag",
            Self::InsertCard => "insert_card",
        }
    }
}

/// Allocation decision input.
#[derive(Debug, Clone)]
pub struct AllocationInput {
    pub packaging: PackagingType,
    pub payment_method: PaymentMethod,
    pub prepayment_amount: f64,
    pub card_type: Option<CardType>,
    pub needs_accessories: bool,
    pub production_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
}

/// The stored allocation, 1:1 with an approved request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAllocation {
    pub request_id: String,
    pub packaging: PackagingType,
    pub payment_method: PaymentMethod,
    pub prepayment_amount: f64,
    pub card_type: Option<CardType>,
    pub needs_accessories: bool,
    pub production_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub allocated_at: DateTime<Utc>,
}

impl OrderAllocation {
    /// Deposit stage is waived for zero prepayment or credit terms.
    pub fn deposit_required(&self) -> bool {
        self.prepayment_amount > 0.0 && self.payment_method != PaymentMethod::CreditTerms
    }
}

/// Allocate an approved request. Creates the allocation exactly once and
/// spawns the progress records it implies: procurement progress for the
/// request, card progress per SKU when a card type is set, accessory
/// progress per SKU when accessories are needed.
pub fn allocate(
    store: &Store,
    request_id: &str,
    input: AllocationInput,
) -> FlowResult<OrderAllocation> {
    let mut req = request::get_request(store, request_id)?;
    if !req.status.can_transition_to(&RequestStatus::Allocated)
        || req.status == RequestStatus::Allocated
    {
        return Err(FlowError::InvalidStateTransition {
            from: req.status.as_str().to_string(),
            to: RequestStatus::Allocated.as_str().to_string(),
        });
    }
    if store.contains(COLLECTION, request_id)? {
        return Err(FlowError::DuplicateAllocation(request_id.to_string()));
    }
    if input.prepayment_amount < 0.0 {
        return Err(FlowError::validation("prepayment amount cannot be negative"));
    }

    let allocation = OrderAllocation {
        request_id: request_id.to_string(),
        packaging: input.packaging,
        payment_method: input.payment_method,
        prepayment_amount: input.prepayment_amount,
        card_type: input.card_type,
        needs_accessories: input.needs_accessories,
        production_date: input.production_date,
        delivery_date: input.delivery_date,
        allocated_at: Utc::now(),
    };
    store.insert(COLLECTION, request_id, serde_json::to_value(&allocation)?)?;

    let has_card = allocation.card_type.is_some();
    progress::create_procurement_progress(
        store,
        request_id,
        ProcurementSeed {
            deposit_required: allocation.deposit_required(),
            has_card,
        },
    )?;
    for item in &req.line_items {
        if has_card {
            progress::create_card_progress(store, request_id, &item.sku_id)?;
        }
        if allocation.needs_accessories {
            progress::create_accessory_progress(store, request_id, &item.sku_id)?;
        }
    }

    req.status = RequestStatus::Allocated;
    req.allocated_at = Some(allocation.allocated_at);
    req.updated_at = allocation.allocated_at;
    request::save(store, &req)?;

    debug!(request_id, packaging = allocation.packaging.as_str(), "request allocated");
    Ok(allocation)
}

/// Get the allocation for a request, if any.
pub fn try_get_allocation(store: &Store, request_id: &str) -> FlowResult<Option<OrderAllocation>> {
    match store.get(COLLECTION, request_id)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Get the allocation for a request.
pub fn get_allocation(store: &Store, request_id: &str) -> FlowResult<OrderAllocation> {
    try_get_allocation(store, request_id)?
        .ok_or_else(|| FlowError::AllocationNotFound(request_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::model::{ProgressFlavor, StageStatus};
    use crate::progress::stages::ProcurementStage;
    use crate::testsupport::{approved_request, default_allocation_input, line_item};

    #[test]
    fn test_allocate_spawns_progress_records() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10), line_item("SKU-B", 20)]);

        allocate(&store, &req.id, default_allocation_input()).unwrap();

        let records = progress::progress_for_request(&store, &req.id).unwrap();
        let procurement = records
            .iter()
            .filter(|p| p.flavor == ProgressFlavor::Procurement)
            .count();
        let cards = records.iter().filter(|p| p.flavor == ProgressFlavor::Card).count();
        let accessories = records
            .iter()
            .filter(|p| p.flavor == ProgressFlavor::Accessory)
            .count();
        assert_eq!((procurement, cards, accessories), (1, 2, 2));

        let req = request::get_request(&store, &req.id).unwrap();
        assert_eq!(req.status, RequestStatus::Allocated);
        assert!(req.allocated_at.is_some());
    }

    #[test]
    fn test_allocate_requires_approval() {
        let store = Store::in_memory();
        let req = request::create_request(&store, "alice", vec![line_item("SKU-A", 10)]).unwrap();
        let err = allocate(&store, &req.id, default_allocation_input()).unwrap_err();
        assert!(matches!(err, FlowError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_allocate_is_once_only() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        allocate(&store, &req.id, default_allocation_input()).unwrap();
        let err = allocate(&store, &req.id, default_allocation_input()).unwrap_err();
        assert!(matches!(err, FlowError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_zero_prepayment_waives_deposit_stage() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        let mut input = default_allocation_input();
        input.prepayment_amount = 0.0;
        allocate(&store, &req.id, input).unwrap();

        let p = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None).unwrap();
        assert_eq!(p.stages[0].key, ProcurementStage::DepositPayment.as_str());
        assert_eq!(p.stages[0].status, StageStatus::NoRequirement);
        // the next stage is immediately operable without any deposit action
        assert_eq!(p.stages[1].status, StageStatus::InProgress);
    }

    #[test]
    fn test_credit_terms_waive_deposit_stage() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        let mut input = default_allocation_input();
        input.payment_method = PaymentMethod::CreditTerms;
        allocate(&store, &req.id, input).unwrap();

        let p = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None).unwrap();
        assert_eq!(p.stages[0].status, StageStatus::NoRequirement);
    }

    #[test]
    fn test_no_card_type_waives_card_provision() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        let mut input = default_allocation_input();
        input.card_type = None;
        allocate(&store, &req.id, input).unwrap();

        let records = progress::progress_for_request(&store, &req.id).unwrap();
        assert!(records.iter().all(|p| p.flavor != ProgressFlavor::Card));
        let p = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None).unwrap();
        let idx = p.stage_index(ProcurementStage::CardProvision.as_str()).unwrap();
        assert_eq!(p.stages[idx].status, StageStatus::NoRequirement);
    }
}
