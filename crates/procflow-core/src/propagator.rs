//! Cross-module completion propagation.
//!
//! Derived effects between progress records and entities. Every propagation
//! is idempotent: re-applying one that already happened is a no-op. A
//! missing target record is logged and skipped, never an error; the
//! periodic sweep (or the next interaction) re-evaluates.

use procflow_store::Store;
use tracing::{debug, warn};

use crate::error::FlowResult;
use crate::finance::{self, PaymentKind};
use crate::inspection;
use crate::progress::{
    self,
    engine,
    model::{Progress, ProgressFlavor},
    stages::ProcurementStage,
};
use crate::request;
use crate::schedule;

/// Entry point called after every successful stage update.
pub fn after_progress_change(store: &Store, progress: &Progress) -> FlowResult<()> {
    if progress.flavor == ProgressFlavor::Card && progress.is_complete() {
        sync_card_provision(store, &progress.request_id)?;
    }
    Ok(())
}

/// Card progress completion → procurement card-provision stage.
///
/// Fires only when the *last* card progress under the request reaches 100;
/// applying it again once the stage is completed is a no-op.
pub fn sync_card_provision(store: &Store, request_id: &str) -> FlowResult<bool> {
    let cards: Vec<Progress> = progress::list_progress(store, Some(ProgressFlavor::Card))?
        .into_iter()
        .filter(|p| p.request_id == request_id)
        .collect();
    if cards.is_empty() || !cards.iter().all(Progress::is_complete) {
        return Ok(false);
    }
    if progress::try_get_progress(store, ProgressFlavor::Procurement, request_id, None)?.is_none() {
        warn!(request_id, "card progress complete but procurement progress missing, skipping");
        return Ok(false);
    }
    let applied =
        progress::apply_system_stage(store, request_id, ProcurementStage::CardProvision)?;
    if applied {
        debug!(request_id, "card provision stage completed by propagation");
    }
    Ok(applied)
}

/// Finance confirmation → procurement payment stage.
pub fn apply_payment_confirmation(
    store: &Store,
    request_id: &str,
    kind: PaymentKind,
) -> FlowResult<bool> {
    let stage = match kind {
        PaymentKind::Deposit => ProcurementStage::DepositPayment,
        PaymentKind::Final => ProcurementStage::FinalPayment,
    };
    if progress::try_get_progress(store, ProgressFlavor::Procurement, request_id, None)?.is_none() {
        warn!(request_id, kind = kind.as_str(), "payment confirmed but procurement progress missing, skipping");
        return Ok(false);
    }
    progress::apply_system_stage(store, request_id, stage)
}

/// Average accessory completion percentage for a request. `None` when the
/// request has no accessory progress records.
pub fn accessory_average(store: &Store, request_id: &str) -> FlowResult<Option<u8>> {
    let records: Vec<Progress> = progress::list_progress(store, Some(ProgressFlavor::Accessory))?
        .into_iter()
        .filter(|p| p.request_id == request_id)
        .collect();
    if records.is_empty() {
        return Ok(None);
    }
    let sum: u32 = records.iter().map(|p| p.overall_progress as u32).sum();
    Ok(Some((sum / records.len() as u32) as u8))
}

/// Derived, recomputed-on-read readiness for in-house inspection: every
/// procurement stage before the final inspection confirmation is satisfied,
/// and the accessory average exceeds 80 (vacuously true with no accessory
/// records). Not a stored flag.
pub fn ready_for_inspection(store: &Store, request_id: &str) -> FlowResult<bool> {
    let Some(procurement) =
        progress::try_get_progress(store, ProgressFlavor::Procurement, request_id, None)?
    else {
        return Ok(false);
    };
    let last = procurement.stages.len() - 1;
    if !engine::gate_open(&procurement.stages, last) {
        return Ok(false);
    }
    match accessory_average(store, request_id)? {
        Some(average) => Ok(average > 80),
        None => Ok(true),
    }
}

/// Inspection pass for every SKU → spawn production schedules (one per SKU,
/// pending, quantity from arrival quantity with planned quantity as the
/// fallback) and complete the procurement inspection-confirmation stage.
/// Returns the number of schedule rows created now.
pub fn sync_inspection_outcome(store: &Store, request_id: &str) -> FlowResult<usize> {
    let req = match request::get_request(store, request_id) {
        Ok(req) => req,
        Err(crate::error::FlowError::RequestNotFound(_)) => {
            warn!(request_id, "inspection outcome for unknown request, skipping");
            return Ok(0);
        }
        Err(e) => return Err(e),
    };
    if !inspection::all_skus_passed(store, request_id)? {
        return Ok(0);
    }

    let mut created = 0;
    for item in &req.line_items {
        if schedule::schedule_exists(store, request_id, &item.sku_id)? {
            continue;
        }
        let arrival = inspection::record_for_sku(store, request_id, &item.sku_id)?
            .and_then(|r| r.arrival_quantity);
        let quantity = arrival.unwrap_or(item.quantity);
        schedule::create_auto(store, request_id, &item.sku_id, quantity)?;
        created += 1;
    }
    if created > 0 {
        debug!(request_id, created, "production schedules spawned from inspection pass");
    }

    progress::apply_system_stage(store, request_id, ProcurementStage::InspectionConfirmation)?;
    Ok(created)
}

/// Periodic re-evaluation pass over every request: re-applies recorded
/// payment confirmations, card-provision completion, and inspection
/// outcomes whose target stages have since become reachable. Per-request
/// failures are logged and do not stop the sweep.
pub fn run_sweep(store: &Store) -> FlowResult<()> {
    for req in request::list_requests(store)? {
        if let Err(e) = sweep_request(store, &req.id) {
            warn!(request_id = %req.id, error = %e, "propagation sweep failed for request");
        }
    }
    Ok(())
}

fn sweep_request(store: &Store, request_id: &str) -> FlowResult<()> {
    if progress::try_get_progress(store, ProgressFlavor::Procurement, request_id, None)?.is_none() {
        return Ok(());
    }
    for kind in [PaymentKind::Deposit, PaymentKind::Final] {
        if finance::is_payment_confirmed(store, request_id, kind)? {
            apply_payment_confirmation(store, request_id, kind)?;
        }
    }
    sync_card_provision(store, request_id)?;
    if inspection::all_skus_passed(store, request_id)? {
        sync_inspection_outcome(store, request_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation;
    use crate::inspection::InspectionDecision;
    use crate::progress::model::{StageStatus, ProgressFlavor};
    use crate::progress::stages::{AccessoryStage, CardStage};
    use crate::schedule::ScheduleStatus;
    use crate::testsupport::{allocated_request, approved_request, default_allocation_input, line_item};

    fn complete_card(store: &Store, request_id: &str, sku: &str) {
        for stage in CardStage::ALL {
            progress::update_stage(
                store,
                ProgressFlavor::Card,
                request_id,
                Some(sku),
                stage.as_str(),
                StageStatus::Completed,
                None,
            )
            .unwrap();
        }
    }

    fn open_card_provision_gate(store: &Store, request_id: &str) {
        // deposit confirmed + arrange_production completed
        finance::confirm_payment(store, request_id, PaymentKind::Deposit).unwrap();
        progress::update_stage(
            store,
            ProgressFlavor::Procurement,
            request_id,
            None,
            ProcurementStage::ArrangeProduction.as_str(),
            StageStatus::Completed,
            None,
        )
        .unwrap();
    }

    fn card_provision_status(store: &Store, request_id: &str) -> StageStatus {
        let p = progress::get_progress(store, ProgressFlavor::Procurement, request_id, None)
            .unwrap();
        let idx = p.stage_index(ProcurementStage::CardProvision.as_str()).unwrap();
        p.stages[idx].status
    }

    #[test]
    fn test_card_provision_waits_for_last_sku() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10), line_item("SKU-B", 5)]);
        open_card_provision_gate(&store, &req.id);

        complete_card(&store, &req.id, "SKU-A");
        assert_eq!(card_provision_status(&store, &req.id), StageStatus::InProgress);

        complete_card(&store, &req.id, "SKU-B");
        assert_eq!(card_provision_status(&store, &req.id), StageStatus::Completed);
    }

    #[test]
    fn test_card_provision_propagation_is_idempotent() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        open_card_provision_gate(&store, &req.id);
        complete_card(&store, &req.id, "SKU-A");

        assert_eq!(card_provision_status(&store, &req.id), StageStatus::Completed);
        let before = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None)
            .unwrap();

        // re-applying the propagation changes nothing
        assert!(!sync_card_provision(&store, &req.id).unwrap());
        let after = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None)
            .unwrap();
        assert_eq!(before.overall_progress, after.overall_progress);
        assert_eq!(before.updated_at, after.updated_at);
    }

    #[test]
    fn test_missing_procurement_target_is_skipped_not_error() {
        let store = Store::in_memory();
        // card progress without any allocation/procurement record
        progress::create_card_progress(&store, "r-ghost", "SKU-A").unwrap();
        complete_card(&store, "r-ghost", "SKU-A");
        assert!(!sync_card_provision(&store, "r-ghost").unwrap());
    }

    #[test]
    fn test_inspection_pass_spawns_schedules_for_all_skus() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10), line_item("SKU-B", 5)]);

        inspection::record_decision(&store, &req.id, "SKU-A", InspectionDecision::Pass, Some(9), None)
            .unwrap();
        assert!(schedule::list_schedules(&store, Some(&req.id)).unwrap().is_empty());

        inspection::record_decision(&store, &req.id, "SKU-B", InspectionDecision::Pass, None, None)
            .unwrap();
        let rows = schedule::list_schedules(&store, Some(&req.id)).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.status == ScheduleStatus::Pending));
        // arrival quantity wins; planned quantity is the fallback
        let by_sku = |sku: &str| rows.iter().find(|r| r.sku_id == sku).unwrap().quantity;
        assert_eq!(by_sku("SKU-A"), 9);
        assert_eq!(by_sku("SKU-B"), 5);

        // repeating the propagation creates nothing new
        assert_eq!(sync_inspection_outcome(&store, &req.id).unwrap(), 0);
        assert_eq!(schedule::list_schedules(&store, Some(&req.id)).unwrap().len(), 2);
    }

    #[test]
    fn test_inspection_outcome_skips_missing_request_but_propagates_decode_errors() {
        let store = Store::in_memory();
        // unknown request: logged and skipped, not an error
        assert_eq!(sync_inspection_outcome(&store, "r-ghost").unwrap(), 0);

        // a request record that no longer deserializes is a real error
        store
            .insert("requests", "r-bad", serde_json::json!({"id": "r-bad"}))
            .unwrap();
        let err = sync_inspection_outcome(&store, "r-bad").unwrap_err();
        assert!(matches!(err, crate::error::FlowError::Json(_)));
    }

    #[test]
    fn test_ready_for_inspection_requires_both_conditions() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10)]);
        assert!(!ready_for_inspection(&store, &req.id).unwrap());

        // drive procurement to the inspection gate
        open_card_provision_gate(&store, &req.id);
        complete_card(&store, &req.id, "SKU-A");
        for stage in [ProcurementStage::PackagingProduction, ProcurementStage::ArrangeShipment] {
            // final payment sits between; confirm it when reached
            if stage == ProcurementStage::ArrangeShipment {
                finance::confirm_payment(&store, &req.id, PaymentKind::Final).unwrap();
            }
            progress::update_stage(
                &store,
                ProgressFlavor::Procurement,
                &req.id,
                None,
                stage.as_str(),
                StageStatus::Completed,
                None,
            )
            .unwrap();
        }
        progress::update_stage(
            &store,
            ProgressFlavor::Procurement,
            &req.id,
            None,
            ProcurementStage::ArrivalConfirmation.as_str(),
            StageStatus::Completed,
            None,
        )
        .unwrap();

        // accessory records exist but sit at 0%: not ready
        assert!(!ready_for_inspection(&store, &req.id).unwrap());

        for stage in AccessoryStage::ALL {
            progress::update_stage(
                &store,
                ProgressFlavor::Accessory,
                &req.id,
                Some("SKU-A"),
                stage.as_str(),
                StageStatus::Completed,
                None,
            )
            .unwrap();
        }
        assert!(ready_for_inspection(&store, &req.id).unwrap());
    }

    #[test]
    fn test_sweep_applies_deferred_payment_confirmation() {
        let store = Store::in_memory();
        let req = approved_request(&store, vec![line_item("SKU-A", 10)]);
        // confirm the deposit before any progress record exists
        let mut input = default_allocation_input();
        input.card_type = None;
        input.needs_accessories = false;

        allocation::allocate(&store, &req.id, input).unwrap();
        // complete stages up to final payment, confirming the deposit first
        finance::confirm_payment(&store, &req.id, PaymentKind::Final).unwrap();
        finance::confirm_payment(&store, &req.id, PaymentKind::Deposit).unwrap();
        for stage in [ProcurementStage::ArrangeProduction, ProcurementStage::PackagingProduction] {
            progress::update_stage(
                &store,
                ProgressFlavor::Procurement,
                &req.id,
                None,
                stage.as_str(),
                StageStatus::Completed,
                None,
            )
            .unwrap();
        }

        // final payment was confirmed while unreachable; the sweep applies it
        let p = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None).unwrap();
        let idx = p.stage_index(ProcurementStage::FinalPayment.as_str()).unwrap();
        assert_eq!(p.stages[idx].status, StageStatus::InProgress);

        run_sweep(&store).unwrap();
        let p = progress::get_progress(&store, ProgressFlavor::Procurement, &req.id, None).unwrap();
        assert_eq!(p.stages[idx].status, StageStatus::Completed);
    }
}
