//! Progress records: creation, lookup, and stage updates.

pub mod engine;
pub mod model;
pub mod stages;

use chrono::Utc;
use procflow_store::{ChangeEvent, Store, StoreError};
use tracing::debug;
use uuid::Uuid;

use crate::error::{FlowError, FlowResult};
use model::{progress_key, Progress, ProgressFlavor, StageInstance, StageStatus};
use stages::{stage_template, ProcurementStage, StageKind};

pub(crate) const COLLECTION: &str = "progress";

/// Creation-time facts that turn stages into `no_requirement`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcurementSeed {
    /// False when prepayment is zero or terms are credit: no deposit stage.
    pub deposit_required: bool,
    /// False when the allocation spawned no card progress records.
    pub has_card: bool,
}

/// Create the per-request procurement progress record.
pub fn create_procurement_progress(
    store: &Store,
    request_id: &str,
    seed: ProcurementSeed,
) -> FlowResult<Progress> {
    create(store, ProgressFlavor::Procurement, request_id, None, |stage| {
        let no_requirement = (stage.key == ProcurementStage::DepositPayment.as_str()
            && !seed.deposit_required)
            || (stage.key == ProcurementStage::CardProvision.as_str() && !seed.has_card);
        if no_requirement {
            stage.status = StageStatus::NoRequirement;
        }
    })
}

/// Create a per-SKU card production progress record.
pub fn create_card_progress(store: &Store, request_id: &str, sku_id: &str) -> FlowResult<Progress> {
    create(store, ProgressFlavor::Card, request_id, Some(sku_id), |_| {})
}

/// Create a per-SKU accessory production progress record.
pub fn create_accessory_progress(
    store: &Store,
    request_id: &str,
    sku_id: &str,
) -> FlowResult<Progress> {
    create(store, ProgressFlavor::Accessory, request_id, Some(sku_id), |_| {})
}

fn create(
    store: &Store,
    flavor: ProgressFlavor,
    request_id: &str,
    sku_id: Option<&str>,
    seed: impl Fn(&mut StageInstance),
) -> FlowResult<Progress> {
    let now = Utc::now();
    let mut stage_list: Vec<StageInstance> = stage_template(flavor)
        .into_iter()
        .map(|def| {
            let mut stage = StageInstance {
                key: def.key.to_string(),
                label: def.label.to_string(),
                kind: def.kind,
                status: StageStatus::NotStarted,
                completed_date: None,
                remarks: None,
            };
            seed(&mut stage);
            stage
        })
        .collect();

    // Open the record on its first actionable stage.
    engine::advance_pointer(&mut stage_list);

    let mut progress = Progress {
        id: Uuid::new_v4().to_string(),
        request_id: request_id.to_string(),
        sku_id: sku_id.map(str::to_string),
        flavor,
        stages: stage_list,
        overall_progress: 0,
        created_at: now,
        updated_at: now,
    };
    progress.overall_progress = engine::overall_progress(&progress.stages);

    let key = progress.storage_key();
    store
        .insert(COLLECTION, &key, serde_json::to_value(&progress)?)
        .map_err(|e| match e {
            StoreError::DuplicateKey { .. } => FlowError::DuplicateProgress(key.clone()),
            other => FlowError::Store(other),
        })?;
    store.publish(ChangeEvent::ProgressUpdated {
        progress_id: progress.id.clone(),
        overall_progress: progress.overall_progress,
    });
    debug!(key = %key, "progress record created");
    Ok(progress)
}

/// Get one progress record, if it exists.
pub fn try_get_progress(
    store: &Store,
    flavor: ProgressFlavor,
    request_id: &str,
    sku_id: Option<&str>,
) -> FlowResult<Option<Progress>> {
    let key = progress_key(flavor, request_id, sku_id);
    match store.get(COLLECTION, &key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Get one progress record, erroring when absent.
pub fn get_progress(
    store: &Store,
    flavor: ProgressFlavor,
    request_id: &str,
    sku_id: Option<&str>,
) -> FlowResult<Progress> {
    try_get_progress(store, flavor, request_id, sku_id)?.ok_or_else(|| {
        FlowError::ProgressNotFound(progress_key(flavor, request_id, sku_id))
    })
}

/// All progress records, in creation order, optionally narrowed by flavor.
pub fn list_progress(store: &Store, flavor: Option<ProgressFlavor>) -> FlowResult<Vec<Progress>> {
    let mut records = Vec::new();
    for value in store.list(COLLECTION)? {
        let progress: Progress = serde_json::from_value(value)?;
        if flavor.is_none() || flavor == Some(progress.flavor) {
            records.push(progress);
        }
    }
    Ok(records)
}

/// Progress records belonging to one request, in creation order.
pub fn progress_for_request(store: &Store, request_id: &str) -> FlowResult<Vec<Progress>> {
    Ok(list_progress(store, None)?
        .into_iter()
        .filter(|p| p.request_id == request_id)
        .collect())
}

/// Manual stage update: validates kind, per-stage machine, and predecessor
/// gating, then recomputes the derived percentage, persists, notifies, and
/// runs cross-module propagation.
pub fn update_stage(
    store: &Store,
    flavor: ProgressFlavor,
    request_id: &str,
    sku_id: Option<&str>,
    stage_key: &str,
    target: StageStatus,
    remarks: Option<&str>,
) -> FlowResult<Progress> {
    let canonical = stages::resolve_stage_key(flavor, stage_key).ok_or_else(|| {
        FlowError::UnknownStage {
            flavor: flavor.as_str().to_string(),
            stage: stage_key.to_string(),
        }
    })?;
    if matches!(target, StageStatus::NoRequirement) {
        return Err(FlowError::validation(
            "no_requirement is decided at creation time and cannot be assigned",
        ));
    }

    let mut progress = get_progress(store, flavor, request_id, sku_id)?;
    let index = progress
        .stage_index(canonical)
        .ok_or_else(|| FlowError::UnknownStage {
            flavor: flavor.as_str().to_string(),
            stage: canonical.to_string(),
        })?;

    if progress.stages[index].kind == StageKind::SystemLinked {
        return Err(FlowError::SystemLinkedStage {
            stage: canonical.to_string(),
        });
    }

    apply_stage(store, &mut progress, index, target, remarks)?;
    crate::propagator::after_progress_change(store, &progress)?;
    Ok(progress)
}

/// System path used by the propagator for system-linked stages. Respects
/// the same gating and machine rules; returns false (without error) when
/// the stage is already terminal or not yet reachable, so callers can
/// re-apply later.
pub(crate) fn apply_system_stage(
    store: &Store,
    request_id: &str,
    stage: ProcurementStage,
) -> FlowResult<bool> {
    let Some(mut progress) =
        try_get_progress(store, ProgressFlavor::Procurement, request_id, None)?
    else {
        return Ok(false);
    };
    let Some(index) = progress.stage_index(stage.as_str()) else {
        return Ok(false);
    };
    let current = progress.stages[index].status;
    if current.satisfies_gate() {
        // already applied (or no_requirement): idempotent no-op
        return Ok(false);
    }
    if !engine::is_operable(&progress.stages, index) {
        debug!(
            request_id,
            stage = stage.as_str(),
            "system stage not yet reachable, deferring"
        );
        return Ok(false);
    }
    apply_stage(store, &mut progress, index, StageStatus::Completed, None)?;
    Ok(true)
}

fn apply_stage(
    store: &Store,
    progress: &mut Progress,
    index: usize,
    target: StageStatus,
    remarks: Option<&str>,
) -> FlowResult<()> {
    let current = progress.stages[index].status;
    if !engine::can_transition(current, target) {
        return Err(FlowError::InvalidStateTransition {
            from: current.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }
    // skipping is gated too: a stage only leaves not_started, by any route,
    // once its predecessors are satisfied
    if !engine::gate_open(&progress.stages, index) {
        return Err(FlowError::StageNotOperable {
            stage: progress.stages[index].key.clone(),
        });
    }

    let now = Utc::now();
    let stage = &mut progress.stages[index];
    stage.status = target;
    if let Some(remarks) = remarks {
        stage.remarks = Some(remarks.to_string());
    }
    if matches!(target, StageStatus::Completed) {
        stage.completed_date = Some(now);
    }
    if target.satisfies_gate() {
        engine::advance_pointer(&mut progress.stages);
    }
    progress.overall_progress = engine::overall_progress(&progress.stages);
    progress.updated_at = now;

    store.set(COLLECTION, &progress.storage_key(), serde_json::to_value(&*progress)?)?;
    store.publish(ChangeEvent::ProgressUpdated {
        progress_id: progress.id.clone(),
        overall_progress: progress.overall_progress,
    });
    debug!(
        key = %progress.storage_key(),
        stage = %progress.stages[index].key,
        status = target.as_str(),
        overall = progress.overall_progress,
        "stage updated"
    );
    Ok(())
}
