//! Batch stage completion across selected requests/SKUs.
//!
//! Selection never bypasses gating: operability is re-checked per key at
//! apply time, and a key that fails lands in `skipped` without affecting
//! the others. There is no cross-entity transaction.

use std::fmt;

use procflow_store::Store;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FlowError, FlowResult};
use crate::progress::{
    self,
    model::{ProgressFlavor, StageStatus},
    stages,
};

/// Identifies one progress record in a batch selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressKey {
    pub request_id: String,
    pub sku_id: Option<String>,
}

impl ProgressKey {
    pub fn request(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            sku_id: None,
        }
    }

    pub fn sku(request_id: impl Into<String>, sku_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            sku_id: Some(sku_id.into()),
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sku_id {
            Some(sku) => write!(f, "{}/{}", self.request_id, sku),
            None => write!(f, "{}", self.request_id),
        }
    }
}

/// Structured batch result: partial failure is data, not an error.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<ProgressKey>,
    pub skipped: Vec<ProgressKey>,
}

/// Complete `stage_key` on every selected key where it is currently
/// operable. Keys whose stage is not operable, already terminal, or whose
/// record is missing are skipped. An unknown stage key for the flavor is a
/// programming error surfaced up front, before any key is touched.
pub fn batch_complete(
    store: &Store,
    flavor: ProgressFlavor,
    keys: &[ProgressKey],
    stage_key: &str,
) -> FlowResult<BatchOutcome> {
    let canonical =
        stages::resolve_stage_key(flavor, stage_key).ok_or_else(|| FlowError::UnknownStage {
            flavor: flavor.as_str().to_string(),
            stage: stage_key.to_string(),
        })?;

    let mut outcome = BatchOutcome::default();
    for key in keys {
        match progress::update_stage(
            store,
            flavor,
            &key.request_id,
            key.sku_id.as_deref(),
            canonical,
            StageStatus::Completed,
            None,
        ) {
            Ok(_) => outcome.succeeded.push(key.clone()),
            Err(e) => {
                debug!(key = %key, stage = canonical, error = %e, "batch item skipped");
                outcome.skipped.push(key.clone());
            }
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{self, PaymentKind};
    use crate::progress::stages::{CardStage, ProcurementStage};
    use crate::testsupport::{allocated_request, line_item};

    #[test]
    fn test_batch_skips_non_operable_keys() {
        let store = Store::in_memory();
        let req_x = allocated_request(&store, vec![line_item("SKU-1", 10)]);
        let req_y = allocated_request(&store, vec![line_item("SKU-2", 10)]);
        let req_z = allocated_request(&store, vec![line_item("SKU-3", 10)]);

        // open arrange_production for X and Z only (deposit confirmed)
        for req in [&req_x, &req_z] {
            finance::confirm_payment(&store, &req.id, PaymentKind::Deposit).unwrap();
        }

        let keys = [
            ProgressKey::request(req_x.id.clone()),
            ProgressKey::request(req_y.id.clone()),
            ProgressKey::request(req_z.id.clone()),
        ];
        let outcome = batch_complete(
            &store,
            ProgressFlavor::Procurement,
            &keys,
            ProcurementStage::ArrangeProduction.as_str(),
        )
        .unwrap();

        assert_eq!(outcome.succeeded, vec![keys[0].clone(), keys[2].clone()]);
        assert_eq!(outcome.skipped, vec![keys[1].clone()]);
    }

    #[test]
    fn test_one_failure_never_blocks_others() {
        let store = Store::in_memory();
        let req = allocated_request(&store, vec![line_item("SKU-A", 10), line_item("SKU-B", 5)]);

        let keys = [
            ProgressKey::sku(req.id.clone(), "SKU-A"),
            ProgressKey::sku(req.id.clone(), "SKU-MISSING"),
            ProgressKey::sku(req.id.clone(), "SKU-B"),
        ];
        let outcome =
            batch_complete(&store, ProgressFlavor::Card, &keys, CardStage::Design.as_str())
                .unwrap();
        assert_eq!(outcome.succeeded.len(), 2);
        assert_eq!(outcome.skipped, vec![keys[1].clone()]);
    }

    #[test]
    fn test_unknown_stage_fails_fast() {
        let store = Store::in_memory();
        let err = batch_complete(
            &store,
            ProgressFlavor::Procurement,
            &[ProgressKey::request("r1")],
            "definitely_not_a_stage",
        )
        .unwrap_err();
        assert!(matches!(err, FlowError::UnknownStage { .. }));
    }

    #[test]
    fn test_empty_selection_is_empty_outcome() {
        let store = Store::in_memory();
        let outcome = batch_complete(
            &store,
            ProgressFlavor::Procurement,
            &[],
            ProcurementStage::ArrangeProduction.as_str(),
        )
        .unwrap();
        assert!(outcome.succeeded.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}
