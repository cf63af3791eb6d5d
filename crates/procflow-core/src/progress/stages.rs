//! Stage definition tables.
//!
//! Stage identity is typed per progress flavor; the Chinese display label is
//! a presentation mapping on top of the canonical key. An unknown key coming
//! in over an API boundary is a `ValidationError` upstream; internal code
//! only ever works with the enums.

use serde::{Deserialize, Serialize};

use crate::progress::model::ProgressFlavor;

/// Whether a stage is completed by staff or derived from elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// An authorized role may mark it completed directly.
    Manual,
    /// Only ever set by a rule or an external event.
    SystemLinked,
}

/// Canonical definition of one stage in a flavor's ordered list.
#[derive(Debug, Clone, Copy)]
pub struct StageDef {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: StageKind,
}

/// Procurement (external factory) stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcurementStage {
    DepositPayment,
    ArrangeProduction,
    CardProvision,
    PackagingProduction,
    FinalPayment,
    ArrangeShipment,
    ArrivalConfirmation,
    InspectionConfirmation,
}

impl ProcurementStage {
    pub const ALL: [Self; 8] = [
        Self::DepositPayment,
        Self::ArrangeProduction,
        Self::CardProvision,
        Self::PackagingProduction,
        Self::FinalPayment,
        Self::ArrangeShipment,
        Self::ArrivalConfirmation,
        Self::InspectionConfirmation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepositPayment => "deposit_payment",
            Self::ArrangeProduction => "arrange_production",
            Self::CardProvision => "card_provision",
            Self::PackagingProduction => "packaging_production",
            Self::FinalPayment => "final_payment",
            Self::ArrangeShipment => "arrange_shipment",
            Self::ArrivalConfirmation => "arrival_confirmation",
            Self::InspectionConfirmation => "inspection_confirmation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DepositPayment => "定金支付",
            Self::ArrangeProduction => "安排生产",
            Self::CardProvision => "纸卡提供",
            Self::PackagingProduction => "包装生产",
            Self::FinalPayment => "尾款支付",
            Self::ArrangeShipment => "安排发货",
            Self::ArrivalConfirmation => "到货确认",
            Self::InspectionConfirmation => "验收确认",
        }
    }

    pub fn kind(&self) -> StageKind {
        match self {
            Self::DepositPayment
            | Self::CardProvision
            | Self::FinalPayment
            | Self::InspectionConfirmation => StageKind::SystemLinked,
            _ => StageKind::Manual,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == key)
    }
}

/// Card production stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStage {
    Design,
    ProofConfirmation,
    Printing,
    Delivery,
}

impl CardStage {
    pub const ALL: [Self; 4] = [
        Self::Design,
        Self::ProofConfirmation,
        Self::Printing,
        Self::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::ProofConfirmation => "proof_confirmation",
            Self::Printing => "printing",
            Self::Delivery => "delivery",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Design => "设计稿",
            Self::ProofConfirmation => "样稿确认",
            Self::Printing => "印刷",
            Self::Delivery => "交付",
        }
    }

    pub fn kind(&self) -> StageKind {
        StageKind::Manual
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == key)
    }
}

/// Accessory production stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessoryStage {
    Sourcing,
    Production,
    Arrival,
}

impl AccessoryStage {
    pub const ALL: [Self; 3] = [Self::Sourcing, Self::Production, Self::Arrival];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sourcing => "sourcing",
            Self::Production => "production",
            Self::Arrival => "arrival",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sourcing => "采购备料",
            Self::Production => "生产",
            Self::Arrival => "到料",
        }
    }

    pub fn kind(&self) -> StageKind {
        StageKind::Manual
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == key)
    }
}

/// Canonical ordered stage template for a flavor.
pub fn stage_template(flavor: ProgressFlavor) -> Vec<StageDef> {
    match flavor {
        ProgressFlavor::Procurement => ProcurementStage::ALL
            .iter()
            .map(|s| StageDef {
                key: s.as_str(),
                label: s.label(),
                kind: s.kind(),
            })
            .collect(),
        ProgressFlavor::Card => CardStage::ALL
            .iter()
            .map(|s| StageDef {
                key: s.as_str(),
                label: s.label(),
                kind: s.kind(),
            })
            .collect(),
        ProgressFlavor::Accessory => AccessoryStage::ALL
            .iter()
            .map(|s| StageDef {
                key: s.as_str(),
                label: s.label(),
                kind: s.kind(),
            })
            .collect(),
    }
}

/// Resolve a canonical stage key against a flavor's table.
pub fn resolve_stage_key(flavor: ProgressFlavor, key: &str) -> Option<&'static str> {
    match flavor {
        ProgressFlavor::Procurement => ProcurementStage::from_key(key).map(|s| s.as_str()),
        ProgressFlavor::Card => CardStage::from_key(key).map(|s| s.as_str()),
        ProgressFlavor::Accessory => AccessoryStage::from_key(key).map(|s| s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_procurement_order_and_kinds() {
        let template = stage_template(ProgressFlavor::Procurement);
        assert_eq!(template.len(), 8);
        assert_eq!(template[0].key, "deposit_payment");
        assert_eq!(template[0].label, "定金支付");
        assert_eq!(template[0].kind, StageKind::SystemLinked);
        assert_eq!(template[1].kind, StageKind::Manual);
        assert_eq!(template[2].key, "card_provision");
        assert_eq!(template[2].kind, StageKind::SystemLinked);
        assert_eq!(template[7].key, "inspection_confirmation");
        assert_eq!(template[7].kind, StageKind::SystemLinked);
    }

    #[test]
    fn test_key_lookup() {
        assert_eq!(
            ProcurementStage::from_key("arrange_production"),
            Some(ProcurementStage::ArrangeProduction)
        );
        assert_eq!(ProcurementStage::from_key("安排生产"), None);
        assert_eq!(resolve_stage_key(ProgressFlavor::Card, "printing"), Some("printing"));
        assert_eq!(resolve_stage_key(ProgressFlavor::Card, "deposit_payment"), None);
    }
}
