//! Auth/permission provider boundary.
//!
//! Permissions decide whether a manual action is *offered* to the operator.
//! They never replace stage gating: `is_operable` is enforced by the engine
//! regardless of who asks.

use serde::{Deserialize, Serialize};

/// Operator roles in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    DepartmentManager,
    GeneralManager,
    PurchasingOfficer,
    CardDesigner,
    WarehouseStaff,
    LogisticsStaff,
    AccessoryStaff,
}

impl Role {
    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "department_manager" => Some(Self::DepartmentManager),
            "general_manager" => Some(Self::GeneralManager),
            "purchasing_officer" => Some(Self::PurchasingOfficer),
            "card_designer" => Some(Self::CardDesigner),
            "warehouse_staff" => Some(Self::WarehouseStaff),
            "logistics_staff" => Some(Self::LogisticsStaff),
            "accessory_staff" => Some(Self::AccessoryStaff),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepartmentManager => "department_manager",
            Self::GeneralManager => "general_manager",
            Self::PurchasingOfficer => "purchasing_officer",
            Self::CardDesigner => "card_designer",
            Self::WarehouseStaff => "warehouse_staff",
            Self::LogisticsStaff => "logistics_staff",
            Self::AccessoryStaff => "accessory_staff",
        }
    }
}

/// Actions a role may be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    SubmitRequest,
    ApproveFirst,
    ApproveFinal,
    Allocate,
    CompleteProcurementStage,
    CompleteCardStage,
    CompleteAccessoryStage,
    RecordInspection,
    ConfirmPayment,
    ManageSchedule,
    SendReminder,
    ExportData,
}

/// The authenticated operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub role: Role,
}

/// External auth collaborator.
pub trait AuthProvider {
    fn current_user(&self) -> &User;
    fn has_permission(&self, capability: Capability) -> bool;
}

/// Static role-table provider used by the CLI.
pub struct RoleAuth {
    user: User,
}

impl RoleAuth {
    pub fn new(user: User) -> Self {
        Self { user }
    }
}

impl AuthProvider for RoleAuth {
    fn current_user(&self) -> &User {
        &self.user
    }

    fn has_permission(&self, capability: Capability) -> bool {
        use Capability::*;
        match self.user.role {
            Role::DepartmentManager => matches!(capability, SubmitRequest | ApproveFirst | ExportData),
            Role::GeneralManager => matches!(capability, ApproveFinal | ExportData),
            Role::PurchasingOfficer => matches!(
                capability,
                SubmitRequest
                    | Allocate
                    | CompleteProcurementStage
                    | ConfirmPayment
                    | SendReminder
                    | ExportData
            ),
            Role::CardDesigner => matches!(capability, CompleteCardStage | SendReminder | ExportData),
            Role::WarehouseStaff => matches!(capability, RecordInspection | ExportData),
            Role::LogisticsStaff => matches!(capability, ManageSchedule | ExportData),
            Role::AccessoryStaff => matches!(capability, CompleteAccessoryStage | ExportData),
        }
    }
}
