//! Centralized error types for procflow.

use procflow_store::StoreError;
use thiserror::Error;

/// Main error type for procflow operations.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Purchase request not found: {0}")]
    RequestNotFound(String),

    #[error("Allocation not found for request: {0}")]
    AllocationNotFound(String),

    #[error("Progress record not found: {0}")]
    ProgressNotFound(String),

    #[error("Production schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Unknown stage '{stage}' for {flavor} progress")]
    UnknownStage { flavor: String, stage: String },

    #[error("Invalid state transition: cannot move from '{from}' to '{to}'")]
    InvalidStateTransition { from: String, to: String },

    #[error("Stage '{stage}' is not currently operable")]
    StageNotOperable { stage: String },

    #[error("Stage '{stage}' is system-linked and cannot be set manually")]
    SystemLinkedStage { stage: String },

    #[error("Allocation already exists for request: {0}")]
    DuplicateAllocation(String),

    #[error("Progress record already exists: {0}")]
    DuplicateProgress(String),

    #[error("Production schedule already exists: {0}")]
    DuplicateSchedule(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for procflow operations.
pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
