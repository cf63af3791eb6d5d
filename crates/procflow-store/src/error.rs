//! Store error types.

use thiserror::Error;

/// Errors surfaced by the keyed store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key '{key}' in collection '{collection}'")]
    DuplicateKey { collection: String, key: String },

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
