//! Store error types.

use thiserror::Error;

/// Errors from the file-backed stores.
///
/// These are fatal to a run: being unable to open or write the cache,
/// ledger, or result sink is not a per-identifier condition the engine can
/// record and continue past.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error reading or writing a store file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;
