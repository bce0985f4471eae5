//! Engine error types.

use certsweep_store::StoreError;
use thiserror::Error;

/// Errors that abort a sweep run.
///
/// Individual probe failures never appear here — they are classified into
/// outcomes and recorded. Only invalid input and store I/O are fatal.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The requested range is inverted
    #[error("invalid range: start {start} is greater than end {end}")]
    InvalidRange {
        /// First certificate number of the range
        start: u64,
        /// Last certificate number of the range
        end: u64,
    },

    /// Cache, ledger, or result sink I/O failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidRange { start: 10, end: 5 };
        assert_eq!(
            err.to_string(),
            "invalid range: start 10 is greater than end 5"
        );
    }
}
