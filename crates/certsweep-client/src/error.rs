//! Probe error types.

use thiserror::Error;

/// Errors surfaced by the probe client.
///
/// Only transport-level failures become errors; malformed bodies and logical
/// API failures travel back inside [`crate::RawResponse`] so the classifier
/// can turn them into cacheable outcomes.
#[derive(Error, Debug, Clone)]
pub enum ProbeError {
    /// Connection or timeout failure
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable description of the failure
        message: String,
    },
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type alias using `ProbeError`.
pub type Result<T> = std::result::Result<T, ProbeError>;
