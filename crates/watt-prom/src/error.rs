//! Error types for the watt-prom crate.

use thiserror::Error;

/// Errors that can occur when talking to the metrics backend.
///
/// A query that succeeds with zero series is not an error — empty results
/// are a normal "no data available" state and decode to an empty vector.
#[derive(Debug, Error)]
pub enum PromError {
    /// The HTTP request failed or timed out.
    #[error("transport error: {reason}")]
    Transport {
        /// What went wrong at the transport level.
        reason: String,
    },

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned status {code}")]
    Status {
        /// The HTTP status code.
        code: u16,
    },

    /// The backend rejected the query (envelope status was not "success").
    #[error("query rejected: {message}")]
    Rejected {
        /// The server-reported error string.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("decode error: {reason}")]
    Decode {
        /// Why decoding failed.
        reason: String,
    },

    /// The requested range window or sample count is unusable.
    #[error("invalid range: {reason}")]
    InvalidRange {
        /// Why the range parameters were rejected.
        reason: String,
    },
}

impl From<reqwest::Error> for PromError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            reason: err.to_string(),
        }
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, PromError>;
