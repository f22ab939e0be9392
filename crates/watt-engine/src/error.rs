//! Error types for the watt-engine crate.

use thiserror::Error;

/// Errors that can occur in the aggregation engine.
///
/// The engine's aggregation functions are total over well-typed input;
/// the only failure mode is a caller-supplied parameter that has no
/// meaningful interpretation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The requested ranking size is not a positive integer.
    #[error("invalid top-k: k must be positive, got {k}")]
    InvalidTopK {
        /// The rejected value.
        k: usize,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_top_k() {
        let err = EngineError::InvalidTopK { k: 0 };
        assert_eq!(err.to_string(), "invalid top-k: k must be positive, got 0");
    }

}
