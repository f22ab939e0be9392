//! Error types for the watt-views crate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by filter mutations and configuration validation.
#[derive(Debug, Error)]
pub enum ViewsError {
    /// A filter transition violated the selection rules.
    #[error("invalid filter transition: {reason}")]
    InvalidFilterTransition {
        /// Why the transition was rejected.
        reason: String,
    },

    /// A configuration field failed validation.
    #[error("invalid config field {field}: {reason}")]
    InvalidConfig {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type for filter and configuration operations.
pub type Result<T> = std::result::Result<T, ViewsError>;

/// A failure scoped to a single view.
///
/// View failures never propagate past the view that issued the query:
/// the poller publishes them as that view's snapshot while every other
/// view keeps updating. `Clone` so snapshots fan out over watch channels.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("view {view} failed: {reason}")]
pub struct ViewError {
    /// The view that failed.
    pub view: String,
    /// What went wrong.
    pub reason: String,
}

impl ViewError {
    /// Creates a view-scoped error from any displayable cause.
    #[must_use]
    pub fn new(view: &str, cause: impl std::fmt::Display) -> Self {
        Self {
            view: view.to_string(),
            reason: cause.to_string(),
        }
    }
}
