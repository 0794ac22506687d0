//! Status reporting error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusError {
    /// One or more subscribers failed while the rest were still notified.
    #[error("{operation}: {} status subscriber(s) failed: {}", .failures.len(), .failures.join("; "))]
    ReportFailed {
        operation: String,
        failures: Vec<String>,
    },

    /// A scoped document write failed; `scopes` lists every failing scope.
    #[error("status document write failed for {}: {message}", .scopes.join(", "))]
    ScopedWriteFailed {
        scopes: Vec<String>,
        message: String,
    },

    /// The install already reached a terminal outcome.
    #[error("install status is already {outcome}; {operation} rejected")]
    Finalized { outcome: String, operation: String },
}

impl UserFacingError for StatusError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ReportFailed { .. } | Self::ScopedWriteFailed { .. } => {
                Some("Installation progress may not be visible remotely; check network access.")
            }
            Self::Finalized { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        !matches!(self, Self::Finalized { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::ReportFailed { .. } => Some("status.report_failed"),
            Self::ScopedWriteFailed { .. } => Some("status.scoped_write_failed"),
            Self::Finalized { .. } => Some("status.finalized"),
        }
    }
}
