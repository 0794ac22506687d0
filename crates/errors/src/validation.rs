//! Telemetry validation error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationError {
    /// Every attempt completed but none reported data.
    #[error("no data reported for {recipe} after {attempts} attempts")]
    Exhausted { recipe: String, attempts: u32 },

    /// The query backend could not be reached or rejected the query.
    #[error("validation query for {recipe} failed: {message}")]
    QueryFailed { recipe: String, message: String },
}

impl UserFacingError for ValidationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Exhausted { .. } => Some(
                "The agent may need more time to report. Retry the installation in a few minutes.",
            ),
            Self::QueryFailed { .. } => {
                Some("Check your API key, account id and network access to the query endpoint.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::Exhausted { .. } => Some("validation.exhausted"),
            Self::QueryFailed { .. } => Some("validation.query_failed"),
        }
    }
}
