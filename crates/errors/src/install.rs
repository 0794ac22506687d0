//! Installation workflow error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum InstallError {
    #[error("host discovery failed: {message}")]
    DiscoveryFailed { message: String },

    #[error("failed to fetch recipes: {message}")]
    FetchFailed { message: String },

    #[error("recipe not found: {name}")]
    RecipeNotFound { name: String },

    #[error("recipe {recipe} failed to install: {message}")]
    ExecutionFailed { recipe: String, message: String },

    #[error("log file filtering failed: {message}")]
    FilterFailed { message: String },

    #[error("prompt failed: {message}")]
    PromptFailed { message: String },

    #[error("invalid option: {message}")]
    InvalidOption { message: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::FetchFailed { .. } | Self::RecipeNotFound { .. } => {
                Some("Check network access to the recipe catalog and retry.")
            }
            Self::ExecutionFailed { .. } => {
                Some("Re-run with --debug to see the output of the failing install step.")
            }
            Self::InvalidOption { .. } => Some("Run `waypoint install --help` for usage."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::DiscoveryFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DiscoveryFailed { .. } => "install.discovery_failed",
            Self::FetchFailed { .. } => "install.fetch_failed",
            Self::RecipeNotFound { .. } => "install.recipe_not_found",
            Self::ExecutionFailed { .. } => "install.execution_failed",
            Self::FilterFailed { .. } => "install.filter_failed",
            Self::PromptFailed { .. } => "install.prompt_failed",
            Self::InvalidOption { .. } => "install.invalid_option",
        };
        Some(code)
    }
}
