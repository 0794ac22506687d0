//! Configuration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("parse error: {message}")]
    ParseError { message: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("Create ~/.config/waypoint/config.toml or pass --config."),
            Self::MissingField { field } => Some(match field.as_str() {
                "api_key" => "Set account.api_key in the config file or export WAYPOINT_API_KEY.",
                "account_id" => {
                    "Set account.account_id in the config file or export WAYPOINT_ACCOUNT_ID."
                }
                _ => "Add the missing configuration field noted in the error message.",
            }),
            Self::InvalidValue { .. } | Self::ParseError { .. } => {
                Some("Fix the configuration value and retry the command.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some("config.not_found"),
            Self::ParseError { .. } => Some("config.parse_error"),
            Self::MissingField { .. } => Some("config.missing_field"),
            Self::InvalidValue { .. } => Some("config.invalid_value"),
        }
    }
}
