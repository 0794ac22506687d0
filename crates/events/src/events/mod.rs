use serde::{Deserialize, Serialize};

use crate::EventSource;
use waypoint_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod install;
pub mod status;
pub mod validation;

pub use general::*;
pub use install::*;
pub use status::*;
pub use validation::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Guided install workflow events
    Install(InstallEvent),

    /// Telemetry validation polling
    Validation(ValidationEvent),

    /// Status subscriber fan-out
    Status(StatusEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Install(_) => EventSource::INSTALL,
            Self::Validation(_) => EventSource::VALIDATION,
            Self::Status(_) => EventSource::STATUS,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Install(
                InstallEvent::Failed { .. } | InstallEvent::RecipeFailed { mandatory: true, .. },
            ) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Install(InstallEvent::RecipeFailed {
                mandatory: false, ..
            })
            | Self::Validation(ValidationEvent::Exhausted { .. })
            | Self::Status(StatusEvent::SubscriberFailed { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Validation(ValidationEvent::AttemptCompleted { .. })
            | Self::Status(StatusEvent::DocumentWritten { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "waypoint::events::general",
            Self::Install(_) => "waypoint::events::install",
            Self::Validation(_) => "waypoint::events::validation",
            Self::Status(_) => "waypoint::events::status",
        }
    }
}
