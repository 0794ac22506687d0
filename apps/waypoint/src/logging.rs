//! Structured logging integration for events
//!
//! Converts install events into tracing records with structured fields so
//! the JSON debug log can be correlated by install document id.

use tracing::{debug, error, info, trace, warn};
use waypoint_events::{
    AppEvent, EventMessage, GeneralEvent, InstallEvent, StatusEvent, ValidationEvent,
};

/// Log an event using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::Install(install_event) => match install_event {
            InstallEvent::PhaseStarted { phase } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    phase = %phase,
                    "Install phase started"
                );
            }
            InstallEvent::RecipeInstalling { recipe } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    recipe = %recipe,
                    "Recipe installing"
                );
            }
            InstallEvent::RecipeInstalled {
                recipe,
                entity_guid,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    recipe = %recipe,
                    entity_guid = ?entity_guid,
                    "Recipe installed"
                );
            }
            InstallEvent::RecipeFailed {
                recipe,
                mandatory,
                failure,
            } => {
                if *mandatory {
                    error!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        correlation = ?meta.correlation_id,
                        recipe = %recipe,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Mandatory recipe failed"
                    );
                } else {
                    warn!(
                        source = meta.source.as_str(),
                        event_id = %meta.event_id,
                        correlation = ?meta.correlation_id,
                        recipe = %recipe,
                        code = ?failure.code,
                        message = %failure.message,
                        hint = ?failure.hint,
                        "Recipe failed"
                    );
                }
            }
            InstallEvent::RecipeSkipped { recipe } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    recipe = %recipe,
                    "Recipe skipped"
                );
            }
            InstallEvent::RecipeCanceled { recipe } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    recipe = %recipe,
                    "Recipe canceled"
                );
            }
            InstallEvent::Completed {
                installed,
                failed,
                skipped,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    installed = installed,
                    failed = failed,
                    skipped = skipped,
                    "Install completed"
                );
            }
            InstallEvent::Canceled => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    "Install canceled"
                );
            }
            InstallEvent::Failed { failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Install failed"
                );
            }
        },

        AppEvent::Validation(validation_event) => match validation_event {
            ValidationEvent::Started {
                recipe,
                max_attempts,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    recipe = %recipe,
                    max_attempts = max_attempts,
                    "Validation started"
                );
            }
            ValidationEvent::AttemptCompleted {
                recipe,
                attempt,
                rows,
            } => {
                trace!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    recipe = %recipe,
                    attempt = attempt,
                    rows = rows,
                    "Validation attempt completed"
                );
            }
            ValidationEvent::Succeeded {
                recipe,
                attempts,
                entity_guid,
                elapsed,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    recipe = %recipe,
                    attempts = attempts,
                    entity_guid = ?entity_guid,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Validation succeeded"
                );
            }
            ValidationEvent::Exhausted { recipe, attempts } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    recipe = %recipe,
                    attempts = attempts,
                    "Validation attempts exhausted"
                );
            }
            ValidationEvent::Canceled { recipe, attempts } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    recipe = %recipe,
                    attempts = attempts,
                    "Validation canceled"
                );
            }
        },

        AppEvent::Status(status_event) => match status_event {
            StatusEvent::SubscriberFailed {
                subscriber,
                operation,
                error,
            } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    subscriber = %subscriber,
                    operation = %operation,
                    error = %error,
                    "Status subscriber failed"
                );
            }
            StatusEvent::DocumentWritten { scope, document_id } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    scope = %scope,
                    document_id = %document_id,
                    "Status document written"
                );
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    message = %message,
                    context = ?context,
                    "Warning"
                );
            }
            GeneralEvent::Error { message } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    message = %message,
                    "Error"
                );
            }
            GeneralEvent::DebugLog { message } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    message = %message,
                    "Debug log"
                );
            }
            GeneralEvent::OperationStarted { operation } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    "Operation started"
                );
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    success = success,
                    "Operation completed"
                );
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    operation = %operation,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Operation failed"
                );
            }
        },
    }
}
