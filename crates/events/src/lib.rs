#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in waypoint
//!
//! Library crates never print. Everything the user or the log file should
//! see travels as an [`AppEvent`] over an unbounded channel to the CLI,
//! which decides how to render and log it.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by subsystem (install, validation, status)
//! - **`EventEmitter` trait**: one emission API for raw senders and for
//!   structs that carry an optional sender
//! - **Metadata**: every event is wrapped with an [`EventMeta`] carrying
//!   level, source and correlation id

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, FailureContext, GeneralEvent, InstallEvent, InstallPhase, StatusEvent,
    ValidationEvent,
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// An event together with its emission metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(meta: EventMeta, event: AppEvent) -> Self {
        Self { meta, event }
    }
}

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout waypoint
///
/// Implemented for the raw `EventSender` and for any struct holding an
/// optional sender. A missing sender or a dropped receiver silently
/// discards the event.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Hook for attaching a correlation id before sending
    fn enrich_event_meta(&self, _event: &AppEvent, _meta: &mut EventMeta) {}

    /// Emit an event with explicit metadata
    fn emit_with_meta(&self, meta: EventMeta, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let _ = sender.send(EventMessage::new(meta, event));
        }
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        let mut meta = EventMeta::new(event.log_level(), event.event_source());
        self.enrich_event_meta(&event, &mut meta);
        self.emit_with_meta(meta, event);
    }

    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    fn emit_operation_failed(&self, operation: impl Into<String>, failure: FailureContext) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            failure,
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_errors::ValidationError;

    struct Correlated {
        tx: Option<EventSender>,
        run_id: String,
    }

    impl EventEmitter for Correlated {
        fn event_sender(&self) -> Option<&EventSender> {
            self.tx.as_ref()
        }

        fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
            meta.correlation_id = Some(self.run_id.clone());
        }
    }

    #[tokio::test]
    async fn test_emitted_events_carry_level_and_source() {
        let (tx, mut rx) = channel();
        tx.emit_warning("slow network");

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.level, EventLevel::Warn);
        assert_eq!(message.meta.source, EventSource::GENERAL);
    }

    #[tokio::test]
    async fn test_enrichment_hook_sets_correlation() {
        let (tx, mut rx) = channel();
        let emitter = Correlated {
            tx: Some(tx),
            run_id: "run-1".into(),
        };
        emitter.emit(AppEvent::Install(InstallEvent::RecipeInstalling {
            recipe: "redis".into(),
        }));

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.correlation_id.as_deref(), Some("run-1"));
        assert_eq!(message.meta.source, EventSource::INSTALL);
    }

    #[test]
    fn test_missing_sender_discards_silently() {
        let emitter = Correlated {
            tx: None,
            run_id: "run-2".into(),
        };
        emitter.emit_error("nobody listening");
    }

    #[test]
    fn test_optional_recipe_failure_is_a_warning() {
        let failure = FailureContext::from_error(&ValidationError::Exhausted {
            recipe: "redis".into(),
            attempts: 3,
        });
        let optional = AppEvent::Install(InstallEvent::RecipeFailed {
            recipe: "redis".into(),
            mandatory: false,
            failure: failure.clone(),
        });
        let mandatory = AppEvent::Install(InstallEvent::RecipeFailed {
            recipe: "infrastructure-agent-installer".into(),
            mandatory: true,
            failure,
        });
        assert_eq!(optional.log_level(), tracing::Level::WARN);
        assert_eq!(mandatory.log_level(), tracing::Level::ERROR);
    }
}
