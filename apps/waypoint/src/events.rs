//! Event handling and user feedback
//!
//! Recipe milestones are printed by the terminal status reporter; this
//! handler surfaces what the status stream does not carry (warnings,
//! subscriber failures, validation progress) and forwards every event to
//! the tracing log.

use console::{Style, Term};
use waypoint_events::{AppEvent, EventMessage, GeneralEvent, StatusEvent, ValidationEvent};

/// Event handler for side-channel messages
pub struct EventHandler {
    colors_enabled: bool,
    debug_enabled: bool,
    term: Term,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, debug_enabled: bool) -> Self {
        Self {
            colors_enabled,
            debug_enabled,
            term: Term::stderr(),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: EventMessage) {
        crate::logging::log_event_with_tracing(&event);

        match &event.event {
            AppEvent::General(GeneralEvent::Warning { message, context }) => {
                self.show_warning(message, context.as_deref());
            }
            AppEvent::General(GeneralEvent::Error { message }) => {
                self.show_error(message, None);
            }
            AppEvent::General(GeneralEvent::OperationFailed { operation, failure }) => {
                self.show_error(
                    &format!("{operation}: {}", failure.message),
                    failure.hint.as_deref(),
                );
            }
            AppEvent::General(GeneralEvent::DebugLog { message }) => {
                self.show_debug(message);
            }
            AppEvent::Status(StatusEvent::SubscriberFailed {
                subscriber,
                operation,
                error,
            }) => {
                self.show_warning(
                    &format!("{subscriber} could not report {operation}"),
                    Some(error),
                );
            }
            AppEvent::Validation(ValidationEvent::AttemptCompleted {
                recipe,
                attempt,
                rows,
            }) => {
                self.show_debug(&format!(
                    "validation query {attempt} for {recipe} returned {rows} rows"
                ));
            }
            AppEvent::Validation(ValidationEvent::Exhausted { recipe, attempts }) => {
                self.show_warning(
                    &format!("no data reported for {recipe} after {attempts} attempts"),
                    None,
                );
            }
            _ => {}
        }
    }

    fn show_warning(&self, message: &str, context: Option<&str>) {
        let tag = self.style("Warning:", &Style::new().yellow().bold());
        let line = match context {
            Some(context) => format!("{tag} {message} ({context})"),
            None => format!("{tag} {message}"),
        };
        let _ = self.term.write_line(&line);
    }

    fn show_error(&self, message: &str, details: Option<&str>) {
        let tag = self.style("Error:", &Style::new().red().bold());
        let _ = self.term.write_line(&format!("{tag} {message}"));
        if let Some(details) = details {
            let _ = self.term.write_line(&format!("  {details}"));
        }
    }

    fn show_debug(&self, message: &str) {
        if self.debug_enabled {
            let line = self.style(&format!("debug: {message}"), &Style::new().dim());
            let _ = self.term.write_line(&line);
        }
    }

    fn style(&self, text: &str, style: &Style) -> String {
        if self.colors_enabled {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}
