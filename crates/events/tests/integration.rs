//! Integration tests for events

#[cfg(test)]
mod tests {
    use waypoint_events::*;

    struct Correlated {
        tx: Option<EventSender>,
        document_id: String,
    }

    impl EventEmitter for Correlated {
        fn event_sender(&self) -> Option<&EventSender> {
            self.tx.as_ref()
        }

        fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
            meta.correlation_id = Some(self.document_id.clone());
        }
    }

    #[tokio::test]
    async fn test_event_sender_emit() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let first = rx.recv().await.unwrap();
        assert!(matches!(
            first.event,
            AppEvent::General(GeneralEvent::Error { .. })
        ));
        assert_eq!(first.meta.level, EventLevel::Error);

        let second = rx.recv().await.unwrap();
        assert!(matches!(
            second.event,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[tokio::test]
    async fn test_emitter_without_sender_is_silent() {
        let emitter = Correlated {
            tx: None,
            document_id: "doc".into(),
        };
        emitter.emit(AppEvent::Install(InstallEvent::Canceled));
    }

    #[tokio::test]
    async fn test_enrich_sets_correlation_id() {
        let (tx, mut rx) = channel();
        let emitter = Correlated {
            tx: Some(tx),
            document_id: "3f2a".into(),
        };

        emitter.emit(AppEvent::Install(InstallEvent::RecipeInstalling {
            recipe: "logs-integration".into(),
        }));

        let message = rx.recv().await.unwrap();
        assert_eq!(message.meta.correlation_id.as_deref(), Some("3f2a"));
        assert_eq!(message.meta.source, EventSource::INSTALL);
    }

    #[test]
    fn test_recipe_failure_level_depends_on_mandatory() {
        let failure = FailureContext::new(None::<String>, "exit status 1", None::<String>, false);
        let mandatory = AppEvent::Install(InstallEvent::RecipeFailed {
            recipe: "infrastructure-agent-installer".into(),
            mandatory: true,
            failure: failure.clone(),
        });
        let optional = AppEvent::Install(InstallEvent::RecipeFailed {
            recipe: "redis".into(),
            mandatory: false,
            failure,
        });

        assert_eq!(mandatory.log_level(), tracing::Level::ERROR);
        assert_eq!(optional.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_event_serialization_is_tagged_by_domain() {
        let event = AppEvent::Validation(ValidationEvent::Exhausted {
            recipe: "redis".into(),
            attempts: 60,
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["domain"], "validation");
        assert_eq!(json["event"]["type"], "Exhausted");
        assert_eq!(json["event"]["attempts"], 60);
    }
}
