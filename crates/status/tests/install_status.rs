//! Fan-out behaviour of the install status aggregator

use waypoint_errors::{Error, StatusError};
use waypoint_status::*;
use waypoint_types::{DiscoveryManifest, EntityGuid, Recipe};

fn status_with(subscribers: Vec<Box<dyn StatusSubscriber>>) -> InstallStatus {
    InstallStatus::new(
        subscribers,
        Box::new(ConcreteSuccessLinkGenerator::new("https://one.example.com")),
    )
}

fn redis() -> Recipe {
    Recipe::new("redis-open-source-integration", "Redis Integration")
}

#[tokio::test]
async fn test_subscribers_notified_in_insertion_order_after_state_update() {
    let first = RecordingStatusReporter::new();
    let second = RecordingStatusReporter::new();
    let mut status = status_with(vec![Box::new(first.clone()), Box::new(second.clone())]);

    status
        .discovery_complete(&DiscoveryManifest::for_host("web-01"))
        .await
        .unwrap();
    status.recipes_available(&[redis()]).await.unwrap();

    assert_eq!(first.operations(), ["discovery_complete", "recipes_available"]);
    assert_eq!(first.updates(), second.updates());
    assert_eq!(status.state().hostname(), Some("web-01"));
    assert_eq!(
        status.state().status_of("redis-open-source-integration"),
        Some(RecipeStatusType::Available)
    );
}

#[tokio::test]
async fn test_failing_subscriber_does_not_block_the_rest() {
    let healthy = RecordingStatusReporter::new();
    let mut status = status_with(vec![
        Box::new(RecordingStatusReporter::failing("disk full")),
        Box::new(healthy.clone()),
        Box::new(RecordingStatusReporter::failing("quota exceeded")),
    ]);

    let err = status
        .recipe_installing(&RecipeStatusEvent::new(redis()))
        .await
        .unwrap_err();

    assert_eq!(healthy.operations(), ["recipe_installing"]);
    match err {
        Error::Status(StatusError::ReportFailed {
            operation,
            failures,
        }) => {
            assert_eq!(operation, "recipe_installing");
            assert_eq!(failures.len(), 2);
            assert!(failures[0].contains("disk full"));
            assert!(failures[1].contains("quota exceeded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // state was updated before the fan-out
    assert_eq!(
        status.state().status_of("redis-open-source-integration"),
        Some(RecipeStatusType::Installing)
    );
}

#[tokio::test]
async fn test_installed_event_registers_guid_before_fan_out() {
    let recorder = RecordingStatusReporter::new();
    let mut status = status_with(vec![Box::new(recorder.clone())]);

    let event = RecipeStatusEvent::new(redis()).with_entity_guid(Some(EntityGuid::new("HOST")));
    status.recipe_installed(&event).await.unwrap();

    let updates = recorder.updates();
    assert_eq!(updates[0].known_guids, [EntityGuid::new("HOST")]);
    assert_eq!(updates[0].entity_guid, Some(EntityGuid::new("HOST")));
}

#[tokio::test]
async fn test_entity_guid_registration_is_idempotent() {
    let mut status = status_with(Vec::new());
    assert!(status.with_entity_guid(&EntityGuid::new("A")));
    assert!(!status.with_entity_guid(&EntityGuid::new("A")));

    let event = RecipeStatusEvent::new(redis()).with_entity_guid(Some(EntityGuid::new("A")));
    status.recipe_installed(&event).await.unwrap();

    assert_eq!(status.state().entity_guids(), &[EntityGuid::new("A")]);
}

#[tokio::test]
async fn test_success_link_stored_before_completion_is_reported() {
    let recorder = RecordingStatusReporter::new();
    let mut status = status_with(vec![Box::new(recorder.clone())]);
    status.with_entity_guid(&EntityGuid::new("HOST"));

    status.install_complete().await.unwrap();

    let updates = recorder.updates();
    assert_eq!(updates[0].outcome, InstallOutcome::Complete);
    assert_eq!(
        updates[0].success_link.as_deref(),
        Some("https://one.example.com/redirect/entity/HOST")
    );
}

#[tokio::test]
async fn test_completion_without_guid_has_no_link() {
    let mut status = status_with(Vec::new());
    status.install_complete().await.unwrap();
    assert_eq!(status.state().success_link(), None);
}

#[tokio::test]
async fn test_transitions_after_terminal_outcome_are_rejected() {
    let recorder = RecordingStatusReporter::new();
    let mut status = status_with(vec![Box::new(recorder.clone())]);

    status.install_canceled().await.unwrap();
    let err = status.install_complete().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Status(StatusError::Finalized { ref operation, .. }) if operation == "install_complete"
    ));
    assert!(status
        .recipe_skipped(&RecipeStatusEvent::new(redis()))
        .await
        .is_err());

    assert_eq!(recorder.operations(), ["install_canceled"]);
    assert_eq!(status.state().outcome(), InstallOutcome::Canceled);
}

#[tokio::test]
async fn test_install_failed_records_error_summary() {
    let mut status = status_with(Vec::new());
    let error = Error::internal("agent exploded");
    status.install_failed(&error).await.unwrap();

    assert_eq!(status.state().outcome(), InstallOutcome::Failed);
    assert!(status.state().error().unwrap().contains("agent exploded"));
    assert!(status.install_canceled().await.is_err());
}

#[tokio::test]
async fn test_subscriber_failures_become_status_events() {
    let (tx, mut rx) = waypoint_events::channel();
    let mut status = status_with(vec![Box::new(RecordingStatusReporter::failing("offline"))])
        .with_event_sender(tx);

    let _ = status.recipes_selected(&[redis()]).await;
    let message = rx.recv().await.unwrap();

    assert_eq!(
        message.meta.correlation_id,
        Some(status.state().document_id().to_string())
    );
    assert!(matches!(
        message.event,
        waypoint_events::AppEvent::Status(waypoint_events::StatusEvent::SubscriberFailed { .. })
    ));
}
