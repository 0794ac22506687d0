//! Install status aggregator

use waypoint_errors::{Error, StatusError};
use waypoint_events::{AppEvent, EventEmitter, EventMeta, EventSender, StatusEvent};
use waypoint_types::{DiscoveryManifest, EntityGuid, Recipe};

use crate::link::SuccessLinkGenerator;
use crate::state::{InstallOutcome, InstallState, RecipeStatusEvent, RecipeStatusType};
use crate::subscriber::{StatusSubscriber, StatusUpdate};

/// Owns the install state and forwards every transition to its subscribers
///
/// Each operation updates the state first and then notifies every subscriber
/// in insertion order. A failing subscriber never stops the others; all
/// failures come back as one `StatusError::ReportFailed`. After a terminal
/// outcome every operation is rejected with `StatusError::Finalized`.
pub struct InstallStatus {
    state: InstallState,
    subscribers: Vec<Box<dyn StatusSubscriber>>,
    link_generator: Box<dyn SuccessLinkGenerator>,
    tx: Option<EventSender>,
}

impl InstallStatus {
    #[must_use]
    pub fn new(
        subscribers: Vec<Box<dyn StatusSubscriber>>,
        link_generator: Box<dyn SuccessLinkGenerator>,
    ) -> Self {
        Self {
            state: InstallState::new(),
            subscribers,
            link_generator,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn state(&self) -> &InstallState {
        &self.state
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn discovery_complete(&mut self, manifest: &DiscoveryManifest) -> Result<(), Error> {
        self.ensure_open("discovery_complete")?;
        self.state.set_discovery_manifest(manifest);
        self.fan_out(StatusUpdate::DiscoveryComplete(manifest)).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipes_available(&mut self, recipes: &[Recipe]) -> Result<(), Error> {
        self.ensure_open("recipes_available")?;
        for recipe in recipes {
            self.state
                .set_recipe_status(recipe, RecipeStatusType::Available);
        }
        self.fan_out(StatusUpdate::RecipesAvailable(recipes)).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipes_selected(&mut self, recipes: &[Recipe]) -> Result<(), Error> {
        self.ensure_open("recipes_selected")?;
        for recipe in recipes {
            self.state
                .set_recipe_status(recipe, RecipeStatusType::Selected);
        }
        self.fan_out(StatusUpdate::RecipesSelected(recipes)).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipe_recommended(&mut self, event: &RecipeStatusEvent) -> Result<(), Error> {
        self.ensure_open("recipe_recommended")?;
        self.state.apply_event(event, RecipeStatusType::Recommended);
        self.fan_out(StatusUpdate::RecipeRecommended(event)).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipe_installing(&mut self, event: &RecipeStatusEvent) -> Result<(), Error> {
        self.ensure_open("recipe_installing")?;
        self.state.apply_event(event, RecipeStatusType::Installing);
        self.fan_out(StatusUpdate::RecipeInstalling(event)).await
    }

    /// Registers the event's GUID, if any, before notifying subscribers.
    ///
    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipe_installed(&mut self, event: &RecipeStatusEvent) -> Result<(), Error> {
        self.ensure_open("recipe_installed")?;
        if let Some(guid) = &event.entity_guid {
            self.with_entity_guid(guid);
        }
        self.state.apply_event(event, RecipeStatusType::Installed);
        self.fan_out(StatusUpdate::RecipeInstalled(event)).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipe_failed(&mut self, event: &RecipeStatusEvent) -> Result<(), Error> {
        self.ensure_open("recipe_failed")?;
        self.state.apply_event(event, RecipeStatusType::Failed);
        self.fan_out(StatusUpdate::RecipeFailed(event)).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipe_skipped(&mut self, event: &RecipeStatusEvent) -> Result<(), Error> {
        self.ensure_open("recipe_skipped")?;
        self.state.apply_event(event, RecipeStatusType::Skipped);
        self.fan_out(StatusUpdate::RecipeSkipped(event)).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn recipe_canceled(&mut self, event: &RecipeStatusEvent) -> Result<(), Error> {
        self.ensure_open("recipe_canceled")?;
        self.state.apply_event(event, RecipeStatusType::Canceled);
        self.fan_out(StatusUpdate::RecipeCanceled(event)).await
    }

    /// Register an entity GUID. Blank and already-known GUIDs are ignored.
    ///
    /// Returns whether the GUID was newly added.
    pub fn with_entity_guid(&mut self, guid: &EntityGuid) -> bool {
        let added = self.state.register_entity_guid(guid);
        if added {
            tracing::debug!(guid = %guid, "registered entity guid");
        }
        added
    }

    /// Compute the success link, then mark the run complete.
    ///
    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn install_complete(&mut self) -> Result<(), Error> {
        self.ensure_open("install_complete")?;
        let link = self.link_generator.generate(&self.state);
        self.state.set_success_link(link);
        self.state.finalize(InstallOutcome::Complete, None);
        self.fan_out(StatusUpdate::InstallComplete).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn install_canceled(&mut self) -> Result<(), Error> {
        self.ensure_open("install_canceled")?;
        self.state.finalize(InstallOutcome::Canceled, None);
        self.fan_out(StatusUpdate::InstallCanceled).await
    }

    /// # Errors
    ///
    /// `Finalized` after a terminal outcome, `ReportFailed` when a subscriber fails.
    pub async fn install_failed(&mut self, error: &Error) -> Result<(), Error> {
        self.ensure_open("install_failed")?;
        self.state
            .finalize(InstallOutcome::Failed, Some(error.to_string()));
        self.fan_out(StatusUpdate::InstallFailed(error)).await
    }

    fn ensure_open(&self, operation: &str) -> Result<(), Error> {
        if self.state.is_finalized() {
            return Err(StatusError::Finalized {
                outcome: self.state.outcome().to_string(),
                operation: operation.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn fan_out(&self, update: StatusUpdate<'_>) -> Result<(), Error> {
        let mut failures = Vec::new();

        for subscriber in &self.subscribers {
            if let Err(err) = subscriber.notify(&self.state, update).await {
                tracing::warn!(
                    subscriber = subscriber.name(),
                    operation = update.operation(),
                    error = %err,
                    "status subscriber failed"
                );
                self.emit(AppEvent::Status(StatusEvent::SubscriberFailed {
                    subscriber: subscriber.name().to_string(),
                    operation: update.operation().to_string(),
                    error: err.to_string(),
                }));
                failures.push(format!("{}: {err}", subscriber.name()));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StatusError::ReportFailed {
                operation: update.operation().to_string(),
                failures,
            }
            .into())
        }
    }
}

impl EventEmitter for InstallStatus {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }

    fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
        meta.correlation_id = Some(self.state.document_id().to_string());
    }
}
