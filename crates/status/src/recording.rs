//! In-memory subscriber that records every notification

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use waypoint_errors::Error;
use waypoint_types::EntityGuid;

use crate::state::{InstallOutcome, InstallState};
use crate::subscriber::{StatusSubscriber, StatusUpdate};

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpdate {
    pub operation: &'static str,
    /// Recipe names carried by the update, in order
    pub recipes: Vec<String>,
    pub entity_guid: Option<EntityGuid>,
    pub message: Option<String>,
    /// GUIDs known to the state when the update was delivered
    pub known_guids: Vec<EntityGuid>,
    pub outcome: InstallOutcome,
    pub success_link: Option<String>,
}

/// Records notifications for later inspection. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingStatusReporter {
    updates: Arc<Mutex<Vec<RecordedUpdate>>>,
    failure: Option<String>,
}

impl RecordingStatusReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every update and then fails with `message`
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            updates: Arc::default(),
            failure: Some(message.into()),
        }
    }

    #[must_use]
    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Operation names in delivery order
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        self.updates().iter().map(|u| u.operation).collect()
    }

    /// Recipe names of every update with the given operation, flattened
    #[must_use]
    pub fn recipes_for(&self, operation: &str) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|u| u.operation == operation)
            .flat_map(|u| u.recipes)
            .collect()
    }

    /// `(operation, recipes)` pairs in delivery order
    #[must_use]
    pub fn sequence(&self) -> Vec<(&'static str, Vec<String>)> {
        self.updates()
            .into_iter()
            .map(|u| (u.operation, u.recipes))
            .collect()
    }
}

#[async_trait]
impl StatusSubscriber for RecordingStatusReporter {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, state: &InstallState, update: StatusUpdate<'_>) -> Result<(), Error> {
        let recipes = match update {
            StatusUpdate::RecipesAvailable(recipes) | StatusUpdate::RecipesSelected(recipes) => {
                recipes.iter().map(|r| r.name.clone()).collect()
            }
            other => other
                .recipe_event()
                .map(|event| vec![event.recipe.name.clone()])
                .unwrap_or_default(),
        };
        let event = update.recipe_event();

        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedUpdate {
                operation: update.operation(),
                recipes,
                entity_guid: event.and_then(|e| e.entity_guid.clone()),
                message: event.and_then(|e| e.message.clone()),
                known_guids: state.entity_guids().to_vec(),
                outcome: state.outcome(),
                success_link: state.success_link().map(str::to_string),
            });

        match &self.failure {
            Some(message) => Err(Error::internal(message.clone())),
            None => Ok(()),
        }
    }
}
