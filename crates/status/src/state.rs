//! Aggregate install state shared with every subscriber

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;
use waypoint_types::{DiscoveryManifest, EntityGuid, Recipe, SuccessLinkConfig};

/// Outcome of one recipe as last reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipeStatusType {
    Available,
    Selected,
    Recommended,
    Skipped,
    Installing,
    Installed,
    Failed,
    Canceled,
}

impl fmt::Display for RecipeStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Available => "AVAILABLE",
            Self::Selected => "SELECTED",
            Self::Recommended => "RECOMMENDED",
            Self::Skipped => "SKIPPED",
            Self::Installing => "INSTALLING",
            Self::Installed => "INSTALLED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
        };
        f.write_str(name)
    }
}

/// Overall outcome of the install run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallOutcome {
    #[default]
    InProgress,
    Complete,
    Canceled,
    Failed,
}

impl InstallOutcome {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// One transition of one recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeStatusEvent {
    pub recipe: Recipe,
    pub entity_guid: Option<EntityGuid>,
    pub validation_duration: Option<Duration>,
    /// Failure reason for FAILED transitions
    pub message: Option<String>,
}

impl RecipeStatusEvent {
    #[must_use]
    pub fn new(recipe: Recipe) -> Self {
        Self {
            recipe,
            entity_guid: None,
            validation_duration: None,
            message: None,
        }
    }

    #[must_use]
    pub fn with_entity_guid(mut self, guid: Option<EntityGuid>) -> Self {
        self.entity_guid = guid;
        self
    }

    #[must_use]
    pub fn with_validation_duration(mut self, duration: Duration) -> Self {
        self.validation_duration = Some(duration);
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Current status of one recipe within the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStatusEntry {
    pub name: String,
    pub display_name: String,
    pub status: RecipeStatusType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_guid: Option<EntityGuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    pub success_link: Option<SuccessLinkConfig>,
}

/// Snapshot of the install handed to subscribers, serialised as the status
/// document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallState {
    document_id: Uuid,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovery_manifest: Option<DiscoveryManifest>,
    recipes: Vec<RecipeStatusEntry>,
    entity_guids: Vec<EntityGuid>,
    status: InstallOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    success_link_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Default for InstallState {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallState {
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            document_id: Uuid::new_v4(),
            started_at: now,
            updated_at: now,
            hostname: None,
            discovery_manifest: None,
            recipes: Vec::new(),
            entity_guids: Vec::new(),
            status: InstallOutcome::InProgress,
            success_link_url: None,
            error: None,
        }
    }

    /// Identifier of the remote status document
    #[must_use]
    pub fn document_id(&self) -> Uuid {
        self.document_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    #[must_use]
    pub fn discovery_manifest(&self) -> Option<&DiscoveryManifest> {
        self.discovery_manifest.as_ref()
    }

    /// Recipes in first-seen order
    #[must_use]
    pub fn recipes(&self) -> &[RecipeStatusEntry] {
        &self.recipes
    }

    #[must_use]
    pub fn recipe(&self, name: &str) -> Option<&RecipeStatusEntry> {
        self.recipes.iter().find(|entry| entry.name == name)
    }

    #[must_use]
    pub fn status_of(&self, name: &str) -> Option<RecipeStatusType> {
        self.recipe(name).map(|entry| entry.status)
    }

    /// Known entity GUIDs in registration order
    #[must_use]
    pub fn entity_guids(&self) -> &[EntityGuid] {
        &self.entity_guids
    }

    #[must_use]
    pub fn outcome(&self) -> InstallOutcome {
        self.status
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn success_link(&self) -> Option<&str> {
        self.success_link_url.as_deref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Recipes currently in `status`
    pub fn recipes_with_status(
        &self,
        status: RecipeStatusType,
    ) -> impl Iterator<Item = &RecipeStatusEntry> + '_ {
        self.recipes.iter().filter(move |entry| entry.status == status)
    }

    /// Serialise the snapshot as the status document
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub(crate) fn set_discovery_manifest(&mut self, manifest: &DiscoveryManifest) {
        if !manifest.hostname.is_empty() {
            self.hostname = Some(manifest.hostname.clone());
        }
        self.discovery_manifest = Some(manifest.clone());
        self.touch();
    }

    pub(crate) fn set_recipe_status(&mut self, recipe: &Recipe, status: RecipeStatusType) {
        self.entry_mut(recipe).status = status;
        self.touch();
    }

    pub(crate) fn apply_event(&mut self, event: &RecipeStatusEvent, status: RecipeStatusType) {
        let entry = self.entry_mut(&event.recipe);
        entry.status = status;
        if let Some(guid) = event.entity_guid.as_ref().filter(|guid| !guid.is_empty()) {
            entry.entity_guid = Some(guid.clone());
        }
        if let Some(duration) = event.validation_duration {
            entry.validation_duration_ms =
                Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        }
        if event.message.is_some() {
            entry.message.clone_from(&event.message);
        }
        self.touch();
    }

    /// Returns `false` when the GUID was blank or already known
    pub(crate) fn register_entity_guid(&mut self, guid: &EntityGuid) -> bool {
        if guid.is_empty() || self.entity_guids.contains(guid) {
            return false;
        }
        self.entity_guids.push(guid.clone());
        true
    }

    pub(crate) fn set_success_link(&mut self, link: Option<String>) {
        self.success_link_url = link;
    }

    pub(crate) fn finalize(&mut self, outcome: InstallOutcome, error: Option<String>) {
        self.status = outcome;
        self.error = error;
        self.touch();
    }

    fn entry_mut(&mut self, recipe: &Recipe) -> &mut RecipeStatusEntry {
        let index = match self.recipes.iter().position(|entry| entry.name == recipe.name) {
            Some(index) => index,
            None => {
                self.recipes.push(RecipeStatusEntry {
                    name: recipe.name.clone(),
                    display_name: recipe.display_name.clone(),
                    status: RecipeStatusType::Available,
                    entity_guid: None,
                    validation_duration_ms: None,
                    message: None,
                    success_link: recipe.success_link.clone(),
                });
                self.recipes.len() - 1
            }
        };
        &mut self.recipes[index]
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipes_keep_first_seen_order() {
        let mut state = InstallState::new();
        let agent = Recipe::new("infrastructure-agent-installer", "Infrastructure Agent");
        let redis = Recipe::new("redis", "Redis");

        state.set_recipe_status(&agent, RecipeStatusType::Available);
        state.set_recipe_status(&redis, RecipeStatusType::Available);
        state.set_recipe_status(&agent, RecipeStatusType::Installed);

        let names: Vec<_> = state.recipes().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["infrastructure-agent-installer", "redis"]);
        assert_eq!(
            state.status_of("infrastructure-agent-installer"),
            Some(RecipeStatusType::Installed)
        );
    }

    #[test]
    fn test_guid_registration_is_idempotent() {
        let mut state = InstallState::new();
        assert!(state.register_entity_guid(&EntityGuid::new("A")));
        assert!(!state.register_entity_guid(&EntityGuid::new("A")));
        assert!(!state.register_entity_guid(&EntityGuid::new("")));
        assert!(state.register_entity_guid(&EntityGuid::new("B")));
        assert_eq!(
            state.entity_guids(),
            &[EntityGuid::new("A"), EntityGuid::new("B")]
        );
    }

    #[test]
    fn test_document_uses_camel_case_and_status_names() {
        let mut state = InstallState::new();
        let event = RecipeStatusEvent::new(Recipe::new("redis", "Redis"))
            .with_validation_duration(Duration::from_millis(1500))
            .with_entity_guid(Some(EntityGuid::new("GUID")));
        state.apply_event(&event, RecipeStatusType::Installed);

        let doc = state.to_document().unwrap();
        assert_eq!(doc["status"], "IN_PROGRESS");
        assert_eq!(doc["recipes"][0]["status"], "INSTALLED");
        assert_eq!(doc["recipes"][0]["validationDurationMs"], 1500);
        assert_eq!(doc["recipes"][0]["entityGuid"], "GUID");
        assert!(doc["documentId"].is_string());
    }
}
