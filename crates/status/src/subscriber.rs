//! Fan-out target contract

use async_trait::async_trait;
use waypoint_errors::Error;
use waypoint_types::{DiscoveryManifest, Recipe};

use crate::state::{InstallState, RecipeStatusEvent};

/// One status transition as seen by subscribers
#[derive(Debug, Clone, Copy)]
pub enum StatusUpdate<'a> {
    DiscoveryComplete(&'a DiscoveryManifest),
    RecipesAvailable(&'a [Recipe]),
    RecipesSelected(&'a [Recipe]),
    RecipeRecommended(&'a RecipeStatusEvent),
    RecipeInstalling(&'a RecipeStatusEvent),
    RecipeInstalled(&'a RecipeStatusEvent),
    RecipeFailed(&'a RecipeStatusEvent),
    RecipeSkipped(&'a RecipeStatusEvent),
    RecipeCanceled(&'a RecipeStatusEvent),
    InstallComplete,
    InstallCanceled,
    InstallFailed(&'a Error),
}

impl StatusUpdate<'_> {
    /// Stable operation name used in logs and error reports
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::DiscoveryComplete(_) => "discovery_complete",
            Self::RecipesAvailable(_) => "recipes_available",
            Self::RecipesSelected(_) => "recipes_selected",
            Self::RecipeRecommended(_) => "recipe_recommended",
            Self::RecipeInstalling(_) => "recipe_installing",
            Self::RecipeInstalled(_) => "recipe_installed",
            Self::RecipeFailed(_) => "recipe_failed",
            Self::RecipeSkipped(_) => "recipe_skipped",
            Self::RecipeCanceled(_) => "recipe_canceled",
            Self::InstallComplete => "install_complete",
            Self::InstallCanceled => "install_canceled",
            Self::InstallFailed(_) => "install_failed",
        }
    }

    /// The per-recipe event carried by this update, if any
    #[must_use]
    pub fn recipe_event(&self) -> Option<&RecipeStatusEvent> {
        match self {
            Self::RecipeRecommended(event)
            | Self::RecipeInstalling(event)
            | Self::RecipeInstalled(event)
            | Self::RecipeFailed(event)
            | Self::RecipeSkipped(event)
            | Self::RecipeCanceled(event) => Some(event),
            _ => None,
        }
    }

    /// Installed and failed transitions are also recorded per entity
    #[must_use]
    pub fn is_entity_scoped(&self) -> bool {
        matches!(self, Self::RecipeInstalled(_) | Self::RecipeFailed(_))
    }
}

/// A sink notified of every status transition
///
/// Subscribers get a shared view of the state after it has been updated and
/// must not assume any other subscriber succeeded.
#[async_trait]
pub trait StatusSubscriber: Send + Sync {
    /// Name used when reporting this subscriber's failures
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns an error when the transition could not be recorded.
    async fn notify(&self, state: &InstallState, update: StatusUpdate<'_>) -> Result<(), Error>;
}
