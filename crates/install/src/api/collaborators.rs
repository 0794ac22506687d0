//! Capabilities the guided install drives but does not implement

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use waypoint_errors::Error;
use waypoint_types::{DiscoveryManifest, LogMatch, Recipe, RecipeVars};

/// Gathers facts about the host
#[async_trait]
pub trait Discoverer: Send + Sync {
    async fn discover(&self, cancel: &CancellationToken) -> Result<DiscoveryManifest, Error>;
}

/// Recipe catalog client
#[async_trait]
pub trait RecipeFetcher: Send + Sync {
    /// # Errors
    ///
    /// `InstallError::RecipeNotFound` when the catalog has no recipe named `name`.
    async fn fetch_recipe(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        name: &str,
    ) -> Result<Recipe, Error>;

    async fn fetch_recommendations(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
    ) -> Result<Vec<Recipe>, Error>;
}

/// Finds log files on the host matching the recipes' log patterns
#[async_trait]
pub trait FileFilterer: Send + Sync {
    async fn filter(
        &self,
        cancel: &CancellationToken,
        recipes: &[Recipe],
    ) -> Result<Vec<LogMatch>, Error>;
}

/// Runs the install steps of a recipe
#[async_trait]
pub trait RecipeExecutor: Send + Sync {
    /// Resolve the variables the install steps need
    async fn prepare(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        assume_yes: bool,
    ) -> Result<RecipeVars, Error>;

    async fn execute(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        vars: &RecipeVars,
    ) -> Result<(), Error>;
}

/// Asks the user questions
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn prompt_yes_no(&self, message: &str) -> Result<bool, Error>;

    /// Returns the chosen subset of `options`
    async fn multi_select(&self, message: &str, options: &[String]) -> Result<Vec<String>, Error>;
}
