//! In-memory collaborators for tests and scripted scenarios
//!
//! Every mock is `Clone` and clones share their call logs, so a test can
//! keep a handle after moving the mock into an installer.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use waypoint_errors::{Error, InstallError};
use waypoint_types::{DiscoveryManifest, LogMatch, Recipe, RecipeVars};

use crate::{Discoverer, FileFilterer, Prompter, RecipeExecutor, RecipeFetcher};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns a fixed manifest or a fixed discovery error
#[derive(Debug, Clone)]
pub struct MockDiscoverer {
    result: Result<DiscoveryManifest, String>,
}

impl MockDiscoverer {
    #[must_use]
    pub fn new(manifest: DiscoveryManifest) -> Self {
        Self {
            result: Ok(manifest),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
        }
    }
}

impl Default for MockDiscoverer {
    fn default() -> Self {
        Self::new(DiscoveryManifest::for_host("mock-host"))
    }
}

#[async_trait]
impl Discoverer for MockDiscoverer {
    async fn discover(&self, _cancel: &CancellationToken) -> Result<DiscoveryManifest, Error> {
        self.result.clone().map_err(|message| {
            InstallError::DiscoveryFailed { message }.into()
        })
    }
}

/// Serves recipes and recommendations from memory
#[derive(Debug, Clone, Default)]
pub struct MockRecipeFetcher {
    recipes: Vec<Recipe>,
    recommendations: Vec<Recipe>,
    recommendations_error: Option<String>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl MockRecipeFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.recipes.push(recipe);
        self
    }

    #[must_use]
    pub fn with_recommendation(mut self, recipe: Recipe) -> Self {
        self.recommendations.push(recipe);
        self
    }

    #[must_use]
    pub fn failing_recommendations(mut self, message: impl Into<String>) -> Self {
        self.recommendations_error = Some(message.into());
        self
    }

    /// Recipe names requested through `fetch_recipe`, in order
    #[must_use]
    pub fn fetched(&self) -> Vec<String> {
        lock(&self.fetched).clone()
    }
}

#[async_trait]
impl RecipeFetcher for MockRecipeFetcher {
    async fn fetch_recipe(
        &self,
        _cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
        name: &str,
    ) -> Result<Recipe, Error> {
        lock(&self.fetched).push(name.to_string());
        self.recipes
            .iter()
            .find(|recipe| recipe.name == name)
            .cloned()
            .ok_or_else(|| {
                InstallError::RecipeNotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn fetch_recommendations(
        &self,
        _cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
    ) -> Result<Vec<Recipe>, Error> {
        match &self.recommendations_error {
            Some(message) => Err(InstallError::FetchFailed {
                message: message.clone(),
            }
            .into()),
            None => Ok(self.recommendations.clone()),
        }
    }
}

/// Returns a fixed set of log matches regardless of the recipes
#[derive(Debug, Clone, Default)]
pub struct MockFileFilterer {
    matches: Vec<LogMatch>,
}

impl MockFileFilterer {
    #[must_use]
    pub fn new(matches: Vec<LogMatch>) -> Self {
        Self { matches }
    }
}

#[async_trait]
impl FileFilterer for MockFileFilterer {
    async fn filter(
        &self,
        _cancel: &CancellationToken,
        _recipes: &[Recipe],
    ) -> Result<Vec<LogMatch>, Error> {
        Ok(self.matches.clone())
    }
}

/// One recorded `execute` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedRecipe {
    pub name: String,
    pub vars: RecipeVars,
}

#[derive(Debug, Clone)]
enum ExecutorFailure {
    All(String),
    Recipes(Vec<String>, String),
    Interrupt(String),
    Hang(String),
}

/// Records executions and fails or interrupts on demand
#[derive(Debug, Clone, Default)]
pub struct MockRecipeExecutor {
    failure: Option<ExecutorFailure>,
    executed: Arc<Mutex<Vec<ExecutedRecipe>>>,
}

impl MockRecipeExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every recipe
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(ExecutorFailure::All(message.into())),
            executed: Arc::default(),
        }
    }

    /// Fail only the named recipes
    #[must_use]
    pub fn failing_for(names: &[&str], message: impl Into<String>) -> Self {
        Self {
            failure: Some(ExecutorFailure::Recipes(
                names.iter().map(|name| (*name).to_string()).collect(),
                message.into(),
            )),
            executed: Arc::default(),
        }
    }

    /// Return the cancellation interrupt when the named recipe runs
    #[must_use]
    pub fn interrupting(name: impl Into<String>) -> Self {
        Self {
            failure: Some(ExecutorFailure::Interrupt(name.into())),
            executed: Arc::default(),
        }
    }

    /// Never finish the named recipe unless cancelled
    #[must_use]
    pub fn hanging_on(name: impl Into<String>) -> Self {
        Self {
            failure: Some(ExecutorFailure::Hang(name.into())),
            executed: Arc::default(),
        }
    }

    #[must_use]
    pub fn executed(&self) -> Vec<ExecutedRecipe> {
        lock(&self.executed).clone()
    }

    /// Names of executed recipes, in order
    #[must_use]
    pub fn executed_names(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.name).collect()
    }
}

#[async_trait]
impl RecipeExecutor for MockRecipeExecutor {
    async fn prepare(
        &self,
        _cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        _recipe: &Recipe,
        assume_yes: bool,
    ) -> Result<RecipeVars, Error> {
        let mut vars = RecipeVars::new();
        vars.insert("HOSTNAME".to_string(), manifest.hostname.clone());
        vars.insert("ASSUME_YES".to_string(), assume_yes.to_string());
        Ok(vars)
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        _manifest: &DiscoveryManifest,
        recipe: &Recipe,
        vars: &RecipeVars,
    ) -> Result<(), Error> {
        lock(&self.executed).push(ExecutedRecipe {
            name: recipe.name.clone(),
            vars: vars.clone(),
        });

        match &self.failure {
            None => Ok(()),
            Some(ExecutorFailure::All(message)) => Err(Error::internal(message.clone())),
            Some(ExecutorFailure::Recipes(names, message)) if names.contains(&recipe.name) => {
                Err(Error::internal(message.clone()))
            }
            Some(ExecutorFailure::Interrupt(name)) if *name == recipe.name => Err(Error::Cancelled),
            Some(ExecutorFailure::Hang(name)) if *name == recipe.name => {
                cancel.cancelled().await;
                Err(Error::Cancelled)
            }
            Some(_) => Ok(()),
        }
    }
}

/// Answers prompts from a script and records the questions
#[derive(Debug, Clone)]
pub struct MockPrompter {
    yes_no: bool,
    selection: Option<Vec<String>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockPrompter {
    /// Answers yes and selects every option
    #[must_use]
    pub fn new() -> Self {
        Self {
            yes_no: true,
            selection: None,
            prompts: Arc::default(),
        }
    }

    #[must_use]
    pub fn answering(mut self, yes: bool) -> Self {
        self.yes_no = yes;
        self
    }

    /// Select only the listed display names
    #[must_use]
    pub fn selecting(mut self, names: &[&str]) -> Self {
        self.selection = Some(names.iter().map(|name| (*name).to_string()).collect());
        self
    }

    /// Messages asked so far, in order
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl Default for MockPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for MockPrompter {
    async fn prompt_yes_no(&self, message: &str) -> Result<bool, Error> {
        lock(&self.prompts).push(message.to_string());
        Ok(self.yes_no)
    }

    async fn multi_select(&self, message: &str, options: &[String]) -> Result<Vec<String>, Error> {
        lock(&self.prompts).push(message.to_string());
        Ok(match &self.selection {
            Some(selection) => options
                .iter()
                .filter(|option| selection.contains(option))
                .cloned()
                .collect(),
            None => options.to_vec(),
        })
    }
}
