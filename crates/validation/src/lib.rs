#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Telemetry validation for installed recipes
//!
//! After a recipe's install steps run, the validator polls the query backend
//! with the recipe's validation query until a row reports data, the attempt
//! budget runs out, or the run is cancelled.

pub mod mock;
mod polling;

pub use mock::MockQueryClient;
pub use polling::PollingRecipeValidator;
pub use waypoint_config::ValidationConfig;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use waypoint_errors::Error;
use waypoint_types::{EntityGuid, Recipe};

/// One result row returned by the query backend
pub type QueryRow = serde_json::Map<String, serde_json::Value>;

/// Backend executing validation queries
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Run one query and return its result rows
    async fn query(&self, nrql: &str) -> Result<Vec<QueryRow>, Error>;
}

#[async_trait]
impl<T: QueryClient + ?Sized> QueryClient for Arc<T> {
    async fn query(&self, nrql: &str) -> Result<Vec<QueryRow>, Error> {
        (**self).query(nrql).await
    }
}

/// Outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    /// Entity reported by the matching row, if any
    pub entity_guid: Option<EntityGuid>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl ValidationReport {
    /// Report for a recipe that carries no validation query
    #[must_use]
    pub fn unvalidated() -> Self {
        Self::default()
    }
}

/// Confirms that an installed recipe emits the expected telemetry
#[async_trait]
pub trait RecipeValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns `Error::Cancelled` when `cancel` fires,
    /// `ValidationError::Exhausted` when no attempt matched and
    /// `ValidationError::QueryFailed` when the backend call fails.
    async fn validate(
        &self,
        cancel: &CancellationToken,
        recipe: &Recipe,
    ) -> Result<ValidationReport, Error>;
}

#[async_trait]
impl<T: RecipeValidator + ?Sized> RecipeValidator for Arc<T> {
    async fn validate(
        &self,
        cancel: &CancellationToken,
        recipe: &Recipe,
    ) -> Result<ValidationReport, Error> {
        (**self).validate(cancel, recipe).await
    }
}
