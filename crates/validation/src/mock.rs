//! Scripted query backend for tests and scenarios

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use waypoint_errors::{Error, NetworkError};

use crate::{QueryClient, QueryRow};

#[derive(Debug, Clone)]
enum Behavior {
    /// Empty-count rows until the given attempt, then a matching row
    ResultsAfter(u32),
    NoResults,
    Fail(String),
    Hang,
}

/// Query client returning "no data" rows until a configured attempt
///
/// Clones share the call counter.
#[derive(Debug, Clone)]
pub struct MockQueryClient {
    behavior: Behavior,
    entity_guid: Option<String>,
    calls: Arc<AtomicU32>,
}

impl MockQueryClient {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            entity_guid: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Report data on the `n`th query and every query after it
    #[must_use]
    pub fn return_results_after_n_attempts(n: u32) -> Self {
        Self::with_behavior(Behavior::ResultsAfter(n.max(1)))
    }

    #[must_use]
    pub fn never_returning_results() -> Self {
        Self::with_behavior(Behavior::NoResults)
    }

    /// Every query fails with an HTTP error carrying `message`
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    /// Queries never complete
    #[must_use]
    pub fn hanging() -> Self {
        Self::with_behavior(Behavior::Hang)
    }

    /// GUID placed in the matching row
    #[must_use]
    pub fn with_entity_guid(mut self, guid: impl Into<String>) -> Self {
        self.entity_guid = Some(guid.into());
        self
    }

    /// Number of queries issued so far
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn row(&self, count: u64) -> QueryRow {
        let mut row = QueryRow::new();
        row.insert("count".to_string(), json!(count));
        if count > 0 {
            if let Some(guid) = &self.entity_guid {
                row.insert("entityGuid".to_string(), json!(guid));
            }
        }
        row
    }
}

impl Default for MockQueryClient {
    fn default() -> Self {
        Self::return_results_after_n_attempts(1)
    }
}

#[async_trait]
impl QueryClient for MockQueryClient {
    async fn query(&self, _nrql: &str) -> Result<Vec<QueryRow>, Error> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            Behavior::ResultsAfter(n) if attempt >= *n => Ok(vec![self.row(1)]),
            Behavior::ResultsAfter(_) | Behavior::NoResults => Ok(vec![self.row(0)]),
            Behavior::Fail(message) => Err(NetworkError::HttpError {
                status: 502,
                message: message.clone(),
            }
            .into()),
            Behavior::Hang => std::future::pending().await,
        }
    }
}
