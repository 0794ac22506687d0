//! Fixed-interval polling validator

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use waypoint_config::ValidationConfig;
use waypoint_errors::{Error, ValidationError};
use waypoint_events::{AppEvent, EventEmitter, EventSender, ValidationEvent};
use waypoint_types::{EntityGuid, Recipe};

use crate::{QueryClient, QueryRow, RecipeValidator, ValidationReport};

/// Polls a [`QueryClient`] until a row reports a non-zero `count`
pub struct PollingRecipeValidator<Q> {
    client: Q,
    config: ValidationConfig,
    tx: Option<EventSender>,
}

impl<Q: QueryClient> PollingRecipeValidator<Q> {
    #[must_use]
    pub fn new(client: Q, config: ValidationConfig) -> Self {
        Self {
            client,
            config,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    async fn poll(
        &self,
        cancel: &CancellationToken,
        recipe: &Recipe,
        nrql: &str,
    ) -> Result<ValidationAttempt, Error> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = ValidationAttempt::start();

        loop {
            if cancel.is_cancelled() {
                return Ok(attempt.finish(AttemptCause::Canceled));
            }

            attempt.count += 1;
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(attempt.finish(AttemptCause::Canceled)),
                result = self.client.query(nrql) => result,
            };

            let rows = match result {
                Ok(rows) => rows,
                Err(Error::Cancelled) => return Ok(attempt.finish(AttemptCause::Canceled)),
                Err(err) => {
                    return Err(ValidationError::QueryFailed {
                        recipe: recipe.name.clone(),
                        message: err.to_string(),
                    }
                    .into())
                }
            };

            if let Some(row) = rows.iter().find(|row| reports_data(row)) {
                let guid = entity_guid(row);
                return Ok(attempt.finish(AttemptCause::Matched(guid)));
            }

            self.emit(AppEvent::Validation(ValidationEvent::AttemptCompleted {
                recipe: recipe.name.clone(),
                attempt: attempt.count,
                rows: rows.len(),
            }));
            attempt.last_rows = rows;

            if attempt.count >= max_attempts {
                return Ok(attempt.finish(AttemptCause::Exhausted));
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(attempt.finish(AttemptCause::Canceled)),
                () = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}

impl<Q> EventEmitter for PollingRecipeValidator<Q> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

#[async_trait]
impl<Q: QueryClient> RecipeValidator for PollingRecipeValidator<Q> {
    async fn validate(
        &self,
        cancel: &CancellationToken,
        recipe: &Recipe,
    ) -> Result<ValidationReport, Error> {
        let Some(nrql) = recipe.validation_nrql.as_deref().filter(|q| !q.trim().is_empty())
        else {
            tracing::debug!(recipe = %recipe.name, "no validation query; skipping validation");
            return Ok(ValidationReport::unvalidated());
        };

        self.emit(AppEvent::Validation(ValidationEvent::Started {
            recipe: recipe.name.clone(),
            max_attempts: self.config.max_attempts,
        }));

        let attempt = self.poll(cancel, recipe, nrql).await?;
        let elapsed = attempt.started.elapsed();

        match attempt.cause {
            Some(AttemptCause::Matched(entity_guid)) => {
                self.emit(AppEvent::Validation(ValidationEvent::Succeeded {
                    recipe: recipe.name.clone(),
                    attempts: attempt.count,
                    entity_guid: entity_guid.as_ref().map(ToString::to_string),
                    elapsed,
                }));
                Ok(ValidationReport {
                    entity_guid,
                    attempts: attempt.count,
                    elapsed,
                })
            }
            Some(AttemptCause::Exhausted) => {
                tracing::debug!(
                    recipe = %recipe.name,
                    last_rows = attempt.last_rows.len(),
                    "validation attempts exhausted"
                );
                self.emit(AppEvent::Validation(ValidationEvent::Exhausted {
                    recipe: recipe.name.clone(),
                    attempts: attempt.count,
                }));
                Err(ValidationError::Exhausted {
                    recipe: recipe.name.clone(),
                    attempts: attempt.count,
                }
                .into())
            }
            Some(AttemptCause::Canceled) | None => {
                self.emit(AppEvent::Validation(ValidationEvent::Canceled {
                    recipe: recipe.name.clone(),
                    attempts: attempt.count,
                }));
                Err(Error::Cancelled)
            }
        }
    }
}

/// Progress of one validation run
struct ValidationAttempt {
    count: u32,
    started: Instant,
    last_rows: Vec<QueryRow>,
    cause: Option<AttemptCause>,
}

enum AttemptCause {
    Matched(Option<EntityGuid>),
    Exhausted,
    Canceled,
}

impl ValidationAttempt {
    fn start() -> Self {
        Self {
            count: 0,
            started: Instant::now(),
            last_rows: Vec::new(),
            cause: None,
        }
    }

    fn finish(mut self, cause: AttemptCause) -> Self {
        self.cause = Some(cause);
        self
    }
}

/// A row reports data when its `count` field is a non-zero number
fn reports_data(row: &QueryRow) -> bool {
    match row.get("count") {
        Some(Value::Number(n)) => n.as_f64().is_some_and(|c| c.abs() > 0.0),
        _ => false,
    }
}

fn entity_guid(row: &QueryRow) -> Option<EntityGuid> {
    let guid = row
        .get("entityGuid")
        .or_else(|| row.get("entity.guid"))
        .or_else(|| row.get("entity").and_then(|entity| entity.get("guid")))
        .and_then(Value::as_str)?;
    let guid = EntityGuid::new(guid);
    (!guid.is_empty()).then_some(guid)
}
