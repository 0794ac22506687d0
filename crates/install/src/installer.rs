//! Main installer implementation

use std::future::Future;

use tokio_util::sync::CancellationToken;
use waypoint_errors::{Error, InstallError, UserFacingError};
use waypoint_events::{
    AppEvent, EventEmitter, EventMeta, EventSender, FailureContext, InstallEvent, InstallPhase,
};
use waypoint_status::InstallStatus;
use waypoint_types::{DiscoveryManifest, Recipe};
use waypoint_validation::RecipeValidator;

use crate::{
    Discoverer, FileFilterer, InstallSummary, InstallerContext, Prompter, RecipeExecutor,
    RecipeFetcher,
};

/// External capabilities a [`RecipeInstaller`] is assembled from
pub struct Collaborators {
    pub discoverer: Box<dyn Discoverer>,
    pub recipe_fetcher: Box<dyn RecipeFetcher>,
    pub file_filterer: Box<dyn FileFilterer>,
    pub recipe_executor: Box<dyn RecipeExecutor>,
    pub recipe_validator: Box<dyn RecipeValidator>,
    pub prompter: Box<dyn Prompter>,
}

/// Drives a guided install from discovery to the terminal status
///
/// The host agent and logging recipes are mandatory: any failure while
/// installing them aborts the run. Every other recipe is best-effort.
/// Cancellation always aborts and is never downgraded to a warning.
pub struct RecipeInstaller {
    pub(crate) context: InstallerContext,
    pub(crate) discoverer: Box<dyn Discoverer>,
    pub(crate) recipe_fetcher: Box<dyn RecipeFetcher>,
    pub(crate) file_filterer: Box<dyn FileFilterer>,
    pub(crate) recipe_executor: Box<dyn RecipeExecutor>,
    pub(crate) recipe_validator: Box<dyn RecipeValidator>,
    pub(crate) prompter: Box<dyn Prompter>,
    pub(crate) status: InstallStatus,
}

impl RecipeInstaller {
    /// Create a new installer
    #[must_use]
    pub fn new(
        context: InstallerContext,
        collaborators: Collaborators,
        status: InstallStatus,
    ) -> Self {
        let status = match context.event_sender.clone() {
            Some(tx) => status.with_event_sender(tx),
            None => status,
        };

        Self {
            context,
            discoverer: collaborators.discoverer,
            recipe_fetcher: collaborators.recipe_fetcher,
            file_filterer: collaborators.file_filterer,
            recipe_executor: collaborators.recipe_executor,
            recipe_validator: collaborators.recipe_validator,
            prompter: collaborators.prompter,
            status,
        }
    }

    #[must_use]
    pub fn context(&self) -> &InstallerContext {
        &self.context
    }

    #[must_use]
    pub fn status(&self) -> &InstallStatus {
        &self.status
    }

    /// Run the guided install and report its terminal outcome
    ///
    /// # Errors
    ///
    /// Returns `Error::Cancelled` when `cancel` fires, the failure of a
    /// mandatory recipe, or any discovery and fetch error. Optional recipe
    /// failures are reported through the status subscribers only.
    pub async fn install(&mut self, cancel: &CancellationToken) -> Result<InstallSummary, Error> {
        self.emit_operation_started("guided install");

        match self.run(cancel).await {
            Ok(()) => {
                let reported = self.status.install_complete().await;
                self.warn_unreported(reported);

                let summary = InstallSummary::from_state(self.status.state());
                self.emit(AppEvent::Install(InstallEvent::Completed {
                    installed: summary.installed.len(),
                    failed: summary.failed.len(),
                    skipped: summary.skipped.len(),
                }));
                self.emit_operation_completed("guided install", true);
                Ok(summary)
            }
            Err(err) if err.is_cancelled() => {
                tracing::info!("guided install canceled");
                let reported = self.status.install_canceled().await;
                self.warn_unreported(reported);
                self.emit(AppEvent::Install(InstallEvent::Canceled));
                Err(err)
            }
            Err(err) => {
                tracing::error!(error = %err, "guided install failed");
                let reported = self.status.install_failed(&err).await;
                self.warn_unreported(reported);
                let failure = FailureContext::from_error(&err);
                self.emit(AppEvent::Install(InstallEvent::Failed {
                    failure: failure.clone(),
                }));
                self.emit_operation_failed("guided install", failure);
                Err(err)
            }
        }
    }

    async fn run(&mut self, cancel: &CancellationToken) -> Result<(), Error> {
        self.emit_phase(InstallPhase::Discovery);
        let manifest: DiscoveryManifest =
            cancellable(cancel, self.discoverer.discover(cancel)).await?;
        tracing::debug!(hostname = %manifest.hostname, "discovery complete");

        let reported = self.status.discovery_complete(&manifest).await;
        self.tolerate_report(reported, false)?;

        self.guided_install(cancel, &manifest).await
    }

    /// Downgrade a status report failure to a warning off the mandatory path
    pub(crate) fn tolerate_report(
        &self,
        reported: Result<(), Error>,
        mandatory: bool,
    ) -> Result<(), Error> {
        match reported {
            Err(err) if !mandatory && err.is_status_report() => {
                self.warn_unreported(Err(err));
                Ok(())
            }
            other => other,
        }
    }

    pub(crate) fn warn_unreported(&self, reported: Result<(), Error>) {
        if let Err(err) = reported {
            tracing::warn!(error = %err, "status report failed");
            self.emit_warning_with_context(
                "Installation status could not be reported",
                err.to_string(),
            );
        }
    }

    pub(crate) fn emit_phase(&self, phase: InstallPhase) {
        tracing::debug!(%phase, "entering install phase");
        self.emit(AppEvent::Install(InstallEvent::PhaseStarted { phase }));
    }

    /// Normalise executor failures into `ExecutionFailed` for the recipe
    pub(crate) fn execution_error(recipe: &Recipe, err: Error) -> Error {
        match err {
            Error::Cancelled | Error::Install(_) => err,
            other => InstallError::ExecutionFailed {
                recipe: recipe.name.clone(),
                message: other.user_message().into_owned(),
            }
            .into(),
        }
    }
}

impl EventEmitter for RecipeInstaller {
    fn event_sender(&self) -> Option<&EventSender> {
        self.context.event_sender.as_ref()
    }

    fn enrich_event_meta(&self, _event: &AppEvent, meta: &mut EventMeta) {
        meta.correlation_id = Some(self.status.state().document_id().to_string());
    }
}

/// Race `fut` against the cancellation signal
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}
