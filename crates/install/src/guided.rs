//! Guided install workflow
//!
//! Fetches the mandatory recipes, merges catalog recommendations, lets the
//! user pick integrations and installs everything in order: host agent,
//! logging, then the selected integrations.

use tokio_util::sync::CancellationToken;
use waypoint_errors::{Error, InstallError};
use waypoint_events::{AppEvent, EventEmitter, FailureContext, InstallEvent, InstallPhase};
use waypoint_status::RecipeStatusEvent;
use waypoint_types::{
    DiscoveryManifest, EntityGuid, LogMatch, Recipe, DISCOVERED_LOG_FILES_VAR,
    INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME,
};
use waypoint_validation::ValidationReport;

use crate::installer::cancellable;
use crate::RecipeInstaller;

const SELECT_INTEGRATIONS_PROMPT: &str =
    "Please choose from the additional recommended instrumentation to be installed:";

impl RecipeInstaller {
    pub(crate) async fn guided_install(
        &mut self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
    ) -> Result<(), Error> {
        self.emit_phase(InstallPhase::Fetch);
        let agent = self
            .fetch_recipe(cancel, manifest, INFRA_AGENT_RECIPE_NAME)
            .await?;
        let mut logging = self.fetch_recipe(cancel, manifest, LOGGING_RECIPE_NAME).await?;
        let reported = self
            .status
            .recipes_available(&[agent.clone(), logging.clone()])
            .await;
        self.tolerate_report(reported, false)?;

        if self.context.skip_infra {
            return Err(InstallError::InvalidOption {
                message: "--skip-infra is only applicable to targeted installation".to_string(),
            }
            .into());
        }

        let mut recommended = Vec::new();
        if self.context.skip_logging {
            self.skip_recipe(&logging).await?;
        } else {
            recommended.push(logging.clone());
        }

        if !self.context.skip_discovery {
            let recommendations = self.fetch_recommendations(cancel, manifest).await?;
            if recommendations.is_empty() {
                tracing::debug!("no additional integrations found");
            }
            recommended.extend(recommendations);
        }

        self.emit_phase(InstallPhase::Selection);
        let selected = self.filter_integrations(cancel, &recommended).await?;

        let mut for_installation = vec![agent.clone()];
        for_installation.extend(selected.iter().cloned());
        let reported = self.status.recipes_selected(&for_installation).await;
        self.tolerate_report(reported, false)?;

        let integrations: Vec<Recipe> = selected
            .into_iter()
            .filter(|recipe| recipe.name != LOGGING_RECIPE_NAME)
            .collect();

        self.emit_phase(InstallPhase::HostAgent);
        let host_guid = self
            .execute_and_validate(cancel, manifest, &agent, true)
            .await
            .inspect_err(|err| {
                tracing::error!(error = %err, "{}", fail_message(&agent));
            })?;

        if let Some(guid) = host_guid {
            self.report_recommended(&recommended, &guid).await?;
        }

        if self.context.should_install_logging() {
            self.emit_phase(InstallPhase::Logging);
            self.install_logging(cancel, manifest, &mut logging, &for_installation)
                .await
                .inspect_err(|err| {
                    tracing::error!(error = %err, "{}", fail_message(&logging));
                })?;
        }

        if self.context.should_install_integrations() {
            self.emit_phase(InstallPhase::Integrations);
            self.install_recipes(cancel, manifest, &integrations).await?;
        }

        Ok(())
    }

    async fn fetch_recipe(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        name: &str,
    ) -> Result<Recipe, Error> {
        tracing::debug!(recipe = name, "fetching recipe");
        cancellable(
            cancel,
            self.recipe_fetcher.fetch_recipe(cancel, manifest, name),
        )
        .await
    }

    /// Catalog recommendations without the recipes installed explicitly
    async fn fetch_recommendations(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
    ) -> Result<Vec<Recipe>, Error> {
        tracing::debug!("fetching recommended recipes");
        let recommendations = cancellable(
            cancel,
            self.recipe_fetcher.fetch_recommendations(cancel, manifest),
        )
        .await?;

        let recommendations: Vec<Recipe> = recommendations
            .into_iter()
            .filter(|recipe| {
                let redundant =
                    recipe.name == INFRA_AGENT_RECIPE_NAME || recipe.name == LOGGING_RECIPE_NAME;
                if redundant {
                    tracing::debug!(name = %recipe.name, "skipping redundant recipe");
                }
                !redundant
            })
            .collect();

        tracing::debug!(
            recipe_count = recommendations.len(),
            names = ?recommendations.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "recommended integrations"
        );
        Ok(recommendations)
    }

    /// Application-only recipes stay recommendations unless explicitly included
    fn is_install_candidate(&self, recipe: &Recipe) -> bool {
        !recipe.has_application_target_type()
            || recipe.is_apm()
            || self.context.include_application_targets
    }

    /// Apply skip flags and the user's selection to the recommendations
    ///
    /// Every excluded candidate is reported SKIPPED exactly once. Skipping
    /// the logging recipe disables the logging phase.
    async fn filter_integrations(
        &mut self,
        cancel: &CancellationToken,
        recommended: &[Recipe],
    ) -> Result<Vec<Recipe>, Error> {
        let mut candidates = Vec::new();
        for recipe in recommended {
            if !self.is_install_candidate(recipe) {
                continue;
            }

            if self.context.skip_integrations || (self.context.skip_apm && recipe.is_apm()) {
                self.skip_recipe(recipe).await?;
            } else {
                candidates.push(recipe.clone());
            }
        }

        let names: Vec<String> = candidates
            .iter()
            .map(|recipe| recipe.display_name.clone())
            .collect();

        let chosen = if self.context.assume_yes {
            names
        } else if names.is_empty() {
            Vec::new()
        } else {
            cancellable(
                cancel,
                self.prompter.multi_select(SELECT_INTEGRATIONS_PROMPT, &names),
            )
            .await?
        };

        let (selected, unselected): (Vec<Recipe>, Vec<Recipe>) = candidates
            .into_iter()
            .partition(|recipe| chosen.contains(&recipe.display_name));

        tracing::debug!("skipping recipes that were not selected");
        for recipe in &unselected {
            self.skip_recipe(recipe).await?;
        }

        Ok(selected)
    }

    async fn skip_recipe(&mut self, recipe: &Recipe) -> Result<(), Error> {
        let reported = self
            .status
            .recipe_skipped(&RecipeStatusEvent::new(recipe.clone()))
            .await;
        self.tolerate_report(reported, false)?;
        self.emit(AppEvent::Install(InstallEvent::RecipeSkipped {
            recipe: recipe.name.clone(),
        }));

        if recipe.name == LOGGING_RECIPE_NAME {
            self.context.skip_logging = true;
        }
        Ok(())
    }

    /// Report the application recipes left out of the install for the host
    async fn report_recommended(
        &mut self,
        recommended: &[Recipe],
        host_guid: &EntityGuid,
    ) -> Result<(), Error> {
        for recipe in recommended {
            if self.is_install_candidate(recipe) {
                continue;
            }
            let event =
                RecipeStatusEvent::new(recipe.clone()).with_entity_guid(Some(host_guid.clone()));
            let reported = self.status.recipe_recommended(&event).await;
            self.tolerate_report(reported, false)?;
        }
        Ok(())
    }

    async fn install_logging(
        &mut self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        logging: &mut Recipe,
        recipes: &[Recipe],
    ) -> Result<(), Error> {
        tracing::debug!(recipe_count = recipes.len(), "filtering log matches");
        let log_matches =
            cancellable(cancel, self.file_filterer.filter(cancel, recipes)).await?;
        tracing::debug!(possible_matches = log_matches.len(), "filtered log matches");

        let mut accepted = Vec::new();
        for log_match in log_matches {
            if self.user_accepts_log_file(cancel, &log_match).await? {
                accepted.push(log_match);
            }
        }

        let discovered_log_files = accepted
            .iter()
            .map(|log_match| log_match.file.as_str())
            .collect::<Vec<_>>()
            .join(",");
        tracing::debug!(
            accepted = accepted.len(),
            files = %discovered_log_files,
            "discovered log files"
        );
        logging.set_recipe_var(DISCOVERED_LOG_FILES_VAR, discovered_log_files);

        self.execute_and_validate(cancel, manifest, logging, true)
            .await
            .map(|_| ())
    }

    async fn user_accepts_log_file(
        &self,
        cancel: &CancellationToken,
        log_match: &LogMatch,
    ) -> Result<bool, Error> {
        if self.context.assume_yes {
            return Ok(true);
        }

        let message = format!(
            "Files have been found at the following pattern: {} Do you want to watch them?",
            log_match.file
        );
        cancellable(cancel, self.prompter.prompt_yes_no(&message)).await
    }

    /// Install the optional recipes, warning about failures
    async fn install_recipes(
        &mut self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipes: &[Recipe],
    ) -> Result<(), Error> {
        for recipe in recipes {
            match self.execute_and_validate(cancel, manifest, recipe, false).await {
                Ok(_) => {}
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        recipe = %recipe.name,
                        error = %err,
                        "{}",
                        fail_message(recipe)
                    );
                    self.emit_warning_with_context(fail_message(recipe), err.to_string());
                }
            }
        }
        Ok(())
    }

    /// Install one recipe and confirm it reports data
    ///
    /// Emits INSTALLING, then INSTALLED with the validated entity GUID,
    /// FAILED with the failure message, or CANCELED on interrupt. Status
    /// report failures only abort when `mandatory` is set.
    pub(crate) async fn execute_and_validate(
        &mut self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
        mandatory: bool,
    ) -> Result<Option<EntityGuid>, Error> {
        let reported = self
            .status
            .recipe_installing(&RecipeStatusEvent::new(recipe.clone()))
            .await;
        self.tolerate_report(reported, mandatory)?;
        self.emit(AppEvent::Install(InstallEvent::RecipeInstalling {
            recipe: recipe.name.clone(),
        }));

        match self.run_recipe(cancel, manifest, recipe).await {
            Ok(report) => {
                let event = RecipeStatusEvent::new(recipe.clone())
                    .with_entity_guid(report.entity_guid.clone())
                    .with_validation_duration(report.elapsed);
                let reported = self.status.recipe_installed(&event).await;
                self.tolerate_report(reported, mandatory)?;
                self.emit(AppEvent::Install(InstallEvent::RecipeInstalled {
                    recipe: recipe.name.clone(),
                    entity_guid: report.entity_guid.as_ref().map(ToString::to_string),
                }));
                Ok(report.entity_guid)
            }
            Err(err) if err.is_cancelled() => {
                let reported = self
                    .status
                    .recipe_canceled(&RecipeStatusEvent::new(recipe.clone()))
                    .await;
                self.warn_unreported(reported);
                self.emit(AppEvent::Install(InstallEvent::RecipeCanceled {
                    recipe: recipe.name.clone(),
                }));
                Err(err)
            }
            Err(err) => {
                let event = RecipeStatusEvent::new(recipe.clone()).with_message(err.to_string());
                let reported = self.status.recipe_failed(&event).await;
                self.warn_unreported(reported);
                self.emit(AppEvent::Install(InstallEvent::RecipeFailed {
                    recipe: recipe.name.clone(),
                    mandatory,
                    failure: FailureContext::from_error(&err),
                }));
                Err(err)
            }
        }
    }

    async fn run_recipe(
        &self,
        cancel: &CancellationToken,
        manifest: &DiscoveryManifest,
        recipe: &Recipe,
    ) -> Result<ValidationReport, Error> {
        let mut vars = cancellable(
            cancel,
            self.recipe_executor
                .prepare(cancel, manifest, recipe, self.context.assume_yes),
        )
        .await
        .map_err(|err| Self::execution_error(recipe, err))?;
        vars.extend(recipe.vars.clone());

        cancellable(
            cancel,
            self.recipe_executor.execute(cancel, manifest, recipe, &vars),
        )
        .await
        .map_err(|err| Self::execution_error(recipe, err))?;

        if !recipe.has_validation() {
            tracing::debug!(
                recipe = %recipe.name,
                "skipping validation due to missing validation query"
            );
        }
        cancellable(cancel, self.recipe_validator.validate(cancel, recipe)).await
    }
}

fn fail_message(recipe: &Recipe) -> String {
    format!(
        "We encountered an issue while installing {}.",
        recipe.display_name
    )
}
