//! Human-readable status lines for the terminal

use async_trait::async_trait;
use console::{Style, Term};
use waypoint_errors::{Error, UserFacingError};
use waypoint_types::ColorChoice;

use crate::state::{InstallState, RecipeStatusType};
use crate::subscriber::{StatusSubscriber, StatusUpdate};

/// Prints one or more lines per transition to stdout
#[derive(Clone)]
pub struct TerminalStatusReporter {
    color_choice: ColorChoice,
    term: Term,
}

impl TerminalStatusReporter {
    #[must_use]
    pub fn new(color_choice: ColorChoice) -> Self {
        Self {
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Lines printed for `update`
    #[must_use]
    pub fn render(&self, state: &InstallState, update: StatusUpdate<'_>) -> Vec<String> {
        match update {
            StatusUpdate::DiscoveryComplete(_) | StatusUpdate::RecipesAvailable(_) => Vec::new(),
            StatusUpdate::RecipesSelected(recipes) => {
                let mut lines = vec![self.bold("The following will be installed:")];
                lines.extend(recipes.iter().map(|r| format!("  {}", r.display_name)));
                lines
            }
            StatusUpdate::RecipeRecommended(event) => vec![format!(
                "{} {} can be instrumented for this host",
                self.tag("RECOMMENDED", &Style::new().cyan()),
                event.recipe.display_name
            )],
            StatusUpdate::RecipeInstalling(event) => {
                vec![format!("Installing {}...", event.recipe.display_name)]
            }
            StatusUpdate::RecipeInstalled(event) => vec![format!(
                "{} {} installed",
                self.tag("OK", &Style::new().green()),
                event.recipe.display_name
            )],
            StatusUpdate::RecipeFailed(event) => {
                let reason = event.message.as_deref().unwrap_or("unknown error");
                vec![format!(
                    "{} {}: {reason}",
                    self.tag("FAILED", &Style::new().red()),
                    event.recipe.display_name
                )]
            }
            StatusUpdate::RecipeSkipped(event) => vec![format!(
                "{} {}",
                self.tag("SKIPPED", &Style::new().yellow()),
                event.recipe.display_name
            )],
            StatusUpdate::RecipeCanceled(event) => vec![format!(
                "{} {}",
                self.tag("CANCELED", &Style::new().yellow()),
                event.recipe.display_name
            )],
            StatusUpdate::InstallComplete => self.summary(state),
            StatusUpdate::InstallCanceled => vec!["Installation canceled.".to_string()],
            StatusUpdate::InstallFailed(error) => {
                let mut lines = vec![format!(
                    "{} {}",
                    self.tag("ERROR", &Style::new().red().bold()),
                    error.user_message()
                )];
                if let Some(hint) = error.user_hint() {
                    lines.push(format!("  hint: {hint}"));
                }
                lines
            }
        }
    }

    fn summary(&self, state: &InstallState) -> Vec<String> {
        let count = |status| state.recipes_with_status(status).count();
        let mut lines = vec![
            String::new(),
            self.bold("Installation complete"),
            format!(
                "  {} installed, {} failed, {} skipped",
                count(RecipeStatusType::Installed),
                count(RecipeStatusType::Failed),
                count(RecipeStatusType::Skipped)
            ),
        ];
        for entry in state.recipes_with_status(RecipeStatusType::Failed) {
            lines.push(format!("  failed: {}", entry.display_name));
        }
        if let Some(link) = state.success_link() {
            lines.push(format!("  View your data at {link}"));
        }
        lines
    }

    fn tag(&self, label: &str, style: &Style) -> String {
        let tag = format!("[{label}]");
        if self.supports_color() {
            style.apply_to(tag).to_string()
        } else {
            tag
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.supports_color() {
            Style::new().bold().apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

#[async_trait]
impl StatusSubscriber for TerminalStatusReporter {
    fn name(&self) -> &'static str {
        "terminal"
    }

    async fn notify(&self, state: &InstallState, update: StatusUpdate<'_>) -> Result<(), Error> {
        for line in self.render(state, update) {
            self.term.write_line(&line)?;
        }
        Ok(())
    }
}
