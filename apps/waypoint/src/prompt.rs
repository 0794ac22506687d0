//! Interactive prompts backed by dialoguer

use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Confirm, MultiSelect};
use waypoint_errors::{Error, InstallError};
use waypoint_install::Prompter;

/// Terminal prompter; dialoguer blocks, so every prompt runs on the blocking pool
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompter;

fn prompt_failed(e: impl std::fmt::Display) -> Error {
    InstallError::PromptFailed {
        message: e.to_string(),
    }
    .into()
}

#[async_trait]
impl Prompter for DialoguerPrompter {
    async fn prompt_yes_no(&self, message: &str) -> Result<bool, Error> {
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .default(true)
                .interact()
                .map_err(prompt_failed)
        })
        .await
        .map_err(prompt_failed)?
    }

    async fn multi_select(&self, message: &str, options: &[String]) -> Result<Vec<String>, Error> {
        let message = message.to_string();
        let options = options.to_vec();
        tokio::task::spawn_blocking(move || -> Result<Vec<String>, Error> {
            let defaults = vec![true; options.len()];
            let selections = MultiSelect::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .items(&options)
                .defaults(&defaults)
                .interact()
                .map_err(prompt_failed)?;

            Ok(selections
                .into_iter()
                .filter_map(|i| options.get(i).cloned())
                .collect())
        })
        .await
        .map_err(prompt_failed)?
    }
}
