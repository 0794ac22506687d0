//! Scripted installs assembled entirely from in-memory collaborators
//!
//! Used by the test suite and by `waypoint install --scenario` to exercise
//! the status subscribers and the terminal output without touching a host.

use std::fmt;
use std::str::FromStr;

use waypoint_config::{Config, ValidationConfig};
use waypoint_errors::{Error, InstallError};
use waypoint_status::{
    ConcreteSuccessLinkGenerator, InstallStatus, StatusSubscriber, SuccessLinkGenerator,
};
use waypoint_types::{
    DiscoveryManifest, LogMatch, Recipe, SuccessLinkConfig, SuccessLinkType,
    INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME,
};
use waypoint_validation::{MockQueryClient, PollingRecipeValidator};

use crate::mocks::{
    MockDiscoverer, MockFileFilterer, MockPrompter, MockRecipeExecutor, MockRecipeFetcher,
};
use crate::{Collaborators, InstallerContext, Prompter, RecipeInstaller};

const MOCK_HOST_GUID: &str = "MTIzNDU2fElORlJBfE5BfDEyMzQ1";
const CANCELED_RECIPE_NAME: &str = "test-canceled-installation";
const EXPLORER_RECIPE_NAME: &str = "test-display-explorer-link";

/// Named scripted installs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestScenario {
    /// Everything installs and validates on the second query
    Basic,
    /// Like `Basic`, with a discovered log file offered for the logging recipe
    LogMatches,
    /// Every recipe fails to execute, so the host agent aborts the run
    Fail,
    /// An integration is interrupted while installing
    Canceled,
    /// An integration carries an explorer success link
    DisplayExplorerLink,
}

impl TestScenario {
    pub const ALL: [Self; 5] = [
        Self::Basic,
        Self::LogMatches,
        Self::Fail,
        Self::Canceled,
        Self::DisplayExplorerLink,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::LogMatches => "LOG_MATCHES",
            Self::Fail => "FAIL",
            Self::Canceled => "CANCELED",
            Self::DisplayExplorerLink => "DISPLAY_EXPLORER_LINK",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Basic => "host agent, logging and one integration install successfully",
            Self::LogMatches => "a discovered log file is offered to the logging recipe",
            Self::Fail => "the host agent fails and the install aborts",
            Self::Canceled => "an integration is interrupted mid-install",
            Self::DisplayExplorerLink => "completion links to a filtered entity explorer",
        }
    }
}

impl fmt::Display for TestScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestScenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == normalized)
            .ok_or_else(|| {
                InstallError::InvalidOption {
                    message: format!(
                        "unknown scenario '{s}', expected one of: {}",
                        Self::ALL.map(Self::as_str).join(", ")
                    ),
                }
                .into()
            })
    }
}

/// Builds a [`RecipeInstaller`] wired to mocks for a [`TestScenario`]
pub struct ScenarioBuilder {
    context: InstallerContext,
    subscribers: Vec<Box<dyn StatusSubscriber>>,
    prompter: Option<Box<dyn Prompter>>,
    platform_url: String,
    validation: ValidationConfig,
}

impl ScenarioBuilder {
    #[must_use]
    pub fn new(context: InstallerContext) -> Self {
        let config = Config::default();
        Self {
            context,
            subscribers: Vec::new(),
            prompter: None,
            platform_url: config.links.platform_url.clone(),
            validation: config.validation_config(),
        }
    }

    /// Take the link target and validation polling from `config`
    #[must_use]
    pub fn with_config(mut self, config: &Config) -> Self {
        self.platform_url.clone_from(&config.links.platform_url);
        self.validation = config.validation_config();
        self
    }

    #[must_use]
    pub fn with_validation_config(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_subscriber(mut self, subscriber: Box<dyn StatusSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Answer prompts interactively instead of accepting everything
    #[must_use]
    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = Some(prompter);
        self
    }

    #[must_use]
    pub fn build(self, scenario: TestScenario) -> RecipeInstaller {
        let (fetcher, filterer, executor) = match scenario {
            TestScenario::Basic => (
                guided_install_fetcher(),
                MockFileFilterer::default(),
                MockRecipeExecutor::new(),
            ),
            TestScenario::LogMatches => (
                guided_install_fetcher(),
                MockFileFilterer::new(vec![LogMatch::new("asdf", "asdf")]),
                MockRecipeExecutor::new(),
            ),
            TestScenario::Fail => (
                guided_install_fetcher(),
                MockFileFilterer::default(),
                MockRecipeExecutor::failing("exit status 1"),
            ),
            TestScenario::Canceled => (
                mandatory_recipes().with_recommendation(
                    Recipe::new(CANCELED_RECIPE_NAME, "Test Canceled Installation")
                        .with_validation_nrql("test NRQL"),
                ),
                MockFileFilterer::default(),
                MockRecipeExecutor::interrupting(CANCELED_RECIPE_NAME),
            ),
            TestScenario::DisplayExplorerLink => (
                mandatory_recipes().with_recommendation(
                    Recipe::new(EXPLORER_RECIPE_NAME, "Test Display Explorer Link")
                        .with_validation_nrql("test NRQL")
                        .with_success_link(SuccessLinkConfig {
                            link_type: SuccessLinkType::Explorer,
                            filter: Some("\"`tags.language` = 'java'\"".to_string()),
                        }),
                ),
                MockFileFilterer::default(),
                MockRecipeExecutor::new(),
            ),
        };

        tracing::debug!(%scenario, "building test scenario");

        let query_client = MockQueryClient::return_results_after_n_attempts(2)
            .with_entity_guid(MOCK_HOST_GUID);
        let mut validator = PollingRecipeValidator::new(query_client, self.validation);
        if let Some(tx) = self.context.event_sender.clone() {
            validator = validator.with_event_sender(tx);
        }

        let link_generator: Box<dyn SuccessLinkGenerator> =
            Box::new(ConcreteSuccessLinkGenerator::new(self.platform_url));
        let status = InstallStatus::new(self.subscribers, link_generator);

        let collaborators = Collaborators {
            discoverer: Box::new(MockDiscoverer::new(DiscoveryManifest::for_host(
                "scenario-host",
            ))),
            recipe_fetcher: Box::new(fetcher),
            file_filterer: Box::new(filterer),
            recipe_executor: Box::new(executor),
            recipe_validator: Box::new(validator),
            prompter: self
                .prompter
                .unwrap_or_else(|| Box::new(MockPrompter::new())),
        };

        RecipeInstaller::new(self.context, collaborators, status)
    }
}

fn mandatory_recipes() -> MockRecipeFetcher {
    MockRecipeFetcher::new()
        .with_recipe(Recipe {
            pre_install_info: Some(
                "This is the Infrastructure Agent Installer preinstall message.".to_string(),
            ),
            post_install_info: Some(
                "This is the Infrastructure Agent Installer postinstall message.".to_string(),
            ),
            ..Recipe::new(INFRA_AGENT_RECIPE_NAME, "Infrastructure Agent")
                .with_validation_nrql("test NRQL")
        })
        .with_recipe(
            Recipe::new(LOGGING_RECIPE_NAME, "Logs integration")
                .with_validation_nrql("test NRQL")
                .with_log_match(LogMatch::new(
                    "docker log",
                    "/var/lib/docker/containers/*/*.log",
                )),
        )
}

fn guided_install_fetcher() -> MockRecipeFetcher {
    mandatory_recipes().with_recommendation(
        Recipe::new("recommended-recipe", "Recommended recipe").with_validation_nrql("test NRQL"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names_parse_leniently() {
        assert_eq!(
            "log-matches".parse::<TestScenario>().unwrap(),
            TestScenario::LogMatches
        );
        assert_eq!(
            "DISPLAY_EXPLORER_LINK".parse::<TestScenario>().unwrap(),
            TestScenario::DisplayExplorerLink
        );
        assert!(matches!(
            "stitched_path".parse::<TestScenario>(),
            Err(Error::Install(InstallError::InvalidOption { .. }))
        ));
    }
}
