//! Installation recipes as served by the catalog
//!
//! A recipe is an installable unit: the host agent, the logging integration,
//! or any on-host or application integration. Recipes are immutable once
//! fetched except for the variables injected right before execution.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the host agent recipe installed first in every guided run
pub const INFRA_AGENT_RECIPE_NAME: &str = "infrastructure-agent-installer";

/// Name of the logging recipe installed right after the host agent
pub const LOGGING_RECIPE_NAME: &str = "logs-integration";

/// Variable receiving the comma-separated list of accepted log files
pub const DISCOVERED_LOG_FILES_VAR: &str = "NR_DISCOVERED_LOG_FILES";

/// Variables resolved for a recipe before its install steps run
pub type RecipeVars = BTreeMap<String, String>;

/// What kind of resource a recipe instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    #[default]
    Host,
    /// Needs a known entity context (an application running on the host)
    Application,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Application => write!(f, "application"),
        }
    }
}

/// Log file pattern a recipe knows how to forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMatch {
    pub name: String,
    pub file: String,
}

impl LogMatch {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}

/// Kind of link shown to the user once the install succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessLinkType {
    Host,
    Explorer,
}

/// Success link customisation carried by a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessLinkConfig {
    #[serde(rename = "type")]
    pub link_type: SuccessLinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// An installable unit fetched from the recipe catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique recipe name
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_type: TargetType,
    /// Classification keywords, e.g. `apm`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Query confirming the recipe reports data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_nrql: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_match: Vec<LogMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_link: Option<SuccessLinkConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_install_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_install_info: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: RecipeVars,
}

impl Recipe {
    /// Create a host-targeted recipe with no validation query
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: String::new(),
            target_type: TargetType::Host,
            keywords: Vec::new(),
            validation_nrql: None,
            log_match: Vec::new(),
            success_link: None,
            pre_install_info: None,
            post_install_info: None,
            vars: RecipeVars::new(),
        }
    }

    #[must_use]
    pub fn with_validation_nrql(mut self, nrql: impl Into<String>) -> Self {
        self.validation_nrql = Some(nrql.into());
        self
    }

    #[must_use]
    pub fn with_target_type(mut self, target_type: TargetType) -> Self {
        self.target_type = target_type;
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    #[must_use]
    pub fn with_log_match(mut self, log_match: LogMatch) -> Self {
        self.log_match.push(log_match);
        self
    }

    #[must_use]
    pub fn with_success_link(mut self, config: SuccessLinkConfig) -> Self {
        self.success_link = Some(config);
        self
    }

    #[must_use]
    pub fn has_application_target_type(&self) -> bool {
        self.target_type == TargetType::Application
    }

    /// APM recipes instrument an application but can be installed directly
    #[must_use]
    pub fn is_apm(&self) -> bool {
        self.keywords.iter().any(|k| k.eq_ignore_ascii_case("apm"))
    }

    /// Host agent or logging recipe
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        self.name == INFRA_AGENT_RECIPE_NAME || self.name == LOGGING_RECIPE_NAME
    }

    #[must_use]
    pub fn has_validation(&self) -> bool {
        self.validation_nrql
            .as_deref()
            .is_some_and(|nrql| !nrql.trim().is_empty())
    }

    pub fn set_recipe_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)
    }
}
