#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the waypoint guided installer
//!
//! This crate provides the data shared by every other crate: recipes as
//! fetched from the catalog, the discovery manifest describing the host, and
//! the identifiers assigned to monitored entities.

pub mod entity;
pub mod manifest;
pub mod recipe;

// Re-export commonly used types
pub use entity::EntityGuid;
pub use manifest::{DiscoveredProcess, DiscoveryManifest};
pub use recipe::{
    LogMatch, Recipe, RecipeVars, SuccessLinkConfig, SuccessLinkType, TargetType,
    DISCOVERED_LOG_FILES_VAR, INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME,
};

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    #[default]
    Tty,
    Json,
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}
