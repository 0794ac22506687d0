use serde::{Deserialize, Serialize};
use std::fmt;

use super::FailureContext;

/// Phases of the guided install workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Discovery,
    Fetch,
    Selection,
    HostAgent,
    Logging,
    Integrations,
}

impl fmt::Display for InstallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discovery => "discovery",
            Self::Fetch => "fetch",
            Self::Selection => "selection",
            Self::HostAgent => "host agent",
            Self::Logging => "logging",
            Self::Integrations => "integrations",
        };
        f.write_str(name)
    }
}

/// Guided install workflow events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    PhaseStarted {
        phase: InstallPhase,
    },

    RecipeInstalling {
        recipe: String,
    },

    RecipeInstalled {
        recipe: String,
        entity_guid: Option<String>,
    },

    RecipeFailed {
        recipe: String,
        mandatory: bool,
        failure: FailureContext,
    },

    RecipeSkipped {
        recipe: String,
    },

    RecipeCanceled {
        recipe: String,
    },

    /// The run ended with every mandatory recipe installed
    Completed {
        installed: usize,
        failed: usize,
        skipped: usize,
    },

    Canceled,

    Failed {
        failure: FailureContext,
    },
}
