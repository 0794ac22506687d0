use waypoint_status::{InstallState, RecipeStatusType};

/// What a finished guided install did, by recipe name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub installed: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
    pub success_link: Option<String>,
}

impl InstallSummary {
    /// Collect the per-recipe outcomes recorded on the install state
    #[must_use]
    pub fn from_state(state: &InstallState) -> Self {
        let names = |status: RecipeStatusType| {
            state
                .recipes_with_status(status)
                .map(|entry| entry.name.clone())
                .collect::<Vec<_>>()
        };

        Self {
            installed: names(RecipeStatusType::Installed),
            failed: names(RecipeStatusType::Failed),
            skipped: names(RecipeStatusType::Skipped),
            success_link: state.success_link().map(str::to_string),
        }
    }

    /// Get total number of recipes that ran
    #[must_use]
    pub fn total_attempted(&self) -> usize {
        self.installed.len() + self.failed.len()
    }
}
