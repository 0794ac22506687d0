//! Success link generation

use url::form_urlencoded;
use waypoint_types::SuccessLinkType;

use crate::state::{InstallState, RecipeStatusType};

/// Derives the link shown to the user once the install completes
pub trait SuccessLinkGenerator: Send + Sync {
    /// `None` when there is nothing to link to
    fn generate(&self, state: &InstallState) -> Option<String>;
}

/// Links into the observability platform UI
#[derive(Debug, Clone)]
pub struct ConcreteSuccessLinkGenerator {
    platform_url: String,
}

impl ConcreteSuccessLinkGenerator {
    #[must_use]
    pub fn new(platform_url: impl Into<String>) -> Self {
        let platform_url = platform_url.into();
        Self {
            platform_url: platform_url.trim_end_matches('/').to_string(),
        }
    }

    /// Entity explorer filtered by `filter`
    #[must_use]
    pub fn explorer_link(&self, filter: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(filter.as_bytes()).collect();
        format!(
            "{}/launcher/nr1-core.explorer?platform[filters]={encoded}",
            self.platform_url
        )
    }

    /// Redirect to a single entity
    #[must_use]
    pub fn entity_link(&self, guid: &str) -> String {
        format!("{}/redirect/entity/{guid}", self.platform_url)
    }
}

impl SuccessLinkGenerator for ConcreteSuccessLinkGenerator {
    fn generate(&self, state: &InstallState) -> Option<String> {
        let explorer_filter = state
            .recipes_with_status(RecipeStatusType::Installed)
            .filter_map(|entry| entry.success_link.as_ref())
            .find(|config| config.link_type == SuccessLinkType::Explorer)
            .map(|config| config.filter.clone().unwrap_or_default());

        if let Some(filter) = explorer_filter {
            return Some(self.explorer_link(&filter));
        }

        state
            .entity_guids()
            .first()
            .map(|guid| self.entity_link(guid.as_str()))
    }
}
