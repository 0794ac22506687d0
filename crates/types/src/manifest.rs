//! Host facts gathered by discovery

use serde::{Deserialize, Serialize};

/// Facts about the host used to select recipes from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryManifest {
    pub hostname: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub platform_family: String,
    #[serde(default)]
    pub platform_version: String,
    #[serde(default)]
    pub kernel_version: String,
    #[serde(default)]
    pub kernel_arch: String,
    /// Processes matched against the catalog during discovery
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovered_processes: Vec<DiscoveredProcess>,
}

/// A running process that matched at least one recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredProcess {
    pub pid: u32,
    pub name: String,
    #[serde(default)]
    pub cmdline: String,
    /// Recipe the process was matched to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_recipe: Option<String>,
}

impl DiscoveryManifest {
    /// Manifest with only a hostname, enough for status documents
    pub fn for_host(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }
}
