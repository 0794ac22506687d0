//! Identifiers for monitored entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the backend to a monitored resource once its
/// telemetry has been confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityGuid(String);

impl EntityGuid {
    /// Wrap a raw GUID string
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank GUIDs are never registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EntityGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityGuid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityGuid {
    fn from(value: String) -> Self {
        Self(value)
    }
}
