use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Telemetry validation polling events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValidationEvent {
    Started {
        recipe: String,
        max_attempts: u32,
    },

    /// One query round-trip finished without a match
    AttemptCompleted {
        recipe: String,
        attempt: u32,
        rows: usize,
    },

    Succeeded {
        recipe: String,
        attempts: u32,
        entity_guid: Option<String>,
        elapsed: Duration,
    },

    Exhausted {
        recipe: String,
        attempts: u32,
    },

    Canceled {
        recipe: String,
        attempts: u32,
    },
}
