use serde::{Deserialize, Serialize};

/// Status fan-out events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StatusEvent {
    /// A subscriber failed to record a transition; the others were still notified
    SubscriberFailed {
        subscriber: String,
        operation: String,
        error: String,
    },

    /// Remote status document written
    DocumentWritten {
        scope: String,
        document_id: String,
    },
}
