#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Install status aggregation and fan-out
//!
//! [`InstallStatus`] owns the evolving state of one guided install and
//! forwards every transition to an ordered list of [`StatusSubscriber`]s:
//! the terminal reporter, the remote scoped document reporter, and the
//! recording reporter used by tests.

mod install_status;
pub mod link;
pub mod recording;
pub mod scoped;
mod state;
mod subscriber;
pub mod terminal;

pub use install_status::InstallStatus;
pub use link::{ConcreteSuccessLinkGenerator, SuccessLinkGenerator};
pub use recording::{RecordedUpdate, RecordingStatusReporter};
pub use scoped::{
    DocumentStore, MemoryDocumentStore, ScopedStatusReporter, StatusScope, StoredDocument,
    DEFAULT_STATUS_COLLECTION,
};
pub use state::{
    InstallOutcome, InstallState, RecipeStatusEntry, RecipeStatusEvent, RecipeStatusType,
};
pub use subscriber::{StatusSubscriber, StatusUpdate};
pub use terminal::TerminalStatusReporter;
