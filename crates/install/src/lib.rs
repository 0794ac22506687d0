#![warn(clippy::pedantic)]
#![deny(clippy::all)]

//! Guided recipe installation for waypoint
//!
//! This crate sequences a guided install: discovery, recipe fetch,
//! selection, execution and validation, reporting every transition through
//! an [`InstallStatus`](waypoint_status::InstallStatus). The capabilities it
//! drives (discovery, the recipe catalog, log file matching, recipe
//! execution, prompting) are traits so callers and tests can plug in their
//! own implementations.

#[macro_use]
mod macros;
mod api;
mod guided;
mod installer;
pub mod mocks;
pub mod scenario;

pub use installer::{Collaborators, RecipeInstaller};
pub use scenario::{ScenarioBuilder, TestScenario};

// Re-export the public API surface from api module
pub use api::collaborators::{Discoverer, FileFilterer, Prompter, RecipeExecutor, RecipeFetcher};
pub use api::context::InstallerContext;
pub use api::result::InstallSummary;

// Re-export EventSender for use by macros and contexts
pub use waypoint_events::EventSender;
