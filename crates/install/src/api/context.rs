use crate::EventSender;

/// Flags steering the guided install
#[derive(Clone, Debug)]
pub struct InstallerContext {
    /// Accept every prompt with its default answer
    pub assume_yes: bool,
    /// Report every integration as skipped
    pub skip_integrations: bool,
    /// Report APM recipes as skipped
    pub skip_apm: bool,
    /// Report the logging recipe as skipped and never run it
    pub skip_logging: bool,
    /// Do not ask the catalog for recommendations
    pub skip_discovery: bool,
    /// Only valid for targeted installs; the guided workflow rejects it
    pub skip_infra: bool,
    /// Offer application-targeted recipes even when they are not APM
    pub include_application_targets: bool,

    /// Event sender for progress reporting
    pub event_sender: Option<EventSender>,
}

context_builder! {
    InstallerContext {
        assume_yes: bool,
        skip_integrations: bool,
        skip_apm: bool,
        skip_logging: bool,
        skip_discovery: bool,
        skip_infra: bool,
        include_application_targets: bool,
    }
}

impl InstallerContext {
    #[must_use]
    pub fn should_install_logging(&self) -> bool {
        !self.skip_logging
    }

    #[must_use]
    pub fn should_install_integrations(&self) -> bool {
        !self.skip_integrations
    }
}
