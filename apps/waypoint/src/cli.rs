//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use waypoint_install::TestScenario;
use waypoint_types::ColorChoice;

/// waypoint - guided installer for monitoring agents and integrations
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Guided installer for monitoring agents and integrations")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the waypoint log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a guided install
    #[command(alias = "i")]
    Install(InstallArgs),

    /// List the scripted install scenarios
    Scenarios,
}

#[derive(Args)]
pub struct InstallArgs {
    /// Scripted install to run (see `waypoint scenarios`)
    #[arg(long, value_name = "NAME")]
    pub scenario: TestScenario,

    /// Accept every prompt
    #[arg(short = 'y', long)]
    pub assume_yes: bool,

    /// Skip every integration
    #[arg(long)]
    pub skip_integrations: bool,

    /// Skip APM recipes
    #[arg(long)]
    pub skip_apm: bool,

    /// Do not install the logging recipe
    #[arg(long)]
    pub skip_logging: bool,

    /// Do not fetch recommendations for the host
    #[arg(long)]
    pub skip_discovery: bool,

    /// Skip the host agent (targeted installs only)
    #[arg(long)]
    pub skip_infra: bool,

    /// Offer application-targeted recipes for install
    #[arg(long)]
    pub include_application_targets: bool,

    /// Maximum validation queries per recipe
    #[arg(long, value_name = "N")]
    pub validation_max_attempts: Option<u32>,

    /// Seconds between validation queries
    #[arg(long, value_name = "SECS")]
    pub validation_interval: Option<u64>,
}
