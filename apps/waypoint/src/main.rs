//! waypoint - guided installer for monitoring agents and integrations
//!
//! This is the CLI application that wires the guided install workflow to
//! the terminal: configuration, status subscribers, prompts, cancellation
//! and rendering of the final summary.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod prompt;

use crate::cli::{Cli, Commands, InstallArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::prompt::DialoguerPrompter;
use clap::Parser;
use std::process;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use waypoint_config::Config;
use waypoint_events::EventReceiver;
use waypoint_install::{
    InstallSummary, InstallerContext, RecipeInstaller, ScenarioBuilder, TestScenario,
};
use waypoint_status::{MemoryDocumentStore, ScopedStatusReporter, TerminalStatusReporter};
use waypoint_types::{ColorChoice, OutputFormat};

/// Exit status used when the user interrupts an install
const EXIT_CANCELLED: i32 = 130;

const DEBUG_LOG_FILTER: &str = "info,waypoint=debug,waypoint_install=debug";

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        if e.is_cancelled() {
            warn!("Install interrupted");
            if !json_mode {
                eprintln!("Installation canceled.");
            }
            process::exit(EXIT_CANCELLED);
        }
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting waypoint v{}", env!("CARGO_PKG_VERSION"));

    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global, &cli.command)?;

    let json_output = cli.global.json || config.general.default_output == OutputFormat::Json;
    let renderer = OutputRenderer::new(json_output, config.general.color);

    match cli.command {
        Commands::Scenarios => {
            renderer.render_scenarios(&TestScenario::ALL)?;
        }
        Commands::Install(args) => {
            let (event_sender, event_receiver) = waypoint_events::channel();
            let mut installer = build_installer(&args, &config, json_output, event_sender);
            let mut event_handler =
                EventHandler::new(renderer.supports_color(), cli.global.debug);

            let cancel = CancellationToken::new();
            spawn_interrupt_handler(cancel.clone());

            let summary = execute_install_with_events(
                &mut installer,
                &cancel,
                event_receiver,
                &mut event_handler,
            )
            .await?;

            renderer.render_summary(&summary)?;
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Assemble the installer for a scripted scenario with the configured subscribers
fn build_installer(
    args: &InstallArgs,
    config: &Config,
    json_output: bool,
    event_sender: waypoint_events::EventSender,
) -> RecipeInstaller {
    let context = InstallerContext::new()
        .with_assume_yes(args.assume_yes)
        .with_skip_integrations(args.skip_integrations)
        .with_skip_apm(args.skip_apm)
        .with_skip_logging(args.skip_logging)
        .with_skip_discovery(args.skip_discovery)
        .with_skip_infra(args.skip_infra)
        .with_include_application_targets(args.include_application_targets)
        .with_event_sender(event_sender.clone());

    let mut builder = ScenarioBuilder::new(context)
        .with_config(config)
        .with_prompter(Box::new(DialoguerPrompter));

    if !json_output {
        builder = builder.with_subscriber(Box::new(TerminalStatusReporter::new(
            config.general.color,
        )));
    }

    // Scenario runs are scripted; their documents never leave the process.
    builder = builder.with_subscriber(Box::new(
        ScopedStatusReporter::new(MemoryDocumentStore::new()).with_event_sender(event_sender),
    ));

    builder.build(args.scenario)
}

/// Cancel the install on the first interrupt
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, canceling install");
            cancel.cancel();
        }
    });
}

/// Run the install while handling events concurrently
async fn execute_install_with_events(
    installer: &mut RecipeInstaller,
    cancel: &CancellationToken,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<InstallSummary, CliError> {
    let mut install_future = Box::pin(installer.install(cancel));

    loop {
        select! {
            result = &mut install_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result.map_err(CliError::from);
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Some(log_file) = create_log_file() {
            match std::fs::File::create(&log_file) {
                Ok(file) => {
                    tracing_subscriber::fmt()
                        .json()
                        .with_writer(file)
                        .with_env_filter(
                            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                                |_| tracing_subscriber::EnvFilter::new(DEBUG_LOG_FILTER),
                            ),
                        )
                        .init();

                    if !json_mode {
                        eprintln!("Debug logging enabled: {}", log_file.display());
                    }
                    return;
                }
                Err(e) => {
                    if !json_mode {
                        eprintln!("Warning: Failed to create log file: {e}");
                    }
                }
            }
        }
    }

    if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,waypoint=warn")),
            )
            .init();
    }
}

/// Path of a fresh timestamped log file under the user's state directory
fn create_log_file() -> Option<std::path::PathBuf> {
    let log_dir = dirs::state_dir()
        .or_else(dirs::data_local_dir)?
        .join("waypoint")
        .join("logs");

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {e}");
        return None;
    }

    Some(log_dir.join(format!(
        "waypoint-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    )))
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(
    config: &mut Config,
    global: &cli::GlobalArgs,
    command: &Commands,
) -> Result<(), CliError> {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if global.json {
        config.general.color = ColorChoice::Never;
    }

    if let Commands::Install(args) = command {
        if let Some(max_attempts) = args.validation_max_attempts {
            if max_attempts == 0 {
                return Err(CliError::InvalidArguments(
                    "--validation-max-attempts must be at least 1".to_string(),
                ));
            }
            config.validation.max_attempts = max_attempts;
        }
        if let Some(interval) = args.validation_interval {
            config.validation.interval_secs = interval;
        }
    }

    Ok(())
}
