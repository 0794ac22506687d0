//! Scripted scenario tests

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use waypoint_config::ValidationConfig;
use waypoint_errors::{Error, InstallError};
use waypoint_install::{InstallerContext, RecipeInstaller, ScenarioBuilder, TestScenario};
use waypoint_status::{InstallOutcome, RecordingStatusReporter};
use waypoint_types::INFRA_AGENT_RECIPE_NAME;

fn build(scenario: TestScenario) -> (RecipeInstaller, RecordingStatusReporter) {
    let recorder = RecordingStatusReporter::new();
    let installer = ScenarioBuilder::new(InstallerContext::new().with_assume_yes(true))
        .with_validation_config(ValidationConfig::new(5, Duration::from_secs(5)))
        .with_subscriber(Box::new(recorder.clone()))
        .build(scenario);
    (installer, recorder)
}

#[tokio::test(start_paused = true)]
async fn test_basic_scenario_completes_with_entity_link() {
    let (mut installer, recorder) = build(TestScenario::Basic);

    let summary = installer.install(&CancellationToken::new()).await.unwrap();

    assert_eq!(
        summary.installed,
        vec![
            INFRA_AGENT_RECIPE_NAME.to_string(),
            "logs-integration".to_string(),
            "recommended-recipe".to_string(),
        ]
    );
    let link = summary.success_link.unwrap();
    assert!(link.ends_with("/redirect/entity/MTIzNDU2fElORlJBfE5BfDEyMzQ1"));
    assert_eq!(recorder.operations().last(), Some(&"install_complete"));
}

#[tokio::test(start_paused = true)]
async fn test_log_matches_scenario_reports_discovered_file() {
    let (mut installer, recorder) = build(TestScenario::LogMatches);

    installer.install(&CancellationToken::new()).await.unwrap();

    let logging_installed = recorder
        .updates()
        .into_iter()
        .find(|u| u.operation == "recipe_installed" && u.recipes == ["logs-integration"]);
    assert!(logging_installed.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_fail_scenario_aborts_on_host_agent() {
    let (mut installer, recorder) = build(TestScenario::Fail);

    let err = installer.install(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Install(InstallError::ExecutionFailed { .. })
    ));
    assert_eq!(recorder.recipes_for("recipe_failed"), vec![INFRA_AGENT_RECIPE_NAME]);
    assert_eq!(installer.status().state().outcome(), InstallOutcome::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_canceled_scenario_ends_canceled() {
    let (mut installer, recorder) = build(TestScenario::Canceled);

    let err = installer.install(&CancellationToken::new()).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(
        recorder.recipes_for("recipe_canceled"),
        vec!["test-canceled-installation"]
    );
    assert_eq!(installer.status().state().outcome(), InstallOutcome::Canceled);
    assert_eq!(installer.status().state().success_link(), None);
}

#[tokio::test(start_paused = true)]
async fn test_display_explorer_link_scenario() {
    let (mut installer, _recorder) = build(TestScenario::DisplayExplorerLink);

    let summary = installer.install(&CancellationToken::new()).await.unwrap();

    let link = summary.success_link.unwrap();
    assert!(link.contains("/launcher/nr1-core.explorer?platform[filters]="));
    assert!(link.contains("%60tags.language%60"));
}
