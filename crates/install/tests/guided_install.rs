//! Guided install workflow tests

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use waypoint_config::ValidationConfig;
use waypoint_errors::{Error, InstallError};
use waypoint_events::{AppEvent, EventLevel, GeneralEvent};
use waypoint_install::mocks::{
    MockDiscoverer, MockFileFilterer, MockPrompter, MockRecipeExecutor, MockRecipeFetcher,
};
use waypoint_install::{Collaborators, InstallerContext, RecipeInstaller};
use waypoint_status::{
    ConcreteSuccessLinkGenerator, InstallOutcome, InstallStatus, RecordingStatusReporter,
};
use waypoint_types::{
    EntityGuid, LogMatch, Recipe, TargetType, DISCOVERED_LOG_FILES_VAR, INFRA_AGENT_RECIPE_NAME,
    LOGGING_RECIPE_NAME,
};
use waypoint_validation::{MockQueryClient, PollingRecipeValidator};

const HOST_GUID: &str = "HOST-GUID";

fn agent() -> Recipe {
    Recipe::new(INFRA_AGENT_RECIPE_NAME, "Infrastructure Agent")
        .with_validation_nrql("SELECT count(*) FROM SystemSample")
}

fn logging() -> Recipe {
    Recipe::new(LOGGING_RECIPE_NAME, "Logs integration")
        .with_validation_nrql("SELECT count(*) FROM Log")
}

fn integration(name: &str, display_name: &str) -> Recipe {
    Recipe::new(name, display_name).with_validation_nrql("SELECT count(*) FROM Sample")
}

fn fetcher(recommendations: Vec<Recipe>) -> MockRecipeFetcher {
    recommendations.into_iter().fold(
        MockRecipeFetcher::new().with_recipe(agent()).with_recipe(logging()),
        MockRecipeFetcher::with_recommendation,
    )
}

struct Harness {
    installer: RecipeInstaller,
    recorder: RecordingStatusReporter,
    executor: MockRecipeExecutor,
    prompter: MockPrompter,
    fetcher: MockRecipeFetcher,
}

impl Harness {
    fn new(
        context: InstallerContext,
        fetcher: MockRecipeFetcher,
        executor: MockRecipeExecutor,
        prompter: MockPrompter,
        filterer: MockFileFilterer,
    ) -> Self {
        Self::with_recorder(
            context,
            fetcher,
            executor,
            prompter,
            filterer,
            RecordingStatusReporter::new(),
        )
    }

    fn with_recorder(
        context: InstallerContext,
        fetcher: MockRecipeFetcher,
        executor: MockRecipeExecutor,
        prompter: MockPrompter,
        filterer: MockFileFilterer,
        recorder: RecordingStatusReporter,
    ) -> Self {
        let validator = PollingRecipeValidator::new(
            MockQueryClient::default().with_entity_guid(HOST_GUID),
            ValidationConfig::new(3, Duration::from_millis(10)),
        );
        let status = InstallStatus::new(
            vec![Box::new(recorder.clone())],
            Box::new(ConcreteSuccessLinkGenerator::new("https://one.example.com")),
        );
        let collaborators = Collaborators {
            discoverer: Box::new(MockDiscoverer::default()),
            recipe_fetcher: Box::new(fetcher.clone()),
            file_filterer: Box::new(filterer),
            recipe_executor: Box::new(executor.clone()),
            recipe_validator: Box::new(validator),
            prompter: Box::new(prompter.clone()),
        };

        Self {
            installer: RecipeInstaller::new(context, collaborators, status),
            recorder,
            executor,
            prompter,
            fetcher,
        }
    }

    fn simple(context: InstallerContext, recommendations: Vec<Recipe>) -> Self {
        Self::new(
            context,
            fetcher(recommendations),
            MockRecipeExecutor::new(),
            MockPrompter::new(),
            MockFileFilterer::default(),
        )
    }

    fn count(&self, operation: &str, recipe: &str) -> usize {
        self.recorder
            .sequence()
            .into_iter()
            .filter(|(op, recipes)| *op == operation && recipes.iter().any(|r| r == recipe))
            .count()
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[tokio::test]
async fn test_end_to_end_status_sequence() {
    let recipes = vec![
        integration("recipe-a", "Recipe A"),
        integration("recipe-b", "Recipe B"),
    ];
    let mut harness = Harness::new(
        InstallerContext::new(),
        fetcher(recipes),
        MockRecipeExecutor::new(),
        MockPrompter::new().selecting(&["Logs integration", "Recipe A", "Recipe B"]),
        MockFileFilterer::default(),
    );

    let summary = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    let milestones: Vec<(&str, Vec<String>)> = harness
        .recorder
        .sequence()
        .into_iter()
        .filter(|(op, _)| {
            matches!(
                *op,
                "recipes_available" | "recipes_selected" | "recipe_installed" | "install_complete"
            )
        })
        .collect();
    assert_eq!(
        milestones,
        vec![
            (
                "recipes_available",
                names(&[INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME])
            ),
            (
                "recipes_selected",
                names(&[INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME, "recipe-a", "recipe-b"])
            ),
            ("recipe_installed", names(&[INFRA_AGENT_RECIPE_NAME])),
            ("recipe_installed", names(&[LOGGING_RECIPE_NAME])),
            ("recipe_installed", names(&["recipe-a"])),
            ("recipe_installed", names(&["recipe-b"])),
            ("install_complete", Vec::new()),
        ]
    );

    for recipe in ["recipe-a", "recipe-b"] {
        assert_eq!(harness.count("recipe_failed", recipe), 0);
        assert_eq!(harness.count("recipe_skipped", recipe), 0);
    }
    assert_eq!(summary.installed.len(), 4);
    assert!(summary.failed.is_empty());
    assert_eq!(
        summary.success_link.as_deref(),
        Some("https://one.example.com/redirect/entity/HOST-GUID")
    );
    assert_eq!(
        harness.installer.status().state().outcome(),
        InstallOutcome::Complete
    );
    assert_eq!(
        harness.prompter.prompts(),
        vec!["Please choose from the additional recommended instrumentation to be installed:"]
    );
}

#[tokio::test]
async fn test_assume_yes_selects_everything_without_prompting() {
    let mut harness = Harness::simple(
        InstallerContext::new().with_assume_yes(true),
        vec![integration("recipe-a", "Recipe A")],
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert!(harness.prompter.prompts().is_empty());
    assert_eq!(
        harness.executor.executed_names(),
        names(&[INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME, "recipe-a"])
    );
}

#[tokio::test]
async fn test_unselected_recipes_are_skipped() {
    let mut harness = Harness::new(
        InstallerContext::new(),
        fetcher(vec![
            integration("recipe-a", "Recipe A"),
            integration("recipe-b", "Recipe B"),
        ]),
        MockRecipeExecutor::new(),
        MockPrompter::new().selecting(&["Recipe B"]),
        MockFileFilterer::default(),
    );

    let summary = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        summary.skipped,
        names(&[LOGGING_RECIPE_NAME, "recipe-a"])
    );
    assert_eq!(
        harness.executor.executed_names(),
        names(&[INFRA_AGENT_RECIPE_NAME, "recipe-b"])
    );
}

#[tokio::test]
async fn test_accepted_log_files_are_passed_to_logging() {
    let mut harness = Harness::new(
        InstallerContext::new(),
        fetcher(Vec::new()),
        MockRecipeExecutor::new(),
        MockPrompter::new(),
        MockFileFilterer::new(vec![
            LogMatch::new("syslog", "/var/log/syslog"),
            LogMatch::new("nginx", "/var/log/nginx/*.log"),
        ]),
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    let executed = harness.executor.executed();
    let logging_run = executed
        .iter()
        .find(|e| e.name == LOGGING_RECIPE_NAME)
        .unwrap();
    assert_eq!(
        logging_run.vars.get(DISCOVERED_LOG_FILES_VAR).map(String::as_str),
        Some("/var/log/syslog,/var/log/nginx/*.log")
    );
    assert!(harness.prompter.prompts().contains(
        &"Files have been found at the following pattern: /var/log/syslog Do you want to watch them?"
            .to_string()
    ));
}

#[tokio::test]
async fn test_declined_log_files_leave_the_list_empty() {
    let mut harness = Harness::new(
        InstallerContext::new(),
        fetcher(Vec::new()),
        MockRecipeExecutor::new(),
        MockPrompter::new().answering(false),
        MockFileFilterer::new(vec![LogMatch::new("syslog", "/var/log/syslog")]),
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    let executed = harness.executor.executed();
    let logging_run = executed
        .iter()
        .find(|e| e.name == LOGGING_RECIPE_NAME)
        .unwrap();
    assert_eq!(
        logging_run.vars.get(DISCOVERED_LOG_FILES_VAR).map(String::as_str),
        Some("")
    );
}

#[tokio::test]
async fn test_mandatory_failure_aborts_before_optional_recipes() {
    let mut harness = Harness::new(
        InstallerContext::new().with_assume_yes(true),
        fetcher(vec![integration("recipe-a", "Recipe A")]),
        MockRecipeExecutor::failing_for(&[INFRA_AGENT_RECIPE_NAME], "exit status 1"),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    let err = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::Install(InstallError::ExecutionFailed { recipe, message }) => {
            assert_eq!(recipe, INFRA_AGENT_RECIPE_NAME);
            assert!(message.contains("exit status 1"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        harness.executor.executed_names(),
        names(&[INFRA_AGENT_RECIPE_NAME])
    );
    assert_eq!(harness.count("recipe_failed", INFRA_AGENT_RECIPE_NAME), 1);
    assert_eq!(harness.count("recipe_installing", "recipe-a"), 0);
    assert_eq!(harness.recorder.operations().last(), Some(&"install_failed"));
    assert_eq!(
        harness.installer.status().state().outcome(),
        InstallOutcome::Failed
    );
}

#[tokio::test]
async fn test_install_failure_emits_operation_failed() {
    let (tx, mut rx) = waypoint_events::channel();
    let mut harness = Harness::new(
        InstallerContext::new()
            .with_assume_yes(true)
            .with_event_sender(tx),
        fetcher(vec![]),
        MockRecipeExecutor::failing_for(&[INFRA_AGENT_RECIPE_NAME], "exit status 1"),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    let mut failed = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let AppEvent::General(GeneralEvent::OperationFailed { operation, failure }) =
            message.event
        {
            assert_eq!(message.meta.level, EventLevel::Error);
            failed.push((operation, failure));
        }
    }

    assert_eq!(failed.len(), 1);
    let (operation, failure) = &failed[0];
    assert_eq!(operation, "guided install");
    assert_eq!(failure.code.as_deref(), Some("install.execution_failed"));
    assert!(failure.message.contains("exit status 1"));
}

#[tokio::test]
async fn test_cancelled_install_does_not_emit_operation_failed() {
    let (tx, mut rx) = waypoint_events::channel();
    let mut harness = Harness::simple(
        InstallerContext::new()
            .with_assume_yes(true)
            .with_event_sender(tx),
        vec![],
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    harness.installer.install(&cancel).await.unwrap_err();

    while let Ok(message) = rx.try_recv() {
        assert!(!matches!(
            message.event,
            AppEvent::General(GeneralEvent::OperationFailed { .. })
        ));
    }
}

#[tokio::test]
async fn test_logging_failure_is_fatal() {
    let mut harness = Harness::new(
        InstallerContext::new().with_assume_yes(true),
        fetcher(vec![integration("recipe-a", "Recipe A")]),
        MockRecipeExecutor::failing_for(&[LOGGING_RECIPE_NAME], "permission denied"),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    let err = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Install(InstallError::ExecutionFailed { .. })
    ));
    assert_eq!(harness.count("recipe_installing", "recipe-a"), 0);
}

#[tokio::test]
async fn test_optional_failure_continues_with_remaining_recipes() {
    let mut harness = Harness::new(
        InstallerContext::new().with_assume_yes(true),
        fetcher(vec![
            integration("recipe-a", "Recipe A"),
            integration("recipe-b", "Recipe B"),
        ]),
        MockRecipeExecutor::failing_for(&["recipe-a"], "unsupported distribution"),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    let summary = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.failed, names(&["recipe-a"]));
    assert!(summary.installed.contains(&"recipe-b".to_string()));

    let failed = harness
        .recorder
        .updates()
        .into_iter()
        .find(|u| u.operation == "recipe_failed")
        .unwrap();
    assert!(failed
        .message
        .unwrap()
        .contains("unsupported distribution"));
    assert_eq!(
        harness.installer.status().state().outcome(),
        InstallOutcome::Complete
    );
}

#[tokio::test]
async fn test_skip_integrations_skips_each_recipe_exactly_once() {
    let mut harness = Harness::simple(
        InstallerContext::new()
            .with_skip_integrations(true)
            .with_skip_logging(true),
        vec![integration("recipe-a", "Recipe A")],
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(harness.count("recipe_skipped", "recipe-a"), 1);
    assert_eq!(harness.count("recipe_installing", "recipe-a"), 0);
    assert_eq!(harness.count("recipe_installed", "recipe-a"), 0);
    assert_eq!(harness.count("recipe_skipped", LOGGING_RECIPE_NAME), 1);
    assert_eq!(
        harness.executor.executed_names(),
        names(&[INFRA_AGENT_RECIPE_NAME])
    );
}

#[tokio::test]
async fn test_skip_integrations_also_disables_logging() {
    let mut harness = Harness::simple(
        InstallerContext::new().with_skip_integrations(true),
        Vec::new(),
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(harness.count("recipe_skipped", LOGGING_RECIPE_NAME), 1);
    assert_eq!(harness.count("recipe_installing", LOGGING_RECIPE_NAME), 0);
}

#[tokio::test]
async fn test_skip_apm_skips_only_apm_recipes() {
    let java = integration("java-agent", "Java Agent")
        .with_target_type(TargetType::Application)
        .with_keyword("APM");
    let mut harness = Harness::simple(
        InstallerContext::new().with_assume_yes(true).with_skip_apm(true),
        vec![java, integration("mysql", "MySQL")],
    );

    let summary = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.skipped, names(&["java-agent"]));
    assert!(summary.installed.contains(&"mysql".to_string()));
}

#[tokio::test]
async fn test_application_recipes_are_recommended_for_the_host() {
    let dotnet = integration("dotnet-app", "Dotnet App").with_target_type(TargetType::Application);
    let mut harness = Harness::simple(InstallerContext::new(), vec![dotnet]);

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    let recommended: Vec<_> = harness
        .recorder
        .updates()
        .into_iter()
        .filter(|u| u.operation == "recipe_recommended")
        .collect();
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0].recipes, names(&["dotnet-app"]));
    assert_eq!(recommended[0].entity_guid, Some(EntityGuid::new(HOST_GUID)));
    assert!(!harness
        .executor
        .executed_names()
        .contains(&"dotnet-app".to_string()));
    assert_eq!(harness.count("recipe_skipped", "dotnet-app"), 0);
}

#[tokio::test]
async fn test_include_application_targets_offers_them_for_install() {
    let dotnet = integration("dotnet-app", "Dotnet App").with_target_type(TargetType::Application);
    let mut harness = Harness::simple(
        InstallerContext::new()
            .with_assume_yes(true)
            .with_include_application_targets(true),
        vec![dotnet],
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(harness.count("recipe_installed", "dotnet-app"), 1);
    assert_eq!(harness.count("recipe_recommended", "dotnet-app"), 0);
}

#[tokio::test]
async fn test_redundant_recommendations_are_dropped() {
    let mut harness = Harness::simple(
        InstallerContext::new().with_assume_yes(true),
        vec![agent(), logging(), integration("recipe-a", "Recipe A")],
    );

    harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        harness.executor.executed_names(),
        names(&[INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME, "recipe-a"])
    );
    assert_eq!(
        harness.fetcher.fetched(),
        names(&[INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME])
    );
}

#[tokio::test]
async fn test_skip_discovery_never_asks_for_recommendations() {
    let mut harness = Harness::new(
        InstallerContext::new()
            .with_assume_yes(true)
            .with_skip_discovery(true),
        fetcher(Vec::new()).failing_recommendations("catalog unavailable"),
        MockRecipeExecutor::new(),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    let summary = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        summary.installed,
        names(&[INFRA_AGENT_RECIPE_NAME, LOGGING_RECIPE_NAME])
    );
}

#[tokio::test]
async fn test_recommendation_failure_aborts_before_installing() {
    let mut harness = Harness::new(
        InstallerContext::new(),
        fetcher(Vec::new()).failing_recommendations("catalog unavailable"),
        MockRecipeExecutor::new(),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    let err = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Install(InstallError::FetchFailed { .. })
    ));
    assert!(harness.executor.executed_names().is_empty());
    assert_eq!(harness.recorder.operations().last(), Some(&"install_failed"));
}

#[tokio::test]
async fn test_missing_mandatory_recipe_aborts() {
    let mut harness = Harness::new(
        InstallerContext::new(),
        MockRecipeFetcher::new().with_recipe(agent()),
        MockRecipeExecutor::new(),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    let err = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::Install(InstallError::RecipeNotFound { name }) => {
            assert_eq!(name, LOGGING_RECIPE_NAME);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_skip_infra_is_rejected() {
    let mut harness = Harness::simple(InstallerContext::new().with_skip_infra(true), Vec::new());

    let err = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Install(InstallError::InvalidOption { .. })
    ));
    assert!(harness.executor.executed_names().is_empty());
}

#[tokio::test]
async fn test_interrupted_recipe_cancels_the_install() {
    let mut harness = Harness::new(
        InstallerContext::new().with_assume_yes(true),
        fetcher(vec![
            integration("recipe-a", "Recipe A"),
            integration("recipe-b", "Recipe B"),
        ]),
        MockRecipeExecutor::interrupting("recipe-a"),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );

    let err = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(harness.count("recipe_canceled", "recipe-a"), 1);
    assert_eq!(harness.count("recipe_failed", "recipe-a"), 0);
    assert!(!harness
        .executor
        .executed_names()
        .contains(&"recipe-b".to_string()));
    assert_eq!(
        harness.recorder.operations().last(),
        Some(&"install_canceled")
    );
    assert_eq!(
        harness.installer.status().state().outcome(),
        InstallOutcome::Canceled
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_token_stops_a_running_recipe() {
    let mut harness = Harness::new(
        InstallerContext::new().with_assume_yes(true),
        fetcher(Vec::new()),
        MockRecipeExecutor::hanging_on(INFRA_AGENT_RECIPE_NAME),
        MockPrompter::new(),
        MockFileFilterer::default(),
    );
    let cancel = CancellationToken::new();

    let (result, ()) = tokio::join!(harness.installer.install(&cancel), async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();
    });

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(harness.count("recipe_canceled", INFRA_AGENT_RECIPE_NAME), 1);
    assert_eq!(harness.count("recipe_installing", LOGGING_RECIPE_NAME), 0);
}

#[tokio::test]
async fn test_cancelled_before_start_reports_cancellation() {
    let mut harness = Harness::simple(InstallerContext::new(), Vec::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness.installer.install(&cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(harness.recorder.operations(), vec!["install_canceled"]);
}

#[tokio::test]
async fn test_status_failures_only_abort_on_mandatory_path() {
    let mut harness = Harness::with_recorder(
        InstallerContext::new().with_assume_yes(true),
        fetcher(vec![integration("recipe-a", "Recipe A")]),
        MockRecipeExecutor::new(),
        MockPrompter::new(),
        MockFileFilterer::default(),
        RecordingStatusReporter::failing("document store unavailable"),
    );

    let err = harness
        .installer
        .install(&CancellationToken::new())
        .await
        .unwrap_err();

    // Milestone reports were tolerated; the host agent's INSTALLING report was not.
    assert!(err.is_status_report());
    assert!(harness.recorder.operations().contains(&"recipes_selected"));
    assert!(harness.executor.executed_names().is_empty());
}
