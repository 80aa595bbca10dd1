// tests/runtime_fake_executor.rs

use sitepipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use sitepipe_test_utils::fake_executor::FakeExecutor;
use sitepipe_test_utils::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use sitepipe::config::ConfigFile;
use sitepipe::dag::Scheduler;
use sitepipe::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
    TriggerWhileRunningBehaviour,
};
use sitepipe::server::ReloadHub;
use sitepipe::types::{RunPhase, Stage};

type TestResult = Result<(), Box<dyn Error>>;

/// clean -> styles -> bundle, plus an unrelated `fonts` branch after clean.
fn site_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_task("clean", TaskConfigBuilder::clean(&["dist"]).build())
        .with_task(
            "styles",
            TaskConfigBuilder::new("src/scss/*.scss", "dist/css")
                .stage(Stage::Compile)
                .reload(true)
                .after("clean")
                .build(),
        )
        .with_task(
            "bundle",
            TaskConfigBuilder::new("dist/css/*.css", "dist/css")
                .stage(Stage::Compile)
                .after("styles")
                .build(),
        )
        .with_task(
            "fonts",
            TaskConfigBuilder::new("src/fonts/*", "dist/fonts")
                .stage(Stage::Convert)
                .after("clean")
                .build(),
        )
        .build()
}

fn runtime_for(
    cfg: &ConfigFile,
    exit_when_idle: bool,
    failing: &[&str],
) -> (
    Runtime<FakeExecutor>,
    mpsc::Sender<RuntimeEvent>,
    Arc<Mutex<Vec<String>>>,
) {
    let (tx, rx) = mpsc::channel(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(tx.clone(), Arc::clone(&executed)).failing(failing);

    let core = CoreRuntime::new(
        Scheduler::from_config(cfg),
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions { exit_when_idle },
    );

    (Runtime::new(core, rx, executor), tx, executed)
}

fn startup(cfg: &ConfigFile) -> RuntimeEvent {
    RuntimeEvent::TasksTriggered {
        tasks: cfg.startup_tasks(),
        reason: TriggerReason::Startup,
    }
}

fn position(executed: &[String], name: &str) -> usize {
    executed
        .iter()
        .position(|t| t == name)
        .unwrap_or_else(|| panic!("{name} did not run: {executed:?}"))
}

#[tokio::test]
async fn startup_run_respects_dependencies_and_exits_when_idle() -> TestResult {
    init_tracing();
    let cfg = site_config();
    let (mut runtime, tx, executed) = runtime_for(&cfg, true, &[]);

    tx.send(startup(&cfg)).await?;
    let summary = with_timeout(runtime.run()).await?;

    assert!(summary.is_success());
    let executed = executed.lock().unwrap().clone();
    assert_eq!(executed.len(), 4);
    assert_eq!(executed[0], "clean");
    assert!(position(&executed, "styles") < position(&executed, "bundle"));
    assert!(position(&executed, "clean") < position(&executed, "fonts"));
    assert_eq!(runtime.core().phase(), RunPhase::Converting);
    Ok(())
}

#[tokio::test]
async fn failure_halts_dependents_but_not_unrelated_branches() -> TestResult {
    init_tracing();
    let cfg = site_config();
    let (mut runtime, tx, executed) = runtime_for(&cfg, true, &["styles"]);

    tx.send(startup(&cfg)).await?;
    let summary = with_timeout(runtime.run()).await?;

    assert!(!summary.is_success());
    assert!(summary.failed.contains(&"styles".to_string()));
    assert!(summary.failed.contains(&"bundle".to_string()));

    let executed = executed.lock().unwrap().clone();
    assert!(!executed.contains(&"bundle".to_string()));
    assert!(executed.contains(&"fonts".to_string()));
    Ok(())
}

#[tokio::test]
async fn watch_trigger_runs_only_the_named_tasks() -> TestResult {
    init_tracing();
    let cfg = site_config();
    let (mut runtime, tx, executed) = runtime_for(&cfg, true, &[]);

    tx.send(startup(&cfg)).await?;
    with_timeout(runtime.run()).await?;
    executed.lock().unwrap().clear();

    // `styles` depends on `clean`, which is not part of this run.
    tx.send(RuntimeEvent::TasksTriggered {
        tasks: vec!["bundle".to_string(), "styles".to_string()],
        reason: TriggerReason::FileWatch,
    })
    .await?;
    let summary = with_timeout(runtime.run()).await?;

    assert!(summary.is_success());
    assert_eq!(*executed.lock().unwrap(), vec!["styles", "bundle"]);
    assert_eq!(runtime.core().scheduler().last_success_of("styles"), Some(2));
    Ok(())
}

#[tokio::test]
async fn serving_session_reloads_clients_after_reload_tasks() -> TestResult {
    init_tracing();
    let cfg = site_config();
    let (runtime, tx, executed) = runtime_for(&cfg, true, &[]);

    let hub = ReloadHub::default();
    let mut reloads = hub.subscribe();
    let mut runtime = runtime.with_reloader(Arc::new(hub.clone()));

    tx.send(startup(&cfg)).await?;
    with_timeout(runtime.run()).await?;
    assert_eq!(with_timeout(reloads.recv()).await?, "styles");

    runtime.core_mut().begin_serving();
    assert_eq!(runtime.core().phase(), RunPhase::Serving);

    tx.send(RuntimeEvent::TasksTriggered {
        tasks: vec!["fonts".to_string()],
        reason: TriggerReason::FileWatch,
    })
    .await?;
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    with_timeout(runtime.run()).await?;

    assert_eq!(executed.lock().unwrap().last().map(String::as_str), Some("fonts"));
    // `fonts` does not reload; nothing else was sent.
    assert!(reloads.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn shutdown_during_the_startup_build_stops_before_the_run_ends() -> TestResult {
    init_tracing();
    let cfg = site_config();
    let (mut runtime, tx, executed) = runtime_for(&cfg, true, &[]);

    // Queued ahead of the completion the executor reports for `clean`.
    tx.send(startup(&cfg)).await?;
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    let summary = with_timeout(runtime.run()).await?;

    assert!(summary.is_success());
    assert!(!runtime.core().is_idle());
    assert_eq!(executed.lock().unwrap().clone(), vec!["clean"]);
    Ok(())
}
