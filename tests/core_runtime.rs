// tests/core_runtime.rs

//! The pure core, driven step by step without Tokio.

use sitepipe::config::ConfigFile;
use sitepipe::dag::{Scheduler, TaskRunState};
use sitepipe::engine::{
    CoreCommand, CoreRuntime, CoreStep, RuntimeEvent, RuntimeOptions, TaskOutcome,
    TriggerReason, TriggerWhileRunningBehaviour,
};
use sitepipe::types::{RunPhase, Stage};
use sitepipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

/// clean -> styles -> bundle, clean -> fonts.
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

fn core(behaviour: TriggerWhileRunningBehaviour, exit_when_idle: bool) -> CoreRuntime {
    CoreRuntime::new(
        Scheduler::from_config(&site_config()),
        behaviour,
        1,
        RuntimeOptions { exit_when_idle },
    )
}

fn trigger(tasks: &[&str]) -> RuntimeEvent {
    RuntimeEvent::TasksTriggered {
        tasks: tasks.iter().map(|s| s.to_string()).collect(),
        reason: TriggerReason::FileWatch,
    }
}

fn done(task: &str) -> RuntimeEvent {
    RuntimeEvent::TaskCompleted {
        task: task.to_string(),
        outcome: TaskOutcome::Success,
    }
}

fn dispatched(step: &CoreStep) -> Vec<String> {
    let mut names: Vec<String> = step
        .commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::DispatchTasks(tasks) => Some(tasks.iter().map(|t| t.name.clone())),
            _ => None,
        })
        .flatten()
        .collect();
    names.sort();
    names
}

fn reloaded(step: &CoreStep) -> Vec<String> {
    step.commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::NotifyReload(task) => Some(task.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn startup_then_serve_walks_through_the_phases() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue, true);
    assert_eq!(core.phase(), RunPhase::Idle);

    let step = core.step(trigger(&["bundle", "clean", "fonts", "styles"]));
    assert_eq!(dispatched(&step), vec!["clean"]);
    assert_eq!(core.phase(), RunPhase::Cleaning);

    let step = core.step(done("clean"));
    assert_eq!(dispatched(&step), vec!["fonts", "styles"]);
    assert_eq!(core.phase(), RunPhase::Converting);

    let step = core.step(done("styles"));
    assert_eq!(reloaded(&step), vec!["styles"]);
    assert_eq!(dispatched(&step), vec!["bundle"]);

    let step = core.step(done("fonts"));
    assert!(step.keep_running);
    let step = core.step(done("bundle"));
    assert!(!step.keep_running);
    assert!(matches!(step.commands.last(), Some(CoreCommand::RequestExit)));
    assert!(core.take_summary().is_success());

    core.begin_serving();
    assert_eq!(core.phase(), RunPhase::Serving);

    let step = core.step(trigger(&["fonts"]));
    assert_eq!(dispatched(&step), vec!["fonts"]);
    assert_eq!(core.phase(), RunPhase::Watching);

    let step = core.step(done("fonts"));
    assert!(step.keep_running, "serving sessions never exit when idle");
    assert_eq!(core.phase(), RunPhase::Serving);
}

#[test]
fn trigger_for_a_running_task_is_queued_for_the_next_run() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue, false);

    core.step(trigger(&["styles", "bundle"]));
    assert_eq!(
        core.scheduler().run_state_of("styles"),
        Some(TaskRunState::Running)
    );

    let step = core.step(trigger(&["styles"]));
    assert!(dispatched(&step).is_empty());
    assert!(!core.queue_is_empty());

    core.step(done("styles"));
    let step = core.step(done("bundle"));

    // The queued trigger starts a fresh run as soon as the first finishes.
    assert_eq!(dispatched(&step), vec!["styles"]);
    assert!(core.queue_is_empty());
    assert_eq!(core.scheduler().current_run_id(), Some(2));
}

#[test]
fn trigger_for_a_task_outside_the_run_joins_it() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue, false);

    core.step(trigger(&["styles"]));
    let step = core.step(trigger(&["fonts"]));

    assert_eq!(dispatched(&step), vec!["fonts"]);
    assert!(core.queue_is_empty());
    assert_eq!(core.scheduler().current_run_id(), Some(1));
}

#[test]
fn cancel_keeps_only_the_latest_queued_trigger() {
    let mut core = core(TriggerWhileRunningBehaviour::Cancel, false);

    core.step(trigger(&["styles", "fonts"]));
    core.step(trigger(&["styles"]));
    core.step(trigger(&["fonts"]));

    core.step(done("styles"));
    let step = core.step(done("fonts"));

    assert_eq!(dispatched(&step), vec!["fonts"]);
}

#[test]
fn failures_are_reported_once_in_the_summary() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue, true);

    core.step(trigger(&["styles", "bundle"]));
    let step = core.step(RuntimeEvent::TaskCompleted {
        task: "styles".to_string(),
        outcome: TaskOutcome::Failed,
    });

    assert!(reloaded(&step).is_empty());
    assert!(!step.keep_running);

    let summary = core.take_summary();
    assert_eq!(summary.failed, vec!["styles", "bundle"]);
    assert!(core.take_summary().is_success());
}

#[test]
fn task_joining_after_its_dependency_failed_is_failed_and_the_run_still_ends() {
    let mut core = core(TriggerWhileRunningBehaviour::Queue, false);

    let step = core.step(trigger(&["styles", "fonts"]));
    assert_eq!(dispatched(&step), vec!["fonts", "styles"]);
    core.step(RuntimeEvent::TaskCompleted {
        task: "styles".to_string(),
        outcome: TaskOutcome::Failed,
    });

    let step = core.step(trigger(&["bundle"]));
    assert!(dispatched(&step).is_empty());
    assert_eq!(step.failed, vec!["bundle"]);
    assert_eq!(
        core.scheduler().run_state_of("bundle"),
        Some(TaskRunState::DoneFailed)
    );

    // A trigger for a task still in the run waits for the next one.
    core.step(trigger(&["fonts"]));
    assert!(!core.queue_is_empty());

    let step = core.step(done("fonts"));
    assert_eq!(dispatched(&step), vec!["fonts"]);
    assert_eq!(core.scheduler().current_run_id(), Some(2));
    assert!(core.queue_is_empty());

    core.step(done("fonts"));
    assert!(core.is_idle());
    assert_eq!(core.take_summary().failed, vec!["styles", "bundle"]);
}
