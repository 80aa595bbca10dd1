// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::debug;

use crate::dag::{ScheduledTask, Scheduler, TaskRunState};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Tell dev-server clients to refresh; carries the task that finished.
    NotifyReload(TaskName),
    /// Request that the loop exits (build-only sessions, when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
    /// Tasks that failed (or were skipped by a failed dependency) in this step.
    pub failed: Vec<TaskName>,
}

impl CoreStep {
    fn running(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
            failed: Vec::new(),
        }
    }
}

/// Handle a batch of task triggers.
///
/// - Idle scheduler: start a new run seeded with this batch plus anything
///   already queued.
/// - Active run: tasks not yet in the run are merged into it right away;
///   tasks already in the run go to the queue for the next run.
pub fn handle_task_trigger(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    tasks: Vec<TaskName>,
    reason: TriggerReason,
) -> CoreStep {
    if scheduler.is_idle() {
        let mut triggers: BTreeSet<TaskName> = queue.drain_pending().into_iter().collect();
        triggers.extend(tasks);
        debug!(?reason, ?triggers, "starting run");
        return start_new_run_from_triggers(scheduler, triggers.into_iter().collect());
    }

    let mut merge = Vec::new();
    for task in tasks {
        match scheduler.run_state_of(&task) {
            None => debug!(task = %task, "trigger for unknown task; ignoring"),
            Some(TaskRunState::NotInRun) => merge.push(task),
            Some(_already_in_run) => queue.record_trigger(&task),
        }
    }

    if merge.is_empty() {
        return CoreStep::running(Vec::new());
    }

    debug!(?reason, ?merge, "merging triggers into active run");
    let step = scheduler.step_trigger(&merge);

    let mut commands = Vec::new();
    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    finish_step(scheduler, queue, options, commands, step.newly_failed)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    let step = scheduler.step_completion(&task, outcome);

    if outcome == TaskOutcome::Success && scheduler.reloads_after(&task) {
        commands.push(CoreCommand::NotifyReload(task));
    }

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    finish_step(scheduler, queue, options, commands, step.newly_failed)
}

/// Start the next queued run if this step left the scheduler idle, and ask
/// the shell to exit when a build-only session has nothing left to do.
fn finish_step(
    scheduler: &mut Scheduler,
    queue: &mut TriggerQueue,
    options: &RuntimeOptions,
    mut commands: Vec<CoreCommand>,
    failed: Vec<TaskName>,
) -> CoreStep {
    commands.append(&mut maybe_start_queued_run(scheduler, queue));

    let mut keep_running = true;
    if options.exit_when_idle && scheduler.is_idle() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
        failed,
    }
}

/// Start a new run seeded with `triggers`.
pub fn start_new_run_from_triggers(
    scheduler: &mut Scheduler,
    triggers: Vec<TaskName>,
) -> CoreStep {
    if triggers.is_empty() {
        return CoreStep::running(Vec::new());
    }

    scheduler.start_new_run();

    let mut commands = Vec::new();
    let ready = scheduler.handle_trigger_batch(&triggers);
    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }

    CoreStep::running(commands)
}

/// If the scheduler is idle and there are queued triggers, start a new run.
fn maybe_start_queued_run(scheduler: &mut Scheduler, queue: &mut TriggerQueue) -> Vec<CoreCommand> {
    if !scheduler.is_idle() {
        return Vec::new();
    }

    let triggers = queue.drain_pending();
    if triggers.is_empty() {
        return Vec::new();
    }

    start_new_run_from_triggers(scheduler, triggers).commands
}
