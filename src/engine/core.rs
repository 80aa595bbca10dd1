// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) reads events from channels,
//! hands `ScheduledTask`s to the executor and pings the reload notifier.
//!
//! The core is unit tested without Tokio, channels, filesystem or processes.

use tracing::info;

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    CoreCommand, CoreStep, handle_task_completion, handle_task_trigger,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName};
use crate::types::{RunPhase, Stage, TriggerWhileRunningBehaviour};

/// What happened since the last call to [`CoreRuntime::take_summary`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Tasks that failed or were skipped because a dependency failed.
    pub failed: Vec<TaskName>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Pure core runtime state: scheduler, trigger queue, options and the
/// session phase. No channels, no IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    phase: RunPhase,
    serving: bool,
    failed: Vec<TaskName>,
}

impl CoreRuntime {
    pub fn new(
        scheduler: Scheduler,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            scheduler,
            queue: TriggerQueue::new(behaviour, queue_length),
            options,
            phase: RunPhase::Idle,
            serving: false,
            failed: Vec::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Switch from the startup build to serve-and-watch: the loop no longer
    /// exits when idle and later runs are reported as `Watching`.
    pub fn begin_serving(&mut self) {
        self.options.exit_when_idle = false;
        self.serving = true;
        self.set_phase(RunPhase::Serving);
    }

    /// Return and reset the failures recorded so far.
    pub fn take_summary(&mut self) -> RunSummary {
        RunSummary {
            failed: std::mem::take(&mut self.failed),
        }
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let step = match event {
            RuntimeEvent::TasksTriggered { tasks, reason } => {
                handle_task_trigger(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                tasks,
                reason,
            )
            }
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.scheduler,
                &mut self.queue,
                &self.options,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
                failed: Vec::new(),
            },
        };

        self.failed.extend(step.failed.iter().cloned());
        self.track_phase(&step);
        step
    }

    fn track_phase(&mut self, step: &CoreStep) {
        let stages: Vec<Option<Stage>> = step
            .commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(tasks) => Some(tasks.iter().map(|t| t.stage())),
                _ => None,
            })
            .flatten()
            .collect();

        for stage in stages {
            if self.serving {
                self.set_phase(RunPhase::Watching);
            } else if let Some(stage) = stage {
                let next = RunPhase::from(stage);
                if next > self.phase {
                    self.set_phase(next);
                }
            }
        }

        if self.serving && self.scheduler.is_idle() {
            self.set_phase(RunPhase::Serving);
        }
    }

    fn set_phase(&mut self, phase: RunPhase) {
        if phase != self.phase {
            info!(from = ?self.phase, to = ?phase, "pipeline phase changed");
            self.phase = phase;
        }
    }
}
