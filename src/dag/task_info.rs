// src/dag/task_info.rs

//! Task metadata and per-run state.

use std::sync::Arc;

use crate::config::model::TaskConfig;
use crate::engine::TaskName;
use crate::types::Stage;

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task was triggered for this run but is waiting on dependencies.
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    DoneSuccess,
    /// Task failed in this run (or was blocked by a failed dependency).
    DoneFailed,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task is not participating in this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// Static task information derived from config, plus per-run state and the
/// session history (the build state) for this task.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub spec: Arc<TaskConfig>,
    /// Direct dependencies for this task (names in `after = [...]`).
    pub deps: Vec<TaskName>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Last run ID in which this task succeeded.
    pub last_successful_run: Option<u64>,

    /// Last run ID in which this task failed.
    pub last_failed_run: Option<u64>,
}

impl TaskInfo {
    pub fn from_config(name: TaskName, cfg: &TaskConfig, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            spec: Arc::new(cfg.clone()),
            deps,
            run_state: None,
            last_successful_run: None,
            last_failed_run: None,
        }
    }

    /// Whether this task already ran earlier in the session.
    pub fn has_run_before(&self) -> bool {
        self.last_successful_run.is_some() || self.last_failed_run.is_some()
    }
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub spec: Arc<TaskConfig>,
    /// All tasks dispatched for the same run share the same `run_id`.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo, run_id: u64) -> Self {
        Self {
            name: info.name.clone(),
            spec: Arc::clone(&info.spec),
            run_id,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        self.spec.stage
    }
}
