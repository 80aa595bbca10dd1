// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::engine::TaskName;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    current_run_id: Option<u64>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        current_run_id: Option<u64>,
    ) -> Self {
        Self {
            graph,
            tasks,
            current_run_id,
        }
    }

    /// Include the given tasks in this run.
    ///
    /// Only the named tasks join the run; their dependents do not. Tasks
    /// already participating keep their current state.
    pub fn mark_pending(&mut self, names: &[TaskName]) {
        for name in names {
            match self.tasks.get_mut(name) {
                Some(info) => {
                    if info.run_state.is_none() {
                        info.run_state = Some(RunState::Pending);
                        debug!(task = %info.name, "marked Pending for this run");
                    }
                }
                None => warn!(task = %name, "trigger for unknown task; ignoring"),
            }
        }
    }

    /// Fail `Pending` tasks that joined the run after one of their
    /// dependencies had already failed in it.
    ///
    /// Walks in topological order so chains of late joiners fail together.
    pub fn fail_blocked_pending(&mut self) -> Vec<TaskName> {
        let order: Vec<TaskName> = self.graph.tasks().map(str::to_string).collect();
        let mut newly_failed = Vec::new();

        for name in order {
            let blocked_by = match self.tasks.get(&name) {
                Some(info) if info.run_state == Some(RunState::Pending) => info
                    .deps
                    .iter()
                    .find(|dep| {
                        self.tasks
                            .get(*dep)
                            .is_some_and(|d| d.run_state == Some(RunState::DoneFailed))
                    })
                    .cloned(),
                _ => None,
            };

            if let Some(upstream) = blocked_by {
                if let Some(info) = self.tasks.get_mut(&name) {
                    info.run_state = Some(RunState::DoneFailed);
                    info!(
                        task = %info.name,
                        upstream = %upstream,
                        "skipping task: an upstream task already failed in this run"
                    );
                    newly_failed.push(name);
                }
            }
        }

        newly_failed
    }

    /// Whether all dependencies of the given task are satisfied for the
    /// current run.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        ReadOnlyStateManager::new(self.tasks).deps_satisfied_for_info(info)
    }

    /// Mark all dependents participating in this run (transitively) as
    /// `DoneFailed` after `failed_task` failed.
    ///
    /// Returns the newly failed tasks, excluding `failed_task` itself.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                match info.run_state {
                    Some(RunState::Pending) | Some(RunState::Running) => {
                        info.run_state = Some(RunState::DoneFailed);
                        info!(
                            task = %info.name,
                            upstream = %failed_task,
                            "skipping task: an upstream task failed"
                        );
                        newly_failed.push(info.name.clone());
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    Some(RunState::DoneSuccess) | Some(RunState::DoneFailed) | None => {
                        // Already terminal or not participating in this run.
                    }
                }
            }
        }

        newly_failed
    }

    /// Collect `Pending` tasks whose dependencies are satisfied, mark them
    /// `Running`, and return them in topological order.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let candidates: Vec<TaskName> = self
            .graph
            .tasks()
            .filter_map(|name| self.tasks.get(name))
            .filter(|info| {
                matches!(info.run_state, Some(RunState::Pending))
                    && self.deps_satisfied_for_info(info)
            })
            .map(|info| info.name.clone())
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        let run_id = self.current_run_id.unwrap_or(0);

        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                if info.has_run_before() {
                    info!(task = %info.name, run_id, "scheduling task for re-run");
                } else {
                    info!(task = %info.name, run_id, "scheduling task for first run");
                }

                info.run_state = Some(RunState::Running);
                ready.push(ScheduledTask::from_task_info(info, run_id));
            }
        }

        ready
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}

/// Read-only view for dependency checks when only shared access to the
/// tasks map is available.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// A dependency blocks a task only while it participates in the same
    /// run and has not succeeded yet. Dependencies outside the run impose
    /// no ordering.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        for dep_name in &info.deps {
            let dep = match self.tasks.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(
                        task = %info.name,
                        dep = %dep_name,
                        "dependency missing from tasks map"
                    );
                    return false;
                }
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) | None => {}
                Some(RunState::DoneFailed)
                | Some(RunState::Pending)
                | Some(RunState::Running) => return false,
            }
        }

        true
    }
}
