// src/exec/task_runner.rs

//! Individual task runner.

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::pipeline::{self, ExecContext};

/// Run a single task and emit its `TaskCompleted` event.
///
/// Errors are logged here; the scheduler only learns success or failure.
pub async fn run_task(
    task: ScheduledTask,
    ctx: &ExecContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    info!(
        task = %task.name,
        run_id = task.run_id,
        "starting task"
    );

    let outcome = match pipeline::run_task(ctx, &task.name, &task.spec).await {
        Ok(_report) => TaskOutcome::Success,
        Err(err) => {
            error!(
                task = %task.name,
                run_id = task.run_id,
                error = %err,
                "task failed"
            );
            TaskOutcome::Failed
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        error!(task = %task.name, "runtime channel closed; dropping completion");
    }
}
