// src/exec/executor_loop.rs

//! Executor loop that runs scheduled tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::pipeline::ExecContext;

/// Spawn the background executor loop.
///
/// The returned sender is what `RealExecutorBackend` forwards scheduled
/// tasks to. Every task runs in its own Tokio task, so tasks the scheduler
/// released together run concurrently. The scheduler never dispatches a task
/// twice within a run, so there is no per-name bookkeeping here.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: ExecContext,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);
    let ctx = Arc::new(ctx);

    tokio::spawn(async move {
        info!("executor loop started");

        while let Some(task) = rx.recv().await {
            let rt_tx = runtime_tx.clone();
            let ctx = Arc::clone(&ctx);
            let name = task.name.clone();

            tokio::spawn(async move {
                run_task(task, &ctx, rt_tx).await;
                debug!(task = %name, "task runner future finished");
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
