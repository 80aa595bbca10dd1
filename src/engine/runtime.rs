// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::server::ReloadNotifier;

use super::core::{CoreRuntime, RunSummary};
use super::{CoreCommand, RuntimeEvent};

/// Drives the core runtime in response to `RuntimeEvent`s and delegates task
/// execution to an `ExecutorBackend`.
///
/// All semantics live in `CoreRuntime`; this struct only moves events and
/// commands between channels, the executor and the reload notifier.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    reloader: Option<Arc<dyn ReloadNotifier>>,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            reloader: None,
        }
    }

    /// Attach the dev-server reload notifier.
    pub fn with_reloader(mut self, reloader: Arc<dyn ReloadNotifier>) -> Self {
        self.reloader = Some(reloader);
        self
    }

    pub fn core(&self) -> &CoreRuntime {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut CoreRuntime {
        &mut self.core
    }

    /// Main event loop.
    ///
    /// Runs until the core asks to stop (idle in build-only mode, or
    /// shutdown) or the event channel closes, then returns the failures seen
    /// since the previous call.
    pub async fn run(&mut self) -> Result<RunSummary> {
        info!("sitepipe runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                debug!("core requested exit; stopping runtime loop");
                break;
            }
        }

        Ok(self.core.take_summary())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::NotifyReload(task) => {
                if let Some(reloader) = &self.reloader {
                    reloader.notify_clients_to_reload(&task);
                }
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "dispatching ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
