// src/watch/event_handler.rs

//! Event processing logic for file system changes.

use std::path::Path;

use notify::EventKind;
use notify::event::ModifyKind;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TaskName, TriggerReason};
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchRuleSet;

/// Whether an event kind can mean that file contents changed.
///
/// Reads (and the access-time updates they cause) are ignored; the pipeline
/// reads its own sources and would otherwise re-trigger itself.
pub fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Other => false,
    }
}

/// Collect the tasks to re-run for the paths of one change event.
pub fn tasks_for_paths<'a>(
    root: &Path,
    paths: impl IntoIterator<Item = &'a Path>,
    rules: &WatchRuleSet,
) -> Vec<TaskName> {
    let mut tasks: Vec<TaskName> = Vec::new();

    for path in paths {
        let Some(rel) = relative_str(root, path) else {
            warn!(
                "could not relativize path {:?} against root {:?}",
                path, root
            );
            continue;
        };

        debug!(?path, rel = %rel, "normalized event path");

        for task in rules.tasks_for(&rel) {
            if !tasks.contains(&task) {
                tasks.push(task);
            }
        }
    }

    tasks
}

/// Turn one change event into (at most) one trigger batch.
pub async fn process_file_change(
    root: &Path,
    paths: &[std::path::PathBuf],
    rules: &WatchRuleSet,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let tasks = tasks_for_paths(root, paths.iter().map(|p| p.as_path()), rules);
    if tasks.is_empty() {
        return;
    }

    info!(?tasks, "change detected; triggering tasks");

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TasksTriggered {
            tasks,
            reason: TriggerReason::FileWatch,
        })
        .await
    {
        warn!("failed to send watch trigger to runtime: {err}");
    }
}
