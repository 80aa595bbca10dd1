// src/pipeline/mod.rs

//! The work a single task does.
//!
//! A task run goes: expand the `src` globs → drop up-to-date sources
//! (`newer`) → read the rest into memory → apply each step in order → write
//! the results below `dest`. Clean tasks only remove their `src` paths.
//!
//! - [`sources`] expands globs into [`SourceFile`]s.
//! - [`incremental`] implements the "newer" filter.
//! - [`steps`] holds concat / include / command.
//! - [`include`] resolves include directives.
//! - [`output`] writes results, skipping byte-identical files.
//! - [`clean`] removes paths.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::model::TaskConfig;
use crate::errors::Result;
use crate::fs::FileSystem;

pub mod clean;
pub mod include;
pub mod incremental;
pub mod output;
pub mod sources;
pub mod steps;

pub use sources::SourceFile;

/// Everything a task needs from its surroundings.
#[derive(Debug, Clone)]
pub struct ExecContext {
    /// Project root; task paths are relative to it.
    pub root: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    /// Ignore the `newer` check.
    pub force: bool,
}

impl ExecContext {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
            force: false,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// A file travelling through the steps of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    /// Output path relative to the task's `dest`.
    pub rel: PathBuf,
    pub contents: Vec<u8>,
    /// The source file this item came from (the first one, for a bundle).
    pub source: PathBuf,
}

/// What a task run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskReport {
    pub matched: usize,
    pub skipped_newer: usize,
    pub dropped: usize,
    pub written: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// Run one task to completion.
///
/// Filesystem errors always fail the task; transformation errors fail it
/// only under `on_error = "fail"`.
pub async fn run_task(ctx: &ExecContext, name: &str, spec: &TaskConfig) -> Result<TaskReport> {
    let fs = ctx.fs.as_ref();

    if spec.is_clean() {
        let removed = clean::clean_paths(fs, &ctx.root, &spec.src)?;
        return Ok(TaskReport {
            removed,
            ..TaskReport::default()
        });
    }

    let mut report = TaskReport::default();
    let dest = ctx.root.join(spec.dest.as_deref().unwrap_or_default());

    let mut sources = sources::expand(fs, &ctx.root, &spec.src, spec.allow_empty)?;
    report.matched = sources.len();

    if spec.newer && !ctx.force {
        let filtered = incremental::filter_newer(fs, sources, &dest, &spec.steps)?;
        report.skipped_newer = filtered.skipped;
        sources = filtered.stale;
    }

    if sources.is_empty() {
        debug!(task = %name, matched = report.matched, "nothing to do");
        return Ok(report);
    }

    let mut items = Vec::with_capacity(sources.len());
    for src in sources {
        items.push(FileItem {
            contents: fs.read(&src.path)?,
            rel: src.rel,
            source: src.path,
        });
    }

    let env = steps::StepEnv {
        ctx,
        task: name,
        policy: spec.on_error,
    };
    for step in &spec.steps {
        let out = steps::apply(env, step, items).await?;
        report.dropped += out.dropped;
        items = out.items;
    }

    let stats = output::write_all(fs, &dest, &items)?;
    report.written = stats.written;
    report.unchanged = stats.unchanged;

    info!(
        task = %name,
        matched = report.matched,
        skipped = report.skipped_newer,
        dropped = report.dropped,
        written = report.written,
        unchanged = report.unchanged,
        "task finished"
    );

    Ok(report)
}
