// src/pipeline/steps.rs

//! Transformation steps applied to the in-memory file set of a task.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use globset::{GlobSet, GlobSetBuilder};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::model::StepConfig;
use crate::errors::{PipelineError, Result};
use crate::types::ErrorPolicy;

use super::include::IncludeResolver;
use super::{ExecContext, FileItem};

/// Per-task settings the steps need besides the file set.
#[derive(Debug, Clone, Copy)]
pub struct StepEnv<'a> {
    pub ctx: &'a ExecContext,
    pub task: &'a str,
    pub policy: ErrorPolicy,
}

/// Outcome of a single step.
#[derive(Debug, Default)]
pub struct StepOutput {
    pub items: Vec<FileItem>,
    /// Files dropped because their transformation failed under
    /// `on_error = "log"`.
    pub dropped: usize,
}

/// Apply one step to `items`.
pub async fn apply(env: StepEnv<'_>, step: &StepConfig, items: Vec<FileItem>) -> Result<StepOutput> {
    match step {
        StepConfig::Clean => Ok(StepOutput {
            items,
            dropped: 0,
        }),
        StepConfig::Concat { file } => Ok(StepOutput {
            items: concat(file, items).into_iter().collect(),
            dropped: 0,
        }),
        StepConfig::Include { paths } => include(env, paths, items),
        StepConfig::Command {
            cmd,
            ext,
            only,
            keep_input,
        } => {
            let only = only_matcher(only.as_deref())?;
            command(env, cmd, ext.as_deref(), only.as_ref(), *keep_input, items).await
        }
    }
}

/// Merge every file into one, in the order given. Files are joined with a
/// newline.
pub fn concat(file: &str, items: Vec<FileItem>) -> Option<FileItem> {
    let source = items.first()?.source.clone();

    let mut contents = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            contents.push(b'\n');
        }
        contents.extend_from_slice(&item.contents);
    }

    Some(FileItem {
        rel: PathBuf::from(file),
        contents,
        source,
    })
}

/// Build the matcher for a command's `only` filter. Matching is done on the
/// file name.
pub(crate) fn only_matcher(only: Option<&[String]>) -> Result<Option<GlobSet>> {
    let Some(patterns) = only else {
        return Ok(None);
    };

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::Glob::new(pattern)
            .map_err(|e| PipelineError::ConfigError(format!("invalid glob '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| PipelineError::ConfigError(format!("invalid 'only' globs: {e}")))
}

pub(crate) fn selected(only: Option<&GlobSet>, rel: &Path) -> bool {
    match (only, rel.file_name()) {
        (None, _) => true,
        (Some(set), Some(name)) => set.is_match(name),
        (Some(_), None) => false,
    }
}

/// Route a per-file transformation error through the task's error policy.
fn transform_failed(env: StepEnv<'_>, item: &FileItem, message: String) -> Result<()> {
    match env.policy {
        ErrorPolicy::Fail => Err(PipelineError::Transform {
            task: env.task.to_string(),
            file: item.source.clone(),
            message,
        }),
        ErrorPolicy::Log => {
            warn!(
                task = %env.task,
                file = ?item.source,
                error = %message,
                "transformation failed; skipping file"
            );
            Ok(())
        }
    }
}

fn include(env: StepEnv<'_>, paths: &[String], items: Vec<FileItem>) -> Result<StepOutput> {
    let resolver = IncludeResolver::new(env.ctx.fs.as_ref(), &env.ctx.root, paths);
    let mut out = StepOutput::default();

    for item in items {
        let expanded = String::from_utf8(item.contents.clone())
            .map_err(|e| format!("not valid UTF-8: {e}"))
            .and_then(|text| resolver.expand(&item.source, &text));

        match expanded {
            Ok(text) => out.items.push(FileItem {
                contents: text.into_bytes(),
                ..item
            }),
            Err(message) => {
                transform_failed(env, &item, message)?;
                out.dropped += 1;
            }
        }
    }

    Ok(out)
}

async fn command(
    env: StepEnv<'_>,
    cmd: &str,
    ext: Option<&str>,
    only: Option<&GlobSet>,
    keep_input: bool,
    items: Vec<FileItem>,
) -> Result<StepOutput> {
    let mut out = StepOutput::default();

    for item in items {
        if !selected(only, &item.rel) {
            out.items.push(item);
            continue;
        }

        let mut rel = item.rel.clone();
        if let Some(ext) = ext {
            rel.set_extension(ext);
        }

        match run_tool(env, cmd, &item, &rel).await {
            Ok(contents) => {
                let converted = FileItem {
                    rel,
                    contents,
                    source: item.source.clone(),
                };
                if keep_input {
                    out.items.push(item);
                }
                out.items.push(converted);
            }
            Err(message) => {
                transform_failed(env, &item, message)?;
                out.dropped += 1;
            }
        }
    }

    Ok(out)
}

/// Run the external tool on one file through a scratch directory.
///
/// `{input}` and `{output}` in `cmd` are replaced by quoted scratch paths.
/// The working directory is the project root.
async fn run_tool(
    env: StepEnv<'_>,
    cmd: &str,
    item: &FileItem,
    out_rel: &Path,
) -> std::result::Result<Vec<u8>, String> {
    let scratch = tempfile::tempdir().map_err(|e| format!("creating scratch dir: {e}"))?;
    let input = scratch.path().join(scratch_name("input", &item.rel));
    let output = scratch.path().join(scratch_name("output", out_rel));

    tokio::fs::write(&input, &item.contents)
        .await
        .map_err(|e| format!("writing scratch input: {e}"))?;

    let line = cmd
        .replace("{input}", &format!("\"{}\"", input.display()))
        .replace("{output}", &format!("\"{}\"", output.display()));

    debug!(task = %env.task, file = ?item.source, cmd = %line, "running tool");

    let mut shell = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&line);
        c
    };

    let result = shell
        .current_dir(&env.ctx.root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("spawning tool for task '{}'", env.task))
        .map_err(|e| format!("{e:#}"))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(format!("{} ({})", result.status, stderr.trim()));
    }

    tokio::fs::read(&output)
        .await
        .map_err(|e| format!("tool produced no output: {e}"))
}

fn scratch_name(stem: &str, rel: &Path) -> String {
    match rel.extension() {
        Some(ext) => format!("{stem}.{}", ext.to_string_lossy()),
        None => stem.to_string(),
    }
}
