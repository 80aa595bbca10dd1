// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::model::{ConfigFile, WatchRuleConfig};
use crate::engine::TaskName;

/// Compiled watch rule: when a changed path matches `include` and not
/// `exclude`, the rule's tasks are re-run.
#[derive(Clone)]
pub struct WatchRule {
    include: GlobSet,
    exclude: Option<GlobSet>,
    tasks: Vec<TaskName>,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    pub fn from_config(cfg: &WatchRuleConfig) -> Result<Self> {
        let include = build_globset(&cfg.patterns)?;
        let exclude = if cfg.exclude.is_empty() {
            None
        } else {
            Some(build_globset(&cfg.exclude)?)
        };

        Ok(Self {
            include,
            exclude,
            tasks: cfg.tasks.clone(),
        })
    }

    /// `rel_path` is relative to the project root, with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        match &self.exclude {
            Some(ex) => !ex.is_match(rel_path),
            None => true,
        }
    }

    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }
}

/// All watch rules of a configuration.
#[derive(Debug, Clone, Default)]
pub struct WatchRuleSet {
    rules: Vec<WatchRule>,
}

impl WatchRuleSet {
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let rules = cfg
            .watch_rules()
            .iter()
            .map(WatchRule::from_config)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Tasks to re-run for a change at `rel_path`, in rule order, without
    /// duplicates.
    pub fn tasks_for(&self, rel_path: &str) -> Vec<TaskName> {
        let mut out: Vec<TaskName> = Vec::new();
        for rule in self.rules.iter().filter(|r| r.matches(rel_path)) {
            for task in rule.tasks() {
                if !out.contains(task) {
                    out.push(task.clone());
                }
            }
        }
        out
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder.build().context("building watch globset")
}

fn compile(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid watch glob: {pattern}"))
}
