// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{ErrorPolicy, Stage, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
/// queue_length = 1
///
/// [serve]
/// dir = "dist"
/// port = 3000
///
/// [task.compress-scripts]
/// src = ["src/js/*.js"]
/// dest = "dist/js"
/// newer = true
/// steps = [
///   { kind = "concat", file = "main.min.js" },
///   { kind = "command", cmd = "terser {input} -c -m -o {output}" },
/// ]
///
/// [[watch]]
/// patterns = ["src/js/*.js"]
/// tasks = ["compress-scripts"]
/// ```
///
/// All sections except `task` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub serve: ServeSection,

    /// Keys are the task names (e.g. `"compile-styles"`).
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    #[serde(default)]
    pub watch: Vec<WatchRuleConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub serve: ServeSection,
    pub task: BTreeMap<String, TaskConfig>,
    pub watch: Vec<WatchRuleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        serve: ServeSection,
        task: BTreeMap<String, TaskConfig>,
        watch: Vec<WatchRuleConfig>,
    ) -> Self {
        Self {
            config,
            serve,
            task,
            watch,
        }
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.task
    }

    pub fn watch_rules(&self) -> &[WatchRuleConfig] {
        &self.watch
    }

    /// Names of tasks that belong to the default (startup) run.
    pub fn startup_tasks(&self) -> Vec<String> {
        self.task
            .iter()
            .filter(|(_, t)| t.startup)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// `[config]` section: behaviour when triggers arrive during a run.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of queued runs to remember.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
        }
    }
}

/// `[serve]` section for the dev server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    #[serde(default = "default_serve_dir")]
    pub dir: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_serve_dir() -> String {
    "dist".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            dir: default_serve_dir(),
            host: default_host(),
            port: default_port(),
            enabled: true,
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Pipeline stage, used to report the overall run phase.
    #[serde(default)]
    pub stage: Option<Stage>,

    /// Source globs, relative to the project root. For clean tasks these are
    /// the paths to remove.
    #[serde(default)]
    pub src: Vec<String>,

    /// Destination directory, relative to the project root.
    #[serde(default)]
    pub dest: Option<String>,

    /// Transformations applied in order. Empty means "copy".
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Tasks that must complete before this one within a run.
    #[serde(default)]
    pub after: Vec<String>,

    /// Skip sources whose destination artifact is already newer.
    #[serde(default)]
    pub newer: bool,

    #[serde(default)]
    pub on_error: ErrorPolicy,

    /// Ask dev-server clients to reload after a successful run.
    #[serde(default)]
    pub reload: bool,

    /// Part of the default run started at launch.
    #[serde(default = "default_true")]
    pub startup: bool,

    /// Treat a missing source directory as "no files" instead of an error.
    #[serde(default)]
    pub allow_empty: bool,
}

impl TaskConfig {
    /// A task whose only step is `clean`.
    pub fn is_clean(&self) -> bool {
        matches!(self.steps.as_slice(), [StepConfig::Clean])
    }

    /// Destination file name when the task concatenates its inputs.
    pub fn concat_target(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| match s {
            StepConfig::Concat { file } => Some(file.as_str()),
            _ => None,
        })
    }
}

/// One transformation step of a task.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepConfig {
    /// Remove the task's `src` paths.
    Clean,

    /// Merge every file into one, in glob-match order.
    Concat { file: String },

    /// Inline `<!--=include NAME -->` / `//=include NAME` directives.
    Include {
        #[serde(default)]
        paths: Vec<String>,
    },

    /// Run an external tool once per file.
    Command {
        /// Shell command with `{input}` and `{output}` placeholders.
        cmd: String,

        /// Output extension (without the dot). Defaults to the input's.
        #[serde(default)]
        ext: Option<String>,

        /// Only files matching one of these globs go through the tool.
        #[serde(default)]
        only: Option<Vec<String>>,

        /// Emit the untouched input alongside the converted file.
        #[serde(default)]
        keep_input: bool,
    },
}

/// `[[watch]]` entry: glob patterns → tasks to re-run.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchRuleConfig {
    pub patterns: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    pub tasks: Vec<String>,
}
