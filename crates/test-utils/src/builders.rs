#![allow(dead_code)]

use std::collections::BTreeMap;

use sitepipe::config::{
    ConfigFile, ConfigSection, RawConfigFile, ServeSection, StepConfig, TaskConfig,
    WatchRuleConfig,
};
use sitepipe::engine::TriggerWhileRunningBehaviour;
use sitepipe::errors::Result;
use sitepipe::types::{ErrorPolicy, Stage};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                serve: ServeSection::default(),
                task: BTreeMap::new(),
                watch: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_watch(mut self, patterns: &[&str], tasks: &[&str]) -> Self {
        self.config.watch.push(WatchRuleConfig {
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn with_behaviour(mut self, behaviour: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = behaviour;
        self
    }

    pub fn with_queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    /// A copy task from `src` into `dest`.
    pub fn new(src: &str, dest: &str) -> Self {
        Self {
            task: TaskConfig {
                description: None,
                stage: None,
                src: vec![src.to_string()],
                dest: Some(dest.to_string()),
                steps: Vec::new(),
                after: Vec::new(),
                newer: false,
                on_error: ErrorPolicy::Fail,
                reload: false,
                startup: true,
                allow_empty: false,
            },
        }
    }

    /// A clean task removing `paths`.
    pub fn clean(paths: &[&str]) -> Self {
        let mut builder = Self::new("unused", "unused");
        builder.task.src = paths.iter().map(|s| s.to_string()).collect();
        builder.task.dest = None;
        builder.task.steps = vec![StepConfig::Clean];
        builder.task.stage = Some(Stage::Clean);
        builder
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn step(mut self, step: StepConfig) -> Self {
        self.task.steps.push(step);
        self
    }

    pub fn concat(self, file: &str) -> Self {
        self.step(StepConfig::Concat {
            file: file.to_string(),
        })
    }

    pub fn include(self, paths: &[&str]) -> Self {
        self.step(StepConfig::Include {
            paths: paths.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn command(self, cmd: &str, ext: Option<&str>) -> Self {
        self.step(StepConfig::Command {
            cmd: cmd.to_string(),
            ext: ext.map(str::to_string),
            only: None,
            keep_input: false,
        })
    }

    pub fn newer(mut self, val: bool) -> Self {
        self.task.newer = val;
        self
    }

    pub fn on_error(mut self, policy: ErrorPolicy) -> Self {
        self.task.on_error = policy;
        self
    }

    pub fn reload(mut self, val: bool) -> Self {
        self.task.reload = val;
        self
    }

    pub fn startup(mut self, val: bool) -> Self {
        self.task.startup = val;
        self
    }

    pub fn allow_empty(mut self, val: bool) -> Self {
        self.task.allow_empty = val;
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.task.stage = Some(stage);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
