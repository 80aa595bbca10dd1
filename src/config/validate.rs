// src/config/validate.rs

use globset::Glob;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, StepConfig, TaskConfig};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.config, raw.serve, raw.task, raw.watch,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_task_shapes(cfg)?;
    validate_watch_rules(cfg)?;
    let graph = build_graph(cfg);
    validate_dag(&graph)?;
    validate_clean_ordering(cfg, &graph)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(PipelineError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(PipelineError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.serve.dir.trim().is_empty() {
        return Err(PipelineError::ConfigError(
            "[serve].dir must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(PipelineError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(PipelineError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_task_shapes(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        validate_task_shape(name, task)?;
    }
    Ok(())
}

fn validate_task_shape(name: &str, task: &TaskConfig) -> Result<()> {
    let err = |msg: String| Err(PipelineError::ConfigError(format!("task '{name}': {msg}")));

    if task.src.is_empty() {
        return err("`src` must list at least one path or glob".to_string());
    }

    let has_clean = task.steps.iter().any(|s| matches!(s, StepConfig::Clean));
    if has_clean {
        if task.steps.len() > 1 {
            return err("a `clean` step cannot be combined with other steps".to_string());
        }
        return Ok(());
    }

    if task.dest.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return err("`dest` is required for tasks that write files".to_string());
    }

    for pattern in &task.src {
        check_glob(pattern).or_else(|e| err(e))?;
    }

    let concat_count = task
        .steps
        .iter()
        .filter(|s| matches!(s, StepConfig::Concat { .. }))
        .count();
    if concat_count > 1 {
        return err("at most one `concat` step is allowed".to_string());
    }

    for step in &task.steps {
        match step {
            StepConfig::Concat { file } => {
                if file.trim().is_empty() {
                    return err("`concat.file` must not be empty".to_string());
                }
            }
            StepConfig::Command { cmd, ext, only, .. } => {
                if !cmd.contains("{input}") || !cmd.contains("{output}") {
                    return err(format!(
                        "command `{cmd}` must contain both {{input}} and {{output}}"
                    ));
                }
                if let Some(ext) = ext {
                    if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                        return err(format!("invalid output extension `{ext}`"));
                    }
                }
                for pattern in only.iter().flatten() {
                    check_glob(pattern).or_else(|e| err(e))?;
                }
            }
            StepConfig::Include { .. } | StepConfig::Clean => {}
        }
    }

    Ok(())
}

fn check_glob(pattern: &str) -> std::result::Result<(), String> {
    Glob::new(pattern)
        .map(|_| ())
        .map_err(|e| format!("invalid glob pattern `{pattern}`: {e}"))
}

fn validate_watch_rules(cfg: &RawConfigFile) -> Result<()> {
    for (idx, rule) in cfg.watch.iter().enumerate() {
        if rule.patterns.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "[[watch]] #{idx} has no patterns"
            )));
        }
        for pattern in rule.patterns.iter().chain(rule.exclude.iter()) {
            check_glob(pattern).map_err(|e| {
                PipelineError::ConfigError(format!("[[watch]] #{idx}: {e}"))
            })?;
        }
        for task in &rule.tasks {
            if !cfg.task.contains_key(task) {
                return Err(PipelineError::ConfigError(format!(
                    "[[watch]] #{idx} references unknown task '{task}'"
                )));
            }
        }
    }
    Ok(())
}

/// Edge direction: dep -> task.
///
/// For
///
/// ```toml
/// [task.B]
/// after = ["A"]
/// ```
///
/// we add edge A -> B.
fn build_graph(cfg: &RawConfigFile) -> DiGraphMap<&str, ()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    graph
}

fn validate_dag(graph: &DiGraphMap<&str, ()>) -> Result<()> {
    match toposort(graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(PipelineError::DagCycle(format!(
                "cycle detected in task DAG involving task '{}'",
                node
            )))
        }
    }
}

/// Every startup task writing under a path removed by a startup clean task
/// must run after that clean task.
fn validate_clean_ordering(cfg: &RawConfigFile, graph: &DiGraphMap<&str, ()>) -> Result<()> {
    for (clean_name, clean) in cfg.task.iter().filter(|(_, t)| t.is_clean() && t.startup) {
        for cleaned in clean.src.iter().map(|p| normalize(p)) {
            for (name, task) in cfg.task.iter() {
                if name == clean_name || !task.startup {
                    continue;
                }
                let Some(dest) = task.dest.as_deref().map(normalize) else {
                    continue;
                };
                if !is_within(&dest, &cleaned) {
                    continue;
                }
                if !has_path_connecting(graph, clean_name.as_str(), name.as_str(), None) {
                    return Err(PipelineError::ConfigError(format!(
                        "task '{name}' writes to '{dest}', which '{clean_name}' removes; \
                         add '{clean_name}' (or a task after it) to its `after`"
                    )));
                }
            }
        }
    }
    Ok(())
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches("./").trim_end_matches('/');
    trimmed.replace('\\', "/")
}

fn is_within(path: &str, dir: &str) -> bool {
    path == dir || path.starts_with(&format!("{dir}/"))
}
