// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Default config file looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Sitepipe.toml";

/// Command-line arguments for `sitepipe`.
///
/// Running without arguments builds the whole pipeline, then serves the
/// output directory and watches the sources.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build static-site assets through a DAG of file tasks, then serve and watch.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline config (TOML).
    ///
    /// When the default `Sitepipe.toml` does not exist the built-in pipeline
    /// is used.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Build once and exit; no dev server, no watching.
    #[arg(long)]
    pub once: bool,

    /// Run only the named task(s) once. May be repeated.
    #[arg(long = "task", value_name = "NAME")]
    pub tasks: Vec<String>,

    /// Ignore incremental timestamp checks and rebuild every file.
    #[arg(long)]
    pub force: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Whether the session ends after the first build.
    pub fn build_only(&self) -> bool {
        self.once || !self.tasks.is_empty()
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
