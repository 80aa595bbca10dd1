// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Provide the built-in pipeline (`defaults.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate invariants like DAG correctness (`validate.rs`).

pub mod defaults;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{DEFAULT_PIPELINE, default_config};
pub use loader::{load_and_validate, load_from_path, resolve_config};
pub use model::{
    ConfigFile, ConfigSection, RawConfigFile, ServeSection, StepConfig, TaskConfig,
    WatchRuleConfig,
};
