// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the `[[watch]]` rules (patterns + excludes → tasks).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Turning each change event into one trigger batch for the runtime.
//!
//! It does **not** know about the DAG or task dependencies; it only turns
//! filesystem changes into task-level triggers.

pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use patterns::{WatchRule, WatchRuleSet};
pub use watcher::{WatcherHandle, spawn_watcher};
