// src/exec/mod.rs

//! Task execution layer.
//!
//! Scheduled tasks are run by [`crate::pipeline::run_task`], each in its own
//! Tokio task, and their outcome is reported back to the runtime as a
//! `RuntimeEvent::TaskCompleted`.
//!
//! - [`executor_loop`] owns the loop that receives scheduled tasks.
//! - [`task_runner`] runs one task and reports its outcome.
//! - [`backend`] provides the `ExecutorBackend` trait and the concrete
//!   `RealExecutorBackend` used in production, which tests replace with a
//!   fake implementation.

pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
