//! # tk-core
//!
//! Core task execution engine for task-kit.
//!
//! This crate provides:
//! - Task definition loading and template binding from YAML files
//! - Single-attempt command execution with a minimum-duration gate
//! - Per-process retry control with bounded failures
//! - Concurrent task orchestration and status aggregation
//!
//! ## Modules
//!
//! - [`config`]: Task definition loading, schema defaults, template binding
//! - [`exec`]: The [`exec::ProcessExecutor`] trait and command executor
//! - [`retry`]: The retry policy bounding attempts per process
//! - [`controller`]: Per-process lifecycle state machine
//! - [`runner`]: The task runner orchestrating all controllers
//! - [`state`]: Append-only attempt histories and the task status log

pub mod config;
pub mod controller;
pub mod error;
pub mod exec;
pub mod retry;
pub mod runner;
pub mod state;

pub use error::RunnerError;
pub use runner::{TaskReport, TaskRunner};
