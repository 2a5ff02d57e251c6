//! # tk-protocol
//!
//! Shared data model for task-kit.
//!
//! This crate defines the vocabulary exchanged between the execution core
//! and its consumers (CLI, future UIs):
//! - [`task_models`]: fully bound task and process descriptions
//! - [`process_models`]: per-attempt outcome records and process lifecycle states
//! - [`status_models`]: the append-only task status vocabulary
//! - [`events`]: runner events published over a channel during execution

pub mod events;
pub mod process_models;
pub mod status_models;
pub mod task_models;

pub use events::{Event, OutputStream};
pub use process_models::{AttemptFailure, AttemptRecord, ProcessState, RunState};
pub use status_models::{TaskState, TaskStatusSnapshot};
pub use task_models::{ProcessSpec, Resources, Task};
