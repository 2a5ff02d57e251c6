//! Shared mutable run state: attempt histories and the task status log.
//!
//! Both structures are append-only. Attempt histories follow a
//! single-writer discipline (only the owning controller appends); the
//! status log has the task runner as its sole writer. Either may be read
//! concurrently at any point during a run.

pub mod history;
pub mod status_log;

pub use history::ProcessHistory;
pub use status_log::StatusLog;
