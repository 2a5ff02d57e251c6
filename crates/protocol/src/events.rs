//! Runner events published during task execution.
//!
//! The core publishes these on a `tokio::sync::mpsc` channel so a consumer
//! (CLI, future UI) can follow a run live. Communication is one-way and
//! best-effort: if the receiver is gone, events are dropped silently.
//!
//! Uses tagged enum serialization:
//! ```json
//! {
//!   "type": "attemptFinished",
//!   "payload": {
//!     "process": "p2",
//!     "attempt": 1,
//!     "state": "FAILED",
//!     "failure": { "kind": "NON_ZERO_EXIT", "code": 1 }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::process_models::{AttemptFailure, ProcessState, RunState};
use crate::status_models::TaskState;

/// Which output stream of the child a line came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Events sent from the execution core to its consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A task run has begun.
    TaskStarted { run_id: Uuid, task_name: String },

    /// A snapshot was appended to the task's status history.
    TaskStatusUpdate { run_id: Uuid, state: TaskState },

    /// A process started an execution attempt. Attempts are 1-based.
    ProcessStarted { process: String, attempt: usize },

    /// An attempt produced a line of output.
    ProcessOutput {
        process: String,
        attempt: usize,
        stream: OutputStream,
        line: String,
    },

    /// An attempt reached a terminal state.
    AttemptFinished {
        process: String,
        attempt: usize,
        state: ProcessState,
        failure: Option<AttemptFailure>,
    },

    /// A process controller reached a terminal state; no further attempts
    /// will be made for this process.
    ProcessTerminal { process: String, state: RunState },
}
