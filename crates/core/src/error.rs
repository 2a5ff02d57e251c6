//! Error types for task execution.

use thiserror::Error;
use tk_protocol::TaskState;

/// Errors that can occur while running a task.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// A process name was queried that does not exist in the task.
    #[error("Unknown process: {name}")]
    UnknownProcess { name: String },

    /// A status snapshot was appended after a final verdict was recorded.
    ///
    /// The status history is append-only and monotonic in finality; hitting
    /// this is an internal invariant violation, not a recoverable state.
    #[error("Status history already final ({current:?}); refusing to append {attempted:?}")]
    StatusAfterFinal {
        current: TaskState,
        attempted: TaskState,
    },

    /// Aggregation was attempted before every controller reported a
    /// terminal state.
    ///
    /// A final verdict computed from partial information must never be
    /// reported, so this is fatal to the run.
    #[error("Aggregation requires all processes terminal; still pending: {pending:?}")]
    IncompleteAggregation { pending: Vec<String> },

    /// A controller task could not be joined.
    #[error("Process controller task failed: {0}")]
    ControllerJoin(#[from] tokio::task::JoinError),
}

/// Type alias for Result with RunnerError.
pub type RunnerResult<T> = Result<T, RunnerError>;
