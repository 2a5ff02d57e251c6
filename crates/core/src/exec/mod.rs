//! Single-attempt process execution.
//!
//! The [`ProcessExecutor`] trait is the seam between the retry machinery
//! and the operating system: it runs exactly one attempt of a process and
//! reports a terminal verdict. [`CommandExecutor`] is the real
//! implementation; [`ScriptedExecutor`] is a deterministic double for
//! tests.

pub mod command;
pub mod scripted;

pub use command::CommandExecutor;
pub use scripted::ScriptedExecutor;

use async_trait::async_trait;
use std::path::PathBuf;
use tk_protocol::{AttemptFailure, Event, ProcessSpec, ProcessState};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

/// Context for one execution attempt.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Working directory the command runs in (the task sandbox).
    pub working_dir: PathBuf,

    /// Name of the process being attempted.
    pub process_name: String,

    /// 1-based attempt number, for event attribution.
    pub attempt: usize,

    /// Channel for output and progress events. Best-effort: a closed
    /// receiver is ignored.
    pub events_tx: Sender<Event>,

    /// Cooperative cancellation signal for the whole task run.
    pub cancel: CancellationToken,
}

/// Terminal verdict of one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptVerdict {
    /// `Success` or `Failed`; never `Running`.
    pub state: ProcessState,

    /// Failure cause, present iff the attempt failed.
    pub failure: Option<AttemptFailure>,
}

impl AttemptVerdict {
    pub fn success() -> Self {
        Self {
            state: ProcessState::Success,
            failure: None,
        }
    }

    pub fn failed(failure: AttemptFailure) -> Self {
        Self {
            state: ProcessState::Failed,
            failure: Some(failure),
        }
    }
}

/// Runs a single attempt of a process to a terminal verdict.
///
/// Implementations must not panic on launch problems: a command that
/// cannot be started is an ordinary failed attempt, not a crash of the
/// controller.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn execute(&self, spec: &ProcessSpec, ctx: &ExecutionContext) -> AttemptVerdict;
}
