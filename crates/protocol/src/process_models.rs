//! Per-attempt outcome records and process lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome state of a single execution attempt.
///
/// An attempt starts in `Running` and is finalized exactly once, to either
/// `Success` or `Failed`. Terminal records are never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    /// The attempt is in flight (or a zero exit is being held against the
    /// minimum-duration gate).
    Running,

    /// The attempt exited zero and satisfied the minimum-duration gate.
    Success,

    /// The attempt failed; see [`AttemptFailure`] for the cause.
    Failed,
}

impl ProcessState {
    /// Whether this state admits no further change.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessState::Running)
    }
}

/// Why an attempt was recorded as FAILED.
///
/// Every cause counts toward `max_failures` identically; the distinction
/// exists so a failed task can be diagnosed from its attempt history
/// without re-running it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptFailure {
    /// The command could not be started at all.
    Launch { message: String },

    /// The command started and exited with a non-zero code.
    NonZeroExit { code: i32 },

    /// The command was terminated by a signal and produced no exit code.
    Signaled,

    /// The command exited zero but was cut off before the minimum-duration
    /// gate was satisfied.
    DurationViolation { ran_for: Duration },

    /// The attempt was stopped by cooperative cancellation.
    Cancelled,
}

/// Record of one execution attempt of a process.
///
/// Attempts form an ordered sequence per process; attempt numbers are
/// 1-based positions in that sequence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Outcome state. `Running` until the attempt is finalized.
    pub state: ProcessState,

    /// When the attempt started.
    pub started_at: DateTime<Utc>,

    /// When the attempt reached a terminal state. `None` while running.
    pub ended_at: Option<DateTime<Utc>>,

    /// Failure cause, present iff `state` is `Failed`.
    pub failure: Option<AttemptFailure>,
}

impl AttemptRecord {
    /// Create a fresh in-flight record.
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            state: ProcessState::Running,
            started_at: at,
            ended_at: None,
            failure: None,
        }
    }

    /// Whether the record has been finalized.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Lifecycle state of a process controller.
///
/// Transitions: `Pending -> Running`, then `Running -> Succeeded` or
/// `Running -> FailedPermanent` once retries are exhausted. `Succeeded`
/// and `FailedPermanent` are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// No attempt has started yet.
    Pending,

    /// Attempts are being made.
    Running,

    /// An attempt succeeded; no further attempts.
    Succeeded,

    /// Retries are exhausted (or the run was cancelled); no further attempts.
    FailedPermanent,
}

impl RunState {
    /// Whether this state admits no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::FailedPermanent)
    }
}
