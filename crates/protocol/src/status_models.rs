//! Aggregate task status vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate state of a task run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// At least one process is not yet terminal and no process has failed
    /// permanently.
    Active,

    /// Every process's final attempt succeeded.
    Success,

    /// Some process failed permanently.
    Failed,
}

impl TaskState {
    /// Whether this state is a final verdict.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failed)
    }
}

/// One entry in a task's append-only status history.
///
/// The history is monotonically non-decreasing in finality: once a
/// `Success` or `Failed` snapshot is appended, no further snapshot follows,
/// and the last snapshot's state is the task's final verdict.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStatusSnapshot {
    /// Aggregate state at the time of the snapshot.
    pub state: TaskState,

    /// When the snapshot was appended.
    pub timestamp: DateTime<Utc>,
}

impl TaskStatusSnapshot {
    /// Create a snapshot stamped with the current time.
    pub fn now(state: TaskState) -> Self {
        Self {
            state,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_terminality() {
        assert!(!TaskState::Active.is_terminal());
        assert!(TaskState::Success.is_terminal());
        assert!(TaskState::Failed.is_terminal());
    }
}
