//! Append-only task status history.

use std::sync::Arc;
use tk_protocol::{TaskState, TaskStatusSnapshot};
use tokio::sync::RwLock;

use crate::error::{RunnerError, RunnerResult};

/// The task's append-only sequence of status snapshots.
///
/// Enforces the finality invariant: once a `Success` or `Failed` snapshot
/// has been appended, every further append is rejected. The task runner is
/// the sole writer; readers may snapshot concurrently.
#[derive(Clone, Default)]
pub struct StatusLog {
    snapshots: Arc<RwLock<Vec<TaskStatusSnapshot>>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot with the current timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::StatusAfterFinal` if a final verdict has
    /// already been recorded.
    pub async fn append(&self, state: TaskState) -> RunnerResult<()> {
        let mut snapshots = self.snapshots.write().await;
        if let Some(last) = snapshots.last().filter(|s| s.state.is_terminal()) {
            return Err(RunnerError::StatusAfterFinal {
                current: last.state,
                attempted: state,
            });
        }
        snapshots.push(TaskStatusSnapshot::now(state));
        Ok(())
    }

    /// Whether a final verdict has been recorded.
    pub async fn is_final(&self) -> bool {
        self.snapshots
            .read()
            .await
            .last()
            .is_some_and(|s| s.state.is_terminal())
    }

    /// The most recently appended state, if any.
    pub async fn last_state(&self) -> Option<TaskState> {
        self.snapshots.read().await.last().map(|s| s.state)
    }

    /// Copy of the full snapshot sequence.
    pub async fn snapshot(&self) -> Vec<TaskStatusSnapshot> {
        self.snapshots.read().await.clone()
    }
}
