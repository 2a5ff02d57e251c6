//! Append-only attempt history for one process.

use chrono::Utc;
use std::sync::Arc;
use tk_protocol::{AttemptFailure, AttemptRecord, ProcessState};
use tokio::sync::RwLock;

/// Ordered record of every execution attempt of one process.
///
/// Cloning is cheap and shares the underlying log. Only the owning
/// controller appends or finalizes records; any number of readers may take
/// snapshots concurrently with an in-progress run.
#[derive(Clone, Default)]
pub struct ProcessHistory {
    attempts: Arc<RwLock<Vec<AttemptRecord>>>,
}

impl ProcessHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new attempt in the `Running` state.
    ///
    /// Returns the 1-based attempt number. The previous attempt, if any,
    /// must already be terminal.
    pub async fn begin_attempt(&self) -> usize {
        let mut attempts = self.attempts.write().await;
        debug_assert!(attempts.last().is_none_or(AttemptRecord::is_terminal));
        attempts.push(AttemptRecord::started(Utc::now()));
        attempts.len()
    }

    /// Finalize the currently open attempt.
    ///
    /// Terminal records are never mutated again. Must only be called by the
    /// owning controller, after `begin_attempt`.
    pub async fn finish_attempt(&self, state: ProcessState, failure: Option<AttemptFailure>) {
        let mut attempts = self.attempts.write().await;
        debug_assert!(state.is_terminal());
        if let Some(open) = attempts.last_mut().filter(|a| !a.is_terminal()) {
            open.state = state;
            open.ended_at = Some(Utc::now());
            open.failure = failure;
        } else {
            tracing::error!("finish_attempt called with no open attempt");
        }
    }

    /// Copy of the full attempt sequence, safe to call mid-run.
    pub async fn snapshot(&self) -> Vec<AttemptRecord> {
        self.attempts.read().await.clone()
    }

    /// Number of attempts recorded so far, including an open one.
    pub async fn len(&self) -> usize {
        self.attempts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.attempts.read().await.is_empty()
    }

    /// Number of attempts finalized as `Failed`.
    pub async fn failure_count(&self) -> u32 {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.state == ProcessState::Failed)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attempts_are_numbered_from_one() {
        let history = ProcessHistory::new();
        assert_eq!(history.begin_attempt().await, 1);
        history
            .finish_attempt(ProcessState::Failed, Some(AttemptFailure::Signaled))
            .await;
        assert_eq!(history.begin_attempt().await, 2);
    }

    #[tokio::test]
    async fn test_finish_seals_the_open_attempt() {
        let history = ProcessHistory::new();
        history.begin_attempt().await;
        history.finish_attempt(ProcessState::Success, None).await;

        let attempts = history.snapshot().await;
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].state, ProcessState::Success);
        assert!(attempts[0].ended_at.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_sees_open_attempt_as_running() {
        let history = ProcessHistory::new();
        history.begin_attempt().await;

        let attempts = history.snapshot().await;
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].state, ProcessState::Running);
        assert!(attempts[0].ended_at.is_none());
    }

    #[tokio::test]
    async fn test_failure_count_ignores_successes() {
        let history = ProcessHistory::new();
        for _ in 0..2 {
            history.begin_attempt().await;
            history
                .finish_attempt(
                    ProcessState::Failed,
                    Some(AttemptFailure::NonZeroExit { code: 1 }),
                )
                .await;
        }
        history.begin_attempt().await;
        history.finish_attempt(ProcessState::Success, None).await;

        assert_eq!(history.failure_count().await, 2);
        assert_eq!(history.len().await, 3);
    }
}
