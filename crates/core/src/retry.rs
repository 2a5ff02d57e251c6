//! Retry policy bounding attempts per process.

use tk_protocol::{AttemptRecord, ProcessSpec, ProcessState};

/// Decides whether a failed process gets another attempt.
///
/// `max_failures` bounds retries after the initial failure, not the
/// initial attempt: a process makes at most `max_failures + 1` attempts.
/// With `max_failures = 0` the first failure is final.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy;

impl RetryPolicy {
    /// Whether another attempt should be scheduled given the attempt
    /// history so far.
    ///
    /// Called after an attempt has been finalized; returns false when the
    /// last attempt succeeded or the retry budget is spent.
    pub fn should_retry(&self, spec: &ProcessSpec, history: &[AttemptRecord]) -> bool {
        if history.last().is_none_or(|a| a.state != ProcessState::Failed) {
            return false;
        }
        let failures = history
            .iter()
            .filter(|a| a.state == ProcessState::Failed)
            .count() as u32;
        // The first failure spends no retry budget.
        failures - 1 < spec.max_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use tk_protocol::AttemptFailure;

    fn spec(max_failures: u32) -> ProcessSpec {
        ProcessSpec {
            name: "p".to_string(),
            cmdline: "exit 1".to_string(),
            min_duration: Duration::ZERO,
            max_failures,
        }
    }

    fn failed() -> AttemptRecord {
        AttemptRecord {
            state: ProcessState::Failed,
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            failure: Some(AttemptFailure::NonZeroExit { code: 1 }),
        }
    }

    fn success() -> AttemptRecord {
        AttemptRecord {
            state: ProcessState::Success,
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            failure: None,
        }
    }

    #[test]
    fn test_max_failures_allows_k_plus_one_attempts() {
        let policy = RetryPolicy;
        let spec = spec(3);
        let mut history = Vec::new();

        // Failures 1..=3 each earn a retry; the 4th does not.
        for _ in 0..3 {
            history.push(failed());
            assert!(policy.should_retry(&spec, &history));
        }
        history.push(failed());
        assert!(!policy.should_retry(&spec, &history));
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_zero_max_failures_means_first_failure_is_final() {
        let policy = RetryPolicy;
        assert!(!policy.should_retry(&spec(0), &[failed()]));
    }

    #[test]
    fn test_success_never_retries() {
        let policy = RetryPolicy;
        assert!(!policy.should_retry(&spec(5), &[failed(), success()]));
    }

    #[test]
    fn test_empty_history_never_retries() {
        let policy = RetryPolicy;
        assert!(!policy.should_retry(&spec(5), &[]));
    }
}
