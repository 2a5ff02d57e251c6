//! Per-process lifecycle state machine.
//!
//! A [`ProcessController`] owns one process's full lifecycle: it invokes
//! the executor repeatedly under the retry policy until the process
//! succeeds or permanently fails, appending every attempt to the process's
//! history in order.

use std::path::PathBuf;
use std::sync::Arc;
use tk_protocol::{Event, ProcessSpec, ProcessState, RunState};
use tokio::sync::mpsc::Sender;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::exec::{ExecutionContext, ProcessExecutor};
use crate::retry::RetryPolicy;
use crate::state::ProcessHistory;

/// Shared inputs a controller needs from its task runner.
#[derive(Clone)]
pub struct ControllerContext {
    /// Sandbox directory the process runs in.
    pub working_dir: PathBuf,

    /// Event channel, shared by all controllers of the task.
    pub events_tx: Sender<Event>,

    /// Task-wide cancellation signal.
    pub cancel: CancellationToken,
}

/// Drives one process to a terminal state.
///
/// States: `Pending -> Running -> (Succeeded | FailedPermanent)`. Within a
/// process, attempts are strictly ordered: attempt N is finalized before
/// attempt N+1 starts. The history can be read concurrently at any point
/// without blocking the controller.
pub struct ProcessController {
    spec: ProcessSpec,
    history: ProcessHistory,
    state: Arc<RwLock<RunState>>,
    policy: RetryPolicy,
}

impl ProcessController {
    pub fn new(spec: ProcessSpec) -> Self {
        Self {
            spec,
            history: ProcessHistory::new(),
            state: Arc::new(RwLock::new(RunState::Pending)),
            policy: RetryPolicy,
        }
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    /// Shared handle to this process's attempt history.
    pub fn history(&self) -> ProcessHistory {
        self.history.clone()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> RunState {
        *self.state.read().await
    }

    /// Run attempts until the process reaches a terminal state.
    ///
    /// Appends every attempt (success or failure) to the history. The
    /// first attempt is always made; `max_failures` only bounds retries.
    pub async fn run(&self, executor: Arc<dyn ProcessExecutor>, ctx: &ControllerContext) -> RunState {
        self.transition(RunState::Running, &ctx.events_tx).await;

        loop {
            let attempt = self.history.begin_attempt().await;
            let _ = ctx
                .events_tx
                .send(Event::ProcessStarted {
                    process: self.spec.name.clone(),
                    attempt,
                })
                .await;

            let exec_ctx = ExecutionContext {
                working_dir: ctx.working_dir.clone(),
                process_name: self.spec.name.clone(),
                attempt,
                events_tx: ctx.events_tx.clone(),
                cancel: ctx.cancel.clone(),
            };
            let verdict = executor.execute(&self.spec, &exec_ctx).await;

            self.history
                .finish_attempt(verdict.state, verdict.failure.clone())
                .await;
            let _ = ctx
                .events_tx
                .send(Event::AttemptFinished {
                    process: self.spec.name.clone(),
                    attempt,
                    state: verdict.state,
                    failure: verdict.failure,
                })
                .await;

            if verdict.state == ProcessState::Success {
                return self.terminate(RunState::Succeeded, &ctx.events_tx).await;
            }

            let history = self.history.snapshot().await;
            if ctx.cancel.is_cancelled() || !self.policy.should_retry(&self.spec, &history) {
                return self.terminate(RunState::FailedPermanent, &ctx.events_tx).await;
            }

            tracing::debug!(
                process = %self.spec.name,
                attempt,
                max_failures = self.spec.max_failures,
                "attempt failed; retrying"
            );
        }
    }

    async fn transition(&self, next: RunState, events_tx: &Sender<Event>) {
        *self.state.write().await = next;
        if next.is_terminal() {
            let _ = events_tx
                .send(Event::ProcessTerminal {
                    process: self.spec.name.clone(),
                    state: next,
                })
                .await;
        }
    }

    async fn terminate(&self, terminal: RunState, events_tx: &Sender<Event>) -> RunState {
        tracing::debug!(process = %self.spec.name, state = ?terminal, "process terminal");
        self.transition(terminal, events_tx).await;
        terminal
    }
}
