//! Task orchestration and status aggregation.
//!
//! The [`TaskRunner`] owns one [`ProcessController`] per process in the
//! task, runs them concurrently (processes within a task are independent;
//! no process waits on another's outcome), and derives the aggregate task
//! state from their terminal states.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tk_protocol::{AttemptRecord, Event, RunState, Task, TaskState, TaskStatusSnapshot};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::controller::{ControllerContext, ProcessController};
use crate::error::{RunnerError, RunnerResult};
use crate::exec::{CommandExecutor, ProcessExecutor};
use crate::state::StatusLog;

/// Final report of one task run.
#[derive(Debug, Clone)]
pub struct TaskReport {
    /// Identity of this run.
    pub run_id: Uuid,

    /// Final verdict. `Success` iff every process's last attempt succeeded.
    pub state: TaskState,

    /// The full append-only status history, ending with the verdict.
    pub statuses: Vec<TaskStatusSnapshot>,

    /// Every process's ordered attempt history.
    pub processes: BTreeMap<String, Vec<AttemptRecord>>,
}

/// Runs all processes of a task to completion and aggregates the outcome.
///
/// Status snapshots are appended exactly once per observed global-state
/// change: when the run starts (ACTIVE), when a process becomes terminal
/// without deciding the task (ACTIVE), and once when the verdict is first
/// known (SUCCESS or FAILED). A permanent process failure decides the task
/// immediately (fail-fast), but already-running siblings are left to
/// finish rather than being killed.
pub struct TaskRunner {
    task: Task,
    run_id: Uuid,
    sandbox: PathBuf,
    executor: Arc<dyn ProcessExecutor>,
    controllers: Vec<Arc<ProcessController>>,
    status: StatusLog,
    cancel: CancellationToken,
}

impl TaskRunner {
    /// Create a runner executing commands through the default shell.
    ///
    /// `sandbox` is the working directory every process runs in.
    pub fn new(task: Task, sandbox: PathBuf) -> Self {
        Self::with_executor(task, sandbox, Arc::new(CommandExecutor::new()))
    }

    /// Create a runner with a custom executor (used by tests).
    pub fn with_executor(task: Task, sandbox: PathBuf, executor: Arc<dyn ProcessExecutor>) -> Self {
        let controllers = task
            .processes
            .iter()
            .cloned()
            .map(|spec| Arc::new(ProcessController::new(spec)))
            .collect();

        Self {
            task,
            run_id: Uuid::new_v4(),
            sandbox,
            executor,
            controllers,
            status: StatusLog::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Token for cooperative cancellation: stops further retries, kills
    /// in-flight attempts, and fails the task.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ordered attempt history of one process, safe to call while the run
    /// is in progress.
    pub async fn process_history(&self, name: &str) -> RunnerResult<Vec<AttemptRecord>> {
        let controller = self.controller(name)?;
        Ok(controller.history().snapshot().await)
    }

    /// Current lifecycle state of one process.
    pub async fn process_state(&self, name: &str) -> RunnerResult<RunState> {
        Ok(self.controller(name)?.state().await)
    }

    /// The status history so far.
    pub async fn statuses(&self) -> Vec<TaskStatusSnapshot> {
        self.status.snapshot().await
    }

    /// Run every process to a terminal state and aggregate the verdict.
    ///
    /// Guarantees the terminal snapshot is appended for any task whose
    /// processes all reach a terminal state. Events are published on
    /// `events_tx` as execution progresses; a closed receiver is ignored.
    pub async fn run(&self, events_tx: Sender<Event>) -> RunnerResult<TaskReport> {
        tracing::info!(task = %self.task.name, run_id = %self.run_id, "task run starting");

        self.status.append(TaskState::Active).await?;
        let _ = events_tx
            .send(Event::TaskStarted {
                run_id: self.run_id,
                task_name: self.task.name.clone(),
            })
            .await;
        let _ = events_tx
            .send(Event::TaskStatusUpdate {
                run_id: self.run_id,
                state: TaskState::Active,
            })
            .await;

        let ctx = ControllerContext {
            working_dir: self.sandbox.clone(),
            events_tx: events_tx.clone(),
            cancel: self.cancel.clone(),
        };

        let mut join_set = JoinSet::new();
        for controller in &self.controllers {
            let controller = Arc::clone(controller);
            let executor = Arc::clone(&self.executor);
            let ctx = ctx.clone();
            join_set.spawn(async move {
                let terminal = controller.run(executor, &ctx).await;
                (controller.spec().name.clone(), terminal)
            });
        }

        // Controllers signal completion through the join set; this task is
        // the sole writer of the status log.
        let mut terminal: BTreeMap<String, RunState> = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            let (name, state) = joined?;
            tracing::info!(process = %name, state = ?state, "process terminal");
            terminal.insert(name, state);

            if self.status.is_final().await {
                continue;
            }
            if state == RunState::FailedPermanent {
                // Fail-fast: one permanent failure decides the task.
                self.append_status(TaskState::Failed, &events_tx).await?;
            } else if terminal.len() == self.controllers.len() {
                let verdict = Self::aggregate(&self.process_names(), &terminal)?;
                self.append_status(verdict, &events_tx).await?;
            } else {
                self.append_status(TaskState::Active, &events_tx).await?;
            }
        }

        // Every controller has reported; the verdict must agree with the
        // recorded status history.
        let verdict = Self::aggregate(&self.process_names(), &terminal)?;
        if !self.status.is_final().await {
            // A task with no processes settles without entering the loop.
            self.append_status(verdict, &events_tx).await?;
        }
        debug_assert_eq!(self.status.last_state().await, Some(verdict));

        let mut processes = BTreeMap::new();
        for controller in &self.controllers {
            processes.insert(
                controller.spec().name.clone(),
                controller.history().snapshot().await,
            );
        }

        tracing::info!(task = %self.task.name, state = ?verdict, "task terminal");
        Ok(TaskReport {
            run_id: self.run_id,
            state: verdict,
            statuses: self.status.snapshot().await,
            processes,
        })
    }

    /// Derive the task verdict from terminal process states.
    ///
    /// Pure and idempotent: re-evaluating after all controllers are
    /// terminal always yields the same verdict.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::IncompleteAggregation` if any process has not
    /// reported a terminal state; a verdict must never be computed from
    /// partial information.
    fn aggregate(
        names: &[String],
        terminal: &BTreeMap<String, RunState>,
    ) -> RunnerResult<TaskState> {
        let pending: Vec<String> = names
            .iter()
            .filter(|name| !terminal.get(*name).copied().is_some_and(RunState::is_terminal))
            .cloned()
            .collect();
        if !pending.is_empty() {
            return Err(RunnerError::IncompleteAggregation { pending });
        }

        if terminal.values().all(|s| *s == RunState::Succeeded) {
            Ok(TaskState::Success)
        } else {
            Ok(TaskState::Failed)
        }
    }

    async fn append_status(&self, state: TaskState, events_tx: &Sender<Event>) -> RunnerResult<()> {
        self.status.append(state).await?;
        let _ = events_tx
            .send(Event::TaskStatusUpdate {
                run_id: self.run_id,
                state,
            })
            .await;
        Ok(())
    }

    fn process_names(&self) -> Vec<String> {
        self.controllers
            .iter()
            .map(|c| c.spec().name.clone())
            .collect()
    }

    fn controller(&self, name: &str) -> RunnerResult<&Arc<ProcessController>> {
        self.controllers
            .iter()
            .find(|c| c.spec().name == name)
            .ok_or_else(|| RunnerError::UnknownProcess {
                name: name.to_string(),
            })
    }
}
