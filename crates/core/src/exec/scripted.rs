//! Deterministic executor double for controller and runner tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tk_protocol::{AttemptFailure, ProcessSpec};
use tokio::sync::Mutex;

use crate::exec::{AttemptVerdict, ExecutionContext, ProcessExecutor};

/// Replays a scripted sequence of verdicts per process name.
///
/// Each call to `execute` pops the next verdict for that process; once a
/// script is exhausted, further attempts succeed. Processes with no script
/// succeed on the first attempt.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<AttemptVerdict>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the verdict sequence for one process.
    pub fn script(mut self, process: &str, verdicts: Vec<AttemptVerdict>) -> Self {
        self.scripts
            .get_mut()
            .insert(process.to_string(), verdicts.into());
        self
    }

    /// Script `failures` failed attempts followed by endless successes,
    /// mirroring a process that stabilizes after a few runs.
    pub fn failing_then_ok(self, process: &str, failures: usize) -> Self {
        let verdicts = (0..failures)
            .map(|_| AttemptVerdict::failed(AttemptFailure::NonZeroExit { code: 1 }))
            .collect();
        self.script(process, verdicts)
    }
}

#[async_trait]
impl ProcessExecutor for ScriptedExecutor {
    async fn execute(&self, spec: &ProcessSpec, _ctx: &ExecutionContext) -> AttemptVerdict {
        let mut scripts = self.scripts.lock().await;
        scripts
            .get_mut(&spec.name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(AttemptVerdict::success)
    }
}
