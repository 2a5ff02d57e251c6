//! Fully bound task and process descriptions.
//!
//! These are the values the execution core consumes. All template
//! placeholders have already been substituted by the config layer before a
//! [`Task`] is constructed; no `{{variable}}` syntax reaches the runner.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable description of one process to run within a task.
///
/// A ProcessSpec is created once per task run and never mutated afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    /// Process name, unique within its task.
    pub name: String,

    /// The command line to execute, already fully variable-substituted.
    ///
    /// Interpreted by the executor's shell (`sh -c`).
    pub cmdline: String,

    /// Minimum wall-clock duration an attempt must run before a zero-exit
    /// verdict is accepted as SUCCESS.
    ///
    /// Guards against processes that exit immediately and "succeed"
    /// trivially. The gate applies only to would-be successes; a non-zero
    /// exit fails immediately regardless of how long the attempt ran.
    pub min_duration: Duration,

    /// Number of retries allowed after the initial attempt fails.
    ///
    /// A process makes at most `max_failures + 1` attempts. Zero means the
    /// first failure is final.
    pub max_failures: u32,
}

/// Declared resource requirements for a task.
///
/// Pass-through data: the core records and forwards these but does not
/// enforce any isolation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Resources {
    /// CPU cores requested.
    pub cpu: f64,

    /// RAM requested, in bytes.
    pub ram_bytes: u64,

    /// Disk requested, in bytes.
    pub disk_bytes: u64,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            cpu: 1.0,
            ram_bytes: 0,
            disk_bytes: 0,
        }
    }
}

/// A fully resolved task: an ordered set of independent processes.
///
/// Processes within a task carry no ordering or dependency relationship;
/// the runner executes them concurrently.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    /// Task name.
    pub name: String,

    /// Declared resources, passed through unenforced.
    pub resources: Resources,

    /// The processes to run, in declaration order. Names are unique.
    pub processes: Vec<ProcessSpec>,
}

impl Task {
    /// Look up a process spec by name.
    pub fn process(&self, name: &str) -> Option<&ProcessSpec> {
        self.processes.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ProcessSpec {
        ProcessSpec {
            name: name.to_string(),
            cmdline: "true".to_string(),
            min_duration: Duration::ZERO,
            max_failures: 0,
        }
    }

    #[test]
    fn test_task_process_lookup() {
        let task = Task {
            name: "t".to_string(),
            resources: Resources::default(),
            processes: vec![spec("a"), spec("b")],
        };

        assert_eq!(task.process("b").map(|p| p.name.as_str()), Some("b"));
        assert!(task.process("missing").is_none());
    }

    #[test]
    fn test_default_resources() {
        let resources = Resources::default();
        assert_eq!(resources.cpu, 1.0);
        assert_eq!(resources.ram_bytes, 0);
    }
}
