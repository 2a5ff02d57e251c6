//! Test fixtures: sample specs, tasks, and event draining.

use std::time::Duration;
use tk_protocol::{Event, ProcessSpec, Resources, Task};
use tokio::sync::mpsc::Receiver;

/// Build a fully bound process spec.
pub fn spec(name: &str, cmdline: &str, min_duration_ms: u64, max_failures: u32) -> ProcessSpec {
    ProcessSpec {
        name: name.to_string(),
        cmdline: cmdline.to_string(),
        min_duration: Duration::from_millis(min_duration_ms),
        max_failures,
    }
}

/// Build a task from already-bound specs.
pub fn task(name: &str, processes: Vec<ProcessSpec>) -> Task {
    Task {
        name: name.to_string(),
        resources: Resources::default(),
        processes,
    }
}

/// A process that appends to a counter file on every attempt and exits 0
/// only once the file holds `runs` lines. Mirrors a process that
/// stabilizes after a known number of runs.
pub fn ping_process(name: &str, runs: usize, min_duration_ms: u64) -> ProcessSpec {
    let cmdline = format!(
        "echo {name} pinging; \
         echo ping >> {name}; \
         if [ \"$(cat {name} | wc -l)\" -eq {runs} ]; then exit 0; else exit 1; fi"
    );
    spec(name, &cmdline, min_duration_ms, 5)
}

/// Drain every event already buffered on the channel.
pub fn drain(rx: &mut Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
