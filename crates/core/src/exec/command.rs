//! Shell command executor.
//!
//! Spawns one attempt of a process via `sh -c`, streams its stdout/stderr
//! line-by-line as events, and enforces the minimum-duration gate on
//! zero-exit attempts.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tk_protocol::{AttemptFailure, Event, OutputStream, ProcessSpec};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

use crate::exec::{AttemptVerdict, ExecutionContext, ProcessExecutor};

/// Executes process command lines through a shell.
///
/// The minimum-duration gate applies only to would-be successes: a zero
/// exit before `min_duration` has elapsed is held open (the attempt stays
/// `Running`) until the gate is satisfied, then recorded as `Success`. A
/// non-zero exit fails immediately, duration unchecked.
pub struct CommandExecutor {
    shell: String,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
        }
    }

    /// Override the shell binary. Used by tests to exercise launch failures.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessExecutor for CommandExecutor {
    async fn execute(&self, spec: &ProcessSpec, ctx: &ExecutionContext) -> AttemptVerdict {
        let started = Instant::now();

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c");
        cmd.arg(&spec.cmdline);
        cmd.current_dir(&ctx.working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        tracing::trace!(process = %ctx.process_name, attempt = ctx.attempt, "spawning attempt");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(process = %ctx.process_name, error = %e, "launch failure");
                return AttemptVerdict::failed(AttemptFailure::Launch {
                    message: format!("Failed to spawn '{}': {}", self.shell, e),
                });
            }
        };

        let forward = tokio::spawn(forward_output(
            child.stdout.take(),
            child.stderr.take(),
            ctx.clone(),
        ));

        let status = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => status,
                Err(e) => {
                    let _ = forward.await;
                    return AttemptVerdict::failed(AttemptFailure::Launch {
                        message: format!("Failed to wait on child: {e}"),
                    });
                }
            },
            _ = ctx.cancel.cancelled() => {
                tracing::debug!(process = %ctx.process_name, "cancelled; killing child");
                let _ = child.kill().await;
                let _ = forward.await;
                return AttemptVerdict::failed(AttemptFailure::Cancelled);
            }
        };

        // Drain any remaining buffered output before the verdict.
        let _ = forward.await;

        if !status.success() {
            return match status.code() {
                Some(code) => {
                    tracing::debug!(process = %ctx.process_name, code, "attempt exited non-zero");
                    AttemptVerdict::failed(AttemptFailure::NonZeroExit { code })
                }
                None => AttemptVerdict::failed(AttemptFailure::Signaled),
            };
        }

        // Zero exit: hold the verdict open until the minimum duration has
        // elapsed. The attempt is only SUCCESS once both conditions hold.
        let elapsed = started.elapsed();
        if elapsed < spec.min_duration {
            let remaining = spec.min_duration - elapsed;
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {}
                _ = ctx.cancel.cancelled() => {
                    return AttemptVerdict::failed(AttemptFailure::DurationViolation {
                        ran_for: elapsed,
                    });
                }
            }
        }

        AttemptVerdict::success()
    }
}

/// Forward child stdout/stderr to the event channel, one event per line.
///
/// Both pipes are always requested at spawn time; a missing handle means
/// there is nothing to forward.
async fn forward_output(
    stdout: Option<tokio::process::ChildStdout>,
    stderr: Option<tokio::process::ChildStderr>,
    ctx: ExecutionContext,
) {
    let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
        return;
    };

    let stdout_lines = LinesStream::new(BufReader::new(stdout).lines())
        .map(|line| (OutputStream::Stdout, line));
    let stderr_lines = LinesStream::new(BufReader::new(stderr).lines())
        .map(|line| (OutputStream::Stderr, line));
    let mut merged = stdout_lines.merge(stderr_lines);

    while let Some((stream, line)) = merged.next().await {
        match line {
            Ok(line) => {
                let _ = ctx
                    .events_tx
                    .send(Event::ProcessOutput {
                        process: ctx.process_name.clone(),
                        attempt: ctx.attempt,
                        stream,
                        line,
                    })
                    .await;
            }
            Err(e) => {
                tracing::trace!(process = %ctx.process_name, error = %e, "output read error");
                break;
            }
        }
    }
}
