//! `taskkit` command line interface.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tk_core::config::{load_settings, load_task, RunnerSettings, SchemaRegistry};
use tk_core::{TaskReport, TaskRunner};
use tk_protocol::{Event, OutputStream, ProcessState, TaskState};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskkit", version, about = "Run retry-bearing batches of shell processes")]
struct Cli {
    /// Path to the optional settings file.
    #[arg(long, default_value = "taskkit.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a task definition and print its bound processes.
    Check {
        /// Task definition file (YAML).
        task_file: PathBuf,
    },

    /// Run every process of a task to completion and report the verdict.
    Run {
        /// Task definition file (YAML).
        task_file: PathBuf,

        /// Working directory for the task's processes. Defaults to the
        /// settings file value, then the current directory.
        #[arg(long)]
        sandbox: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let settings = load_settings(&cli.settings)?;
    init_tracing(settings.log_filter.as_deref());

    match cli.command {
        Command::Check { task_file } => check(&task_file),
        Command::Run { task_file, sandbox } => run(&task_file, sandbox, &settings).await,
    }
}

fn init_tracing(default_filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn check(task_file: &Path) -> color_eyre::Result<()> {
    let task = load_task(task_file, &SchemaRegistry::new())?;

    println!("{} {}", "task".bold(), task.name);
    for process in &task.processes {
        println!(
            "  {} (max_failures={}, min_duration={:?})",
            process.name.cyan(),
            process.max_failures,
            process.min_duration,
        );
        println!("    {}", process.cmdline.dimmed());
    }
    Ok(())
}

async fn run(
    task_file: &Path,
    sandbox: Option<PathBuf>,
    settings: &RunnerSettings,
) -> color_eyre::Result<()> {
    let task = load_task(task_file, &SchemaRegistry::new())?;

    let sandbox = match sandbox.or_else(|| settings.sandbox.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&sandbox)?;
    tracing::info!(task = %task.name, sandbox = %sandbox.display(), "starting task");

    let runner = TaskRunner::new(task, sandbox);
    let (events_tx, events_rx) = mpsc::channel(256);
    let printer = tokio::spawn(print_events(events_rx));

    let report = runner.run(events_tx).await?;
    let _ = printer.await;

    print_summary(&report);
    if report.state != TaskState::Success {
        std::process::exit(1);
    }
    Ok(())
}

/// Stream run events to the terminal as they arrive.
async fn print_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match event {
            Event::ProcessOutput {
                process,
                stream,
                line,
                ..
            } => {
                let tag = match stream {
                    OutputStream::Stdout => process.cyan(),
                    OutputStream::Stderr => process.yellow(),
                };
                println!("{tag} | {line}");
            }
            Event::AttemptFinished {
                process,
                attempt,
                state,
                failure,
            } => {
                let verdict = match state {
                    ProcessState::Success => "ok".green(),
                    _ => "failed".red(),
                };
                match failure {
                    Some(failure) => {
                        println!("{} attempt {attempt} {verdict} ({failure:?})", process.bold())
                    }
                    None => println!("{} attempt {attempt} {verdict}", process.bold()),
                }
            }
            Event::TaskStatusUpdate { state, .. } if state.is_terminal() => {
                println!("task {}", paint_task_state(state));
            }
            _ => {}
        }
    }
}

fn print_summary(report: &TaskReport) {
    println!();
    println!("{}", "summary".bold());
    for (name, history) in &report.processes {
        let last = history.last().map(|a| a.state);
        let verdict = match last {
            Some(ProcessState::Success) => "SUCCESS".green(),
            _ => "FAILED".red(),
        };
        println!("  {} {} ({} attempts)", name, verdict, history.len());
    }
    println!("final: {}", paint_task_state(report.state));
}

fn paint_task_state(state: TaskState) -> colored::ColoredString {
    match state {
        TaskState::Success => "SUCCESS".green(),
        TaskState::Failed => "FAILED".red(),
        TaskState::Active => "ACTIVE".normal(),
    }
}
