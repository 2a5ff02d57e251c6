//! Task definition loading and template binding.
//!
//! This layer turns task definition files into fully bound [`Task`] values
//! before the runner ever sees them: extension defaults are resolved from
//! an immutable [`SchemaRegistry`], `{{variable}}` placeholders are
//! substituted per binding set, and the result is validated. No templating
//! syntax reaches the execution core.
//!
//! [`Task`]: tk_protocol::Task
//! [`SchemaRegistry`]: models::SchemaRegistry

pub mod error;
pub mod loader;
pub mod models;
pub mod template;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_settings, load_task, load_tasks};
pub use models::{ProcessDefaults, RunnerSettings, SchemaRegistry, TaskDocument};
pub use template::interpolate;
