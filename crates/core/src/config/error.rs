//! Error types for task definition loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading and binding task definitions.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a definition file from disk.
    #[error("Failed to read file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse a YAML task definition.
    #[error("Failed to parse YAML file at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// Failed to parse the TOML settings file.
    #[error("Failed to parse TOML file at {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to walk a directory of task definitions.
    #[error("Failed to traverse directory {path}: {source}")]
    DirectoryWalk {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// A task referenced an extension missing from the schema registry.
    #[error("Task '{task}' extends unknown schema '{extension}'")]
    UnknownExtension { task: String, extension: String },

    /// A `{{variable}}` placeholder had no binding.
    #[error("Unbound variable '{{{{{variable}}}}}' in process template '{template}'")]
    UnboundVariable { template: String, variable: String },

    /// A template contained malformed placeholder syntax.
    #[error("Malformed template in process '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// Two bound processes ended up with the same name.
    #[error("Duplicate process name '{name}' in task '{task}'")]
    DuplicateProcess { task: String, name: String },

    /// Structurally invalid task definition.
    #[error("Invalid task '{task}': {reason}")]
    InvalidTask { task: String, reason: String },
}

/// Type alias for Result with ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;
