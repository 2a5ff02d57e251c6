//! Task definition file loading.
//!
//! Loads YAML task documents, resolves extension defaults from the schema
//! registry, expands template bindings, and validates the result into
//! fully bound [`Task`] values.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;
use tk_protocol::{ProcessSpec, Task};
use walkdir::WalkDir;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{RunnerSettings, SchemaRegistry, TaskDocument};
use crate::config::template::interpolate;

/// Load and bind one task definition file.
pub fn load_task(path: &Path, registry: &SchemaRegistry) -> ConfigResult<Task> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let doc: TaskDocument =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source,
        })?;

    bind_document(doc, registry)
}

/// Load every `*.yaml`/`*.yml` task definition in a directory.
///
/// Returns an empty vector if the directory does not exist.
pub fn load_tasks(dir: &Path, registry: &SchemaRegistry) -> ConfigResult<Vec<Task>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut tasks = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).into_iter() {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        tasks.push(load_task(path, registry)?);
    }

    Ok(tasks)
}

/// Load optional runner settings from a `taskkit.toml` file.
///
/// A missing file yields default settings.
pub fn load_settings(path: &Path) -> ConfigResult<RunnerSettings> {
    if !path.exists() {
        return Ok(RunnerSettings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve defaults and expand bindings into a fully bound task.
fn bind_document(doc: TaskDocument, registry: &SchemaRegistry) -> ConfigResult<Task> {
    if doc.name.trim().is_empty() {
        return Err(ConfigError::InvalidTask {
            task: doc.name,
            reason: "task name must not be empty".to_string(),
        });
    }

    let defaults = match doc.extends.iter().find(|name| !registry.contains(name)) {
        Some(unknown) => {
            return Err(ConfigError::UnknownExtension {
                task: doc.name,
                extension: unknown.clone(),
            })
        }
        None => registry.resolve(&doc.extends).unwrap_or_default(),
    };

    let empty_binding = BTreeMap::new();
    let mut processes = Vec::new();
    let mut seen = BTreeSet::new();

    for tpl in &doc.processes {
        let min_duration_secs = tpl
            .min_duration
            .or(defaults.min_duration)
            .unwrap_or(0.0)
            .max(0.0);
        // Infinite or overflowing values parse as YAML but are not a duration.
        let min_duration = Duration::try_from_secs_f64(min_duration_secs).map_err(|_| {
            ConfigError::InvalidTask {
                task: doc.name.clone(),
                reason: format!(
                    "process '{}' has an unrepresentable min_duration ({min_duration_secs})",
                    tpl.name
                ),
            }
        })?;
        let max_failures = tpl.max_failures.or(defaults.max_failures).unwrap_or(0);

        // A template with no binding sets is bound once, as-is.
        let bindings: Vec<&BTreeMap<String, String>> = if tpl.bind.is_empty() {
            vec![&empty_binding]
        } else {
            tpl.bind.iter().collect()
        };

        for binding in bindings {
            let name = interpolate(&tpl.name, &tpl.name, binding)?;
            let cmdline = interpolate(&tpl.name, &tpl.cmdline, binding)?;

            if name.trim().is_empty() || cmdline.trim().is_empty() {
                return Err(ConfigError::InvalidTask {
                    task: doc.name,
                    reason: format!("process '{name}' has an empty name or cmdline"),
                });
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateProcess {
                    task: doc.name,
                    name,
                });
            }

            processes.push(ProcessSpec {
                name,
                cmdline,
                min_duration,
                max_failures,
            });
        }
    }

    if processes.is_empty() {
        return Err(ConfigError::InvalidTask {
            task: doc.name,
            reason: "task defines no processes".to_string(),
        });
    }

    Ok(Task {
        name: doc.name,
        resources: doc.resources.into(),
        processes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::ProcessDefaults;
    use std::fs;
    use tempfile::tempdir;

    const PING_TASK: &str = r#"name: pingping
resources: { cpu: 1.0, ram_mb: 16, disk_mb: 16 }
processes:
  - name: "{{process_name}}"
    cmdline: "echo ping >> {{process_name}}; test $(cat {{process_name}} | wc -l) -eq {{num_runs}}"
    min_duration: 1.0
    max_failures: 5
    bind:
      - { process_name: p1, num_runs: "1" }
      - { process_name: p2, num_runs: "2" }
      - { process_name: p3, num_runs: "3" }
"#;

    #[test]
    fn test_load_task_binds_every_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ping.yaml");
        fs::write(&path, PING_TASK).unwrap();

        let task = load_task(&path, &SchemaRegistry::new()).unwrap();

        assert_eq!(task.name, "pingping");
        assert_eq!(task.resources.ram_bytes, 16 * 1024 * 1024);
        assert_eq!(task.processes.len(), 3);
        assert_eq!(task.processes[0].name, "p1");
        assert_eq!(task.processes[2].name, "p3");
        assert!(task.processes[1].cmdline.contains("-eq 2"));
        assert_eq!(task.processes[0].min_duration, Duration::from_secs(1));
        assert_eq!(task.processes[0].max_failures, 5);
    }

    #[test]
    fn test_extension_defaults_fill_omitted_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("task.yaml");
        fs::write(
            &path,
            "name: t\nextends: [batch]\nprocesses:\n  - name: p\n    cmdline: exit 0\n",
        )
        .unwrap();

        let registry = SchemaRegistry::new().with_extension(
            "batch",
            ProcessDefaults {
                min_duration: Some(2.0),
                max_failures: Some(3),
            },
        );

        let task = load_task(&path, &registry).unwrap();
        assert_eq!(task.processes[0].min_duration, Duration::from_secs(2));
        assert_eq!(task.processes[0].max_failures, 3);
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("task.yaml");
        fs::write(
            &path,
            "name: t\nextends: [nope]\nprocesses:\n  - name: p\n    cmdline: exit 0\n",
        )
        .unwrap();

        let err = load_task(&path, &SchemaRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownExtension { extension, .. } if extension == "nope"
        ));
    }

    #[test]
    fn test_duplicate_bound_names_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("task.yaml");
        fs::write(
            &path,
            r#"name: t
processes:
  - name: "{{n}}"
    cmdline: exit 0
    bind:
      - { n: same }
      - { n: same }
"#,
        )
        .unwrap();

        let err = load_task(&path, &SchemaRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateProcess { name, .. } if name == "same"
        ));
    }

    #[test]
    fn test_non_finite_min_duration_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("task.yaml");
        fs::write(
            &path,
            "name: t\nprocesses:\n  - name: p\n    cmdline: exit 0\n    min_duration: .inf\n",
        )
        .unwrap();

        let err = load_task(&path, &SchemaRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTask { reason, .. } if reason.contains("min_duration")
        ));
    }

    #[test]
    fn test_invalid_yaml_is_reported_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "name: t\n  invalid: [yaml").unwrap();

        let err = load_task(&path, &SchemaRegistry::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::YamlParse { path, .. } if path.ends_with("bad.yaml")
        ));
    }

    #[test]
    fn test_load_tasks_scans_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.yaml"), PING_TASK).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tasks = load_tasks(dir.path(), &SchemaRegistry::new()).unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_load_tasks_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let tasks = load_tasks(&dir.path().join("absent"), &SchemaRegistry::new()).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_load_settings_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let settings = load_settings(&dir.path().join("taskkit.toml")).unwrap();
        assert!(settings.sandbox.is_none());
        assert!(settings.log_filter.is_none());
    }

    #[test]
    fn test_load_settings_parses_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taskkit.toml");
        fs::write(&path, "sandbox = \"/tmp/sandbox\"\nlog_filter = \"tk_core=debug\"\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.sandbox.as_deref(), Some(Path::new("/tmp/sandbox")));
        assert_eq!(settings.log_filter.as_deref(), Some("tk_core=debug"));
    }
}
