//! Task definition document models and the schema registry.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tk_protocol::Resources;

/// A task definition as written on disk, before binding.
///
/// ```yaml
/// name: pingping
/// extends: [batch-defaults]
/// resources: { cpu: 1.0, ram_mb: 16, disk_mb: 16 }
/// processes:
///   - name: "{{process_name}}"
///     cmdline: "echo {{process_name}} pinging"
///     min_duration: 1.0
///     max_failures: 5
///     bind:
///       - { process_name: p1 }
///       - { process_name: p2 }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDocument {
    pub name: String,

    /// Names of schema-registry fragments supplying process defaults,
    /// applied in order (later entries win).
    #[serde(default)]
    pub extends: Vec<String>,

    #[serde(default)]
    pub resources: ResourcesDocument,

    pub processes: Vec<ProcessTemplate>,
}

/// Declared resources as written in a task file. Converted to bytes for
/// the pass-through [`Resources`] value.
///
/// Missing fields fall back to the `Default` impl below.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourcesDocument {
    pub cpu: f64,
    pub ram_mb: u64,
    pub disk_mb: u64,
}

impl Default for ResourcesDocument {
    fn default() -> Self {
        Self {
            cpu: 1.0,
            ram_mb: 0,
            disk_mb: 0,
        }
    }
}

impl From<ResourcesDocument> for Resources {
    fn from(doc: ResourcesDocument) -> Self {
        Resources {
            cpu: doc.cpu,
            ram_bytes: doc.ram_mb * 1024 * 1024,
            disk_bytes: doc.disk_mb * 1024 * 1024,
        }
    }
}

/// One process template: name and cmdline may contain `{{variable}}`
/// placeholders, expanded once per binding set.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessTemplate {
    pub name: String,
    pub cmdline: String,

    /// Minimum run duration in seconds before a zero exit counts as
    /// success. Falls back to extension defaults, then 0.
    pub min_duration: Option<f64>,

    /// Retries allowed after the initial failure. Falls back to extension
    /// defaults, then 0 (first failure is final).
    pub max_failures: Option<u32>,

    /// Binding sets; each produces one concrete process. Defaults to a
    /// single empty binding (the template must then contain no
    /// placeholders).
    #[serde(default)]
    pub bind: Vec<BTreeMap<String, String>>,
}

/// Default values an extension fragment may supply for processes.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProcessDefaults {
    pub min_duration: Option<f64>,
    pub max_failures: Option<u32>,
}

impl ProcessDefaults {
    /// Overlay `other` on top of self; set fields in `other` win.
    fn overlaid(self, other: ProcessDefaults) -> Self {
        Self {
            min_duration: other.min_duration.or(self.min_duration),
            max_failures: other.max_failures.or(self.max_failures),
        }
    }
}

/// Immutable mapping from extension name to its defaults fragment.
///
/// Built once at startup and passed by value into loading; there is no
/// process-wide mutable registration.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    extensions: BTreeMap<String, ProcessDefaults>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extension fragment, consuming the registry (builder style).
    pub fn with_extension(mut self, name: impl Into<String>, defaults: ProcessDefaults) -> Self {
        self.extensions.insert(name.into(), defaults);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    /// Resolve the combined defaults for an ordered extension list.
    /// Later extensions override earlier ones. Unknown names yield `None`.
    pub fn resolve(&self, extends: &[String]) -> Option<ProcessDefaults> {
        let mut combined = ProcessDefaults::default();
        for name in extends {
            combined = combined.overlaid(*self.extensions.get(name)?);
        }
        Some(combined)
    }
}

/// Optional runner settings loaded from `taskkit.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSettings {
    /// Working directory for task processes. Defaults to the current
    /// directory when unset.
    pub sandbox: Option<PathBuf>,

    /// Default tracing filter, overridable by `RUST_LOG`.
    pub log_filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolution_order() {
        let registry = SchemaRegistry::new()
            .with_extension(
                "base",
                ProcessDefaults {
                    min_duration: Some(5.0),
                    max_failures: Some(1),
                },
            )
            .with_extension(
                "batch",
                ProcessDefaults {
                    max_failures: Some(3),
                    ..Default::default()
                },
            );

        let defaults = registry
            .resolve(&["base".to_string(), "batch".to_string()])
            .unwrap();
        assert_eq!(defaults.min_duration, Some(5.0));
        assert_eq!(defaults.max_failures, Some(3));
    }

    #[test]
    fn test_registry_unknown_extension() {
        let registry = SchemaRegistry::new();
        assert!(registry.resolve(&["missing".to_string()]).is_none());
    }

    #[test]
    fn test_partial_resources_keep_the_cpu_default() {
        let doc: ResourcesDocument = serde_yaml::from_str("ram_mb: 8").unwrap();
        assert_eq!(doc.cpu, 1.0);
        assert_eq!(doc.ram_mb, 8);
        assert_eq!(doc.disk_mb, 0);
    }

    #[test]
    fn test_resources_convert_to_bytes() {
        let resources: Resources = ResourcesDocument {
            cpu: 2.0,
            ram_mb: 16,
            disk_mb: 1,
        }
        .into();
        assert_eq!(resources.ram_bytes, 16 * 1024 * 1024);
        assert_eq!(resources.disk_bytes, 1024 * 1024);
    }
}
