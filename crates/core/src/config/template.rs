//! `{{variable}}` placeholder substitution.
//!
//! Binding is a pure function from template text and a binding map to
//! concrete text; it happens entirely before the runner sees a process.

use std::collections::BTreeMap;

use crate::config::error::{ConfigError, ConfigResult};

/// Substitute every `{{variable}}` placeholder in `text`.
///
/// Whitespace around the variable name is ignored (`{{ name }}` works).
///
/// # Errors
///
/// Returns `ConfigError::UnboundVariable` for a placeholder missing from
/// `bindings`, and `ConfigError::MalformedTemplate` for an unclosed
/// placeholder. `template_name` is only used for error attribution.
pub fn interpolate(
    template_name: &str,
    text: &str,
    bindings: &BTreeMap<String, String>,
) -> ConfigResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let close = after_open
            .find("}}")
            .ok_or_else(|| ConfigError::MalformedTemplate {
                template: template_name.to_string(),
                reason: "unclosed '{{' placeholder".to_string(),
            })?;

        let variable = after_open[..close].trim();
        let value = bindings
            .get(variable)
            .ok_or_else(|| ConfigError::UnboundVariable {
                template: template_name.to_string(),
                variable: variable.to_string(),
            })?;
        out.push_str(value);
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_repeated_placeholders() {
        let out = interpolate(
            "ping",
            "echo {{name}}; cat {{name}} | wc -l",
            &bindings(&[("name", "p1")]),
        )
        .unwrap();
        assert_eq!(out, "echo p1; cat p1 | wc -l");
    }

    #[test]
    fn test_whitespace_in_placeholder_is_ignored() {
        let out = interpolate("t", "{{ num_runs }}", &bindings(&[("num_runs", "3")])).unwrap();
        assert_eq!(out, "3");
    }

    #[test]
    fn test_text_without_placeholders_passes_through() {
        let out = interpolate("t", "exit 0", &bindings(&[])).unwrap();
        assert_eq!(out, "exit 0");
    }

    #[test]
    fn test_unbound_variable_is_an_error() {
        let err = interpolate("t", "echo {{missing}}", &bindings(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnboundVariable { variable, .. } if variable == "missing"
        ));
    }

    #[test]
    fn test_unclosed_placeholder_is_an_error() {
        let err = interpolate("t", "echo {{oops", &bindings(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedTemplate { .. }));
    }
}
