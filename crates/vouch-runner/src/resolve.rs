//! Path-parameter resolution.
//!
//! Path templates carry `:name` placeholders (one or more ASCII letters or
//! underscores after the colon) that are substituted from shared state at
//! execution time. There is no escape mechanism: a literal `:` followed by
//! letters is always a placeholder. Resolution is pure and fails loudly on
//! the first unbound key, before any request is dispatched.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::error::RunnerError;
use crate::state::SharedState;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r":[A-Za-z_]+").unwrap())
}

/// Substitute every `:name` placeholder in `template` with the stringified
/// shared-state value bound to `name`. An absent or null binding is an error
/// naming both the key and the template.
pub fn resolve_path(template: &str, state: &SharedState) -> Result<String, RunnerError> {
    let mut resolved = String::with_capacity(template.len());
    let mut last = 0;

    for found in placeholder_regex().find_iter(template) {
        let key = &template[found.start() + 1..found.end()];
        let value = match state.get(key) {
            Some(value) if !value.is_null() => value,
            _ => {
                return Err(RunnerError::MissingState {
                    key: key.to_string(),
                    template: template.to_string(),
                })
            }
        };
        resolved.push_str(&template[last..found.start()]);
        resolved.push_str(&stringify(value));
        last = found.end();
    }

    resolved.push_str(&template[last..]);
    Ok(resolved)
}

/// Render a state value as a path segment. Strings are used verbatim
/// (unquoted); everything else takes its JSON rendering.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
