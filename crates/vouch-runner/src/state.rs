//! Shared state carried across all test cases in a run.
//!
//! The state is a single mutable record with a suite-run lifetime. It is
//! global across groups: case N+1 observes every mutation case N committed,
//! in declared order. Only post-response hooks write to it; the resolver,
//! builder and evaluator read snapshots.

use serde_json::Value;

use crate::script::{dynamic_to_json, json_to_dynamic};

/// Keys pre-declared in every fresh state record, initialized to null.
/// Hooks may introduce additional keys ad hoc.
pub const SEEDED_KEYS: &[&str] = &["token", "email", "password"];

/// The single mutable record threaded through a suite run.
#[derive(Debug, Clone)]
pub struct SharedState {
    values: serde_json::Map<String, Value>,
}

impl SharedState {
    pub fn new() -> Self {
        let mut values = serde_json::Map::new();
        for key in SEEDED_KEYS {
            values.insert((*key).to_string(), Value::Null);
        }
        Self { values }
    }

    /// Look up a binding. Seeded-but-never-written keys hold `null`, which
    /// callers must treat as unbound (see [`crate::resolve`]).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Snapshot the record as a Rhai map for script scopes.
    pub fn to_rhai_map(&self) -> rhai::Map {
        let mut map = rhai::Map::new();
        for (key, value) in &self.values {
            map.insert(key.as_str().into(), json_to_dynamic(value.clone()));
        }
        map
    }

    /// Replace the record with the contents of a Rhai map. Called only after
    /// a hook script finished without raising, so failed hooks never commit.
    pub fn apply_rhai_map(&mut self, map: rhai::Map) {
        let mut values = serde_json::Map::new();
        for (key, value) in map {
            values.insert(key.to_string(), dynamic_to_json(value));
        }
        self.values = values;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
