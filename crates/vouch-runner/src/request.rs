//! Request construction.
//!
//! Turns one validated case plus the current shared state into a concrete
//! [`RequestPlan`]: method, full URL, headers and optional JSON body. Derived
//! (script-valued) headers and bodies are evaluated here against a state
//! snapshot; the plan is also the source for the curl line in failure
//! diagnostics.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::RunnerError;
use crate::script::ScriptEngine;
use crate::spec::{TestCase, ValueSource};
use crate::state::SharedState;

/// Concrete request description, ready for any [`crate::transport::Transport`].
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RequestPlan {
    /// Equivalent command-line invocation, emitted in failure diagnostics so
    /// a failing case can be reproduced outside the runner.
    pub fn curl_command(&self) -> String {
        let mut cmd = format!("curl -X {} ", self.method);

        for (name, value) in &self.headers {
            cmd.push_str(&format!("-H '{name}: {value}' "));
        }

        if let Some(ref body) = self.body {
            let json = serde_json::to_string(body).unwrap_or_default();
            let escaped = json.replace('\'', "'\\''");
            cmd.push_str(&format!("-H 'Content-Type: application/json' -d '{escaped}' "));
        }

        cmd.push_str(&format!("'{}'", self.url));
        cmd
    }
}

/// Build the plan for one case against an already-resolved path.
pub fn build_plan(
    base_url: &str,
    method: &str,
    resolved_path: &str,
    case: &TestCase,
    state: &SharedState,
    engine: &ScriptEngine,
) -> Result<RequestPlan, RunnerError> {
    let headers = match &case.headers {
        None => HashMap::new(),
        Some(source) => header_map(evaluate(source, state, engine)?, &case.title)?,
    };

    let body = match &case.body {
        None => None,
        Some(source) => {
            let value = evaluate(source, state, engine)?;
            // Truthiness quirk kept for compatibility with existing specs:
            // null, false, 0, "" and empty containers attach NO body.
            if is_falsy(&value) {
                None
            } else {
                Some(value)
            }
        }
    };

    Ok(RequestPlan {
        method: method.to_string(),
        url: format!("{base_url}{resolved_path}"),
        headers,
        body,
    })
}

fn evaluate(
    source: &ValueSource,
    state: &SharedState,
    engine: &ScriptEngine,
) -> Result<Value, RunnerError> {
    match source {
        ValueSource::Literal(value) => Ok(value.clone()),
        ValueSource::Script { script } => engine.eval_value(script, state),
    }
}

fn header_map(value: Value, title: &str) -> Result<HashMap<String, String>, RunnerError> {
    let Value::Object(obj) = value else {
        return Err(RunnerError::Script(format!(
            "case `{title}`: headers must be a map, got {value}"
        )));
    };

    let mut headers = HashMap::new();
    for (name, value) in obj {
        let rendered = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(RunnerError::Script(format!(
                    "case `{title}`: header `{name}` must be a scalar, got {other}"
                )))
            }
        };
        headers.insert(name, rendered);
    }
    Ok(headers)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
