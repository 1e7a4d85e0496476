//! Rhai script engine for specification-authored logic.
//!
//! Derived headers/bodies, predicate expectations and post-response hooks are
//! Rhai scripts. Scripts never get ambient access to shared state: the engine
//! pushes explicit `state` / `res` variables into the scope for each call,
//! and hook mutations are committed back only when the script finishes
//! without raising.
//!
//! # Helper bindings
//!
//! Every script can call, without any import:
//!
//! - `assert(cond)`, `assert_eq(a, b)`, `assert_ne(a, b)`,
//!   `assert_lt(a, b)`, `assert_gt(a, b)` — raise on mismatch, carrying both
//!   values in the message.
//! - `random_int(min, max)` — inclusive random integer, for unique test data.
//! - `bearer_auth(state)` — `#{ Authorization: "Bearer <state.token>" }`.

use rand::Rng;
use rhai::{Dynamic, Engine, EvalAltResult, Map, Scope};
use serde_json::Value;

use crate::error::RunnerError;
use crate::state::SharedState;
use crate::transport::HttpResponse;

/// Engine wrapper holding the registered helper bindings for one run.
pub struct ScriptEngine {
    engine: Engine,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self {
            engine: create_engine(),
        }
    }

    /// Evaluate a derived header/body script with a read-only `state`
    /// snapshot in scope, returning the script's value as JSON.
    pub fn eval_value(&self, script: &str, state: &SharedState) -> Result<Value, RunnerError> {
        let mut scope = Scope::new();
        scope.push("state", state.to_rhai_map());

        let result: Dynamic = self
            .engine
            .eval_with_scope(&mut scope, script)
            .map_err(|e| RunnerError::Script(e.to_string()))?;

        Ok(dynamic_to_json(result))
    }

    /// Run a predicate expectation with `res` in scope. The script throws on
    /// mismatch; a clean return means the response is acceptable.
    pub fn check_response(
        &self,
        script: &str,
        response: &HttpResponse,
    ) -> Result<(), RunnerError> {
        let mut scope = Scope::new();
        scope.push("res", response_to_map(response));

        self.engine
            .eval_with_scope::<Dynamic>(&mut scope, script)
            .map(|_| ())
            .map_err(|e| RunnerError::ExpectationMismatch {
                expected: format!("predicate `{}` to pass", script.trim()),
                actual: e.to_string(),
            })
    }

    /// Run a post-response hook with `res` and a mutable `state` in scope.
    /// State writes are committed only if the script returns without raising.
    pub fn run_hook(
        &self,
        script: &str,
        response: &HttpResponse,
        state: &mut SharedState,
    ) -> Result<(), RunnerError> {
        let mut scope = Scope::new();
        scope.push("state", state.to_rhai_map());
        scope.push("res", response_to_map(response));

        self.engine
            .eval_with_scope::<Dynamic>(&mut scope, script)
            .map_err(|e| RunnerError::PostProcessing(e.to_string()))?;

        if let Some(map) = scope.get_value::<Map>("state") {
            state.apply_rhai_map(map);
        }
        Ok(())
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn create_engine() -> Engine {
    let mut engine = Engine::new();

    engine.register_fn("assert", |cond: bool| -> Result<(), Box<EvalAltResult>> {
        if cond {
            Ok(())
        } else {
            Err("assertion failed".into())
        }
    });

    engine.register_fn(
        "assert_eq",
        |a: Dynamic, b: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let (a, b) = (dynamic_to_json(a), dynamic_to_json(b));
            if a == b {
                Ok(())
            } else {
                Err(format!("assert_eq failed: {a} != {b}").into())
            }
        },
    );

    engine.register_fn(
        "assert_ne",
        |a: Dynamic, b: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let (a, b) = (dynamic_to_json(a), dynamic_to_json(b));
            if a != b {
                Ok(())
            } else {
                Err(format!("assert_ne failed: both sides are {a}").into())
            }
        },
    );

    engine.register_fn(
        "assert_lt",
        |a: i64, b: i64| -> Result<(), Box<EvalAltResult>> {
            if a < b {
                Ok(())
            } else {
                Err(format!("assert_lt failed: {a} >= {b}").into())
            }
        },
    );

    engine.register_fn(
        "assert_gt",
        |a: i64, b: i64| -> Result<(), Box<EvalAltResult>> {
            if a > b {
                Ok(())
            } else {
                Err(format!("assert_gt failed: {a} <= {b}").into())
            }
        },
    );

    engine.register_fn(
        "random_int",
        |min: i64, max: i64| -> Result<i64, Box<EvalAltResult>> {
            if min > max {
                return Err(format!("random_int: empty range {min}..={max}").into());
            }
            Ok(rand::thread_rng().gen_range(min..=max))
        },
    );

    engine.register_fn(
        "bearer_auth",
        |state: Map| -> Result<Map, Box<EvalAltResult>> {
            let token = state
                .get("token")
                .and_then(|v| v.clone().try_cast::<String>())
                .filter(|t| !t.is_empty())
                .ok_or("bearer_auth: state.token is not set")?;

            let mut headers = Map::new();
            headers.insert("Authorization".into(), Dynamic::from(format!("Bearer {token}")));
            Ok(headers)
        },
    );

    engine
}

/// Expose a response to scripts as `#{ status, body, headers }`.
/// The body is the parsed JSON value when the payload parses, the raw text
/// otherwise, and unit when there was no payload at all.
fn response_to_map(response: &HttpResponse) -> Map {
    let mut map = Map::new();
    map.insert("status".into(), Dynamic::from(response.status as i64));

    let body = match (&response.body, response.body_json()) {
        (_, Some(json)) => json_to_dynamic(json),
        (Some(text), None) => Dynamic::from(text.clone()),
        (None, None) => Dynamic::UNIT,
    };
    map.insert("body".into(), body);

    let mut headers = Map::new();
    for (name, value) in &response.headers {
        headers.insert(name.as_str().into(), Dynamic::from(value.clone()));
    }
    map.insert("headers".into(), Dynamic::from(headers));

    map
}

// Conversions between Rhai Dynamic values and serde_json::Value

pub(crate) fn json_to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Dynamic::from(i)
            } else if let Some(f) = n.as_f64() {
                Dynamic::from(f)
            } else {
                Dynamic::UNIT
            }
        }
        Value::String(s) => Dynamic::from(s),
        Value::Array(arr) => {
            let vec: Vec<Dynamic> = arr.into_iter().map(json_to_dynamic).collect();
            Dynamic::from(vec)
        }
        Value::Object(obj) => {
            let mut map = Map::new();
            for (k, v) in obj {
                map.insert(k.into(), json_to_dynamic(v));
            }
            Dynamic::from(map)
        }
    }
}

pub(crate) fn dynamic_to_json(value: Dynamic) -> Value {
    if value.is_unit() {
        Value::Null
    } else if let Ok(b) = value.as_bool() {
        Value::Bool(b)
    } else if let Ok(i) = value.as_int() {
        Value::Number(i.into())
    } else if let Ok(f) = value.as_float() {
        Value::Number(serde_json::Number::from_f64(f).unwrap_or(0.into()))
    } else if let Some(s) = value.clone().try_cast::<String>() {
        Value::String(s)
    } else if let Some(arr) = value.clone().try_cast::<Vec<Dynamic>>() {
        Value::Array(arr.into_iter().map(dynamic_to_json).collect())
    } else if let Some(map) = value.clone().try_cast::<Map>() {
        let mut obj = serde_json::Map::new();
        for (k, v) in map {
            obj.insert(k.to_string(), dynamic_to_json(v));
        }
        Value::Object(obj)
    } else {
        Value::String(format!("{value}"))
    }
}
