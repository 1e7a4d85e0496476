//! Expectation evaluation.
//!
//! An expectation is either a literal status code (strict equality) or a
//! Rhai predicate run with `res` in scope. Predicates signal mismatch by
//! throwing; a clean return is a pass, whatever the returned value.

use crate::error::RunnerError;
use crate::script::ScriptEngine;
use crate::spec::Expectation;
use crate::transport::HttpResponse;

pub fn evaluate(
    expectation: &Expectation,
    response: &HttpResponse,
    engine: &ScriptEngine,
) -> Result<(), RunnerError> {
    match expectation {
        Expectation::Status(expected) => {
            if response.status == *expected {
                Ok(())
            } else {
                Err(RunnerError::ExpectationMismatch {
                    expected: format!("status {expected}"),
                    actual: format!("status {}", response.status),
                })
            }
        }
        Expectation::Script { script } => engine.check_response(script, response),
    }
}
