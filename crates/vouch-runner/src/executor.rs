//! Case execution.
//!
//! One case moves through resolve → build → send → evaluate → post-process.
//! Any error aborts the remaining steps of that case only; before the error
//! is handed back, the executor logs a reproducible diagnostic (case title,
//! equivalent curl line, response body or transport error). Hooks run only
//! after the expectation passed, so a failed expectation never applies the
//! case's state mutation.

use std::time::Instant;

use crate::error::RunnerError;
use crate::expect;
use crate::request::{build_plan, RequestPlan};
use crate::resolve::resolve_path;
use crate::script::ScriptEngine;
use crate::spec::{Hooks, TestCase};
use crate::state::SharedState;
use crate::transport::{HttpResponse, Transport};

/// Runs single cases against one transport and script engine.
pub struct CaseExecutor<'a> {
    pub base_url: &'a str,
    pub transport: &'a dyn Transport,
    pub engine: &'a ScriptEngine,
}

/// Everything observed while running one case, kept for reporting: the plan
/// and response are present as far as execution got.
#[derive(Debug)]
pub struct CaseRun {
    pub plan: Option<RequestPlan>,
    pub response: Option<HttpResponse>,
    pub result: Result<(), RunnerError>,
    pub duration_ms: u128,
}

impl CaseRun {
    /// Body or error detail for the failure report.
    pub fn failure_detail(&self) -> Option<String> {
        let error = self.result.as_ref().err()?;
        Some(
            self.response
                .as_ref()
                .and_then(|r| r.body.clone())
                .unwrap_or_else(|| error.to_string()),
        )
    }
}

impl CaseExecutor<'_> {
    pub async fn run(&self, case: &TestCase, state: &mut SharedState) -> CaseRun {
        let start = Instant::now();
        let mut plan = None;
        let mut response = None;

        let result = self
            .execute(case, state, &mut plan, &mut response)
            .await;

        if let Err(ref error) = result {
            self.log_failure(case, plan.as_ref(), response.as_ref(), error);
        }

        CaseRun {
            plan,
            response,
            result,
            duration_ms: start.elapsed().as_millis(),
        }
    }

    async fn execute(
        &self,
        case: &TestCase,
        state: &mut SharedState,
        plan_slot: &mut Option<RequestPlan>,
        response_slot: &mut Option<HttpResponse>,
    ) -> Result<(), RunnerError> {
        let (method, template) = case.method_and_path()?;
        let path = resolve_path(&template, state)?;

        let plan = build_plan(self.base_url, &method, &path, case, state, self.engine)?;
        let plan = plan_slot.insert(plan);

        let response = self.transport.send(plan).await?;
        let response = response_slot.insert(response);

        expect::evaluate(&case.expect, response, self.engine)?;

        match case.hooks() {
            None => {}
            Some(Hooks::Combined { on_response }) => {
                self.engine.run_hook(on_response, response, state)?;
            }
            Some(Hooks::Split {
                assert,
                update_state,
            }) => {
                // assert first; if it raises, update_state never runs and no
                // state write from this case is committed
                self.engine.run_hook(assert, response, state)?;
                self.engine.run_hook(update_state, response, state)?;
            }
        }

        Ok(())
    }

    fn log_failure(
        &self,
        case: &TestCase,
        plan: Option<&RequestPlan>,
        response: Option<&HttpResponse>,
        error: &RunnerError,
    ) {
        let curl = plan
            .map(RequestPlan::curl_command)
            .unwrap_or_else(|| "<request was never built>".to_string());
        let detail = response
            .and_then(|r| r.body.as_deref())
            .unwrap_or("<no response body>");

        tracing::error!(
            case = %case.title,
            error = %error,
            reproduce = %curl,
            response = %detail,
            "case failed"
        );
    }
}
