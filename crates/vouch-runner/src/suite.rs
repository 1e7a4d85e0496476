//! Suite driving.
//!
//! Iterates groups and cases strictly in declaration order. Cases never run
//! concurrently: shared state is unsynchronized by design and later cases
//! depend on earlier mutations, so parallelizing would break the dependency
//! chain. Each case runs under a per-case timeout; a timeout fails that case
//! only and the run continues.

use std::time::Duration;

use crate::error::RunnerError;
use crate::executor::CaseExecutor;
use crate::report::{FailureDetail, SuiteReport, BOLD, CYAN, DIM, GREEN, RED, RESET};
use crate::script::ScriptEngine;
use crate::spec::{Expectation, Specification, TestCase, TestGroup};
use crate::state::SharedState;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Per-case timeout; elapsing fails the case, not the suite.
    pub timeout: Duration,
    /// Print the curl line for every case, not just in the failure block.
    pub show_curl: bool,
    /// Print PASS lines with latency.
    pub verbose: bool,
    /// Enumerate cases without dispatching any request.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            show_curl: false,
            verbose: false,
            dry_run: false,
        }
    }
}

/// Run every group and case in specification order against one transport.
pub async fn run_suite(
    spec: &Specification,
    transport: &dyn Transport,
    options: &RunOptions,
) -> SuiteReport {
    let engine = ScriptEngine::new();
    let mut state = SharedState::new();
    let executor = CaseExecutor {
        base_url: spec.base_url(),
        transport,
        engine: &engine,
    };

    let mut report = SuiteReport {
        total_groups: spec.groups.len(),
        total_cases: spec.case_count(),
        ..Default::default()
    };

    for group in &spec.groups {
        println!("{BOLD}Group:{RESET} {}", group.name);

        for case in &group.cases {
            if options.dry_run {
                println!("   {CYAN}DRY-RUN{RESET} {} - {}", case.title, case.request);
                report.skipped += 1;
                continue;
            }

            run_case(&executor, group, case, &mut state, options, &mut report).await;
        }
        println!();
    }

    report
}

async fn run_case(
    executor: &CaseExecutor<'_>,
    group: &TestGroup,
    case: &TestCase,
    state: &mut SharedState,
    options: &RunOptions,
    report: &mut SuiteReport,
) {
    tracing::debug!(group = %group.name, case = %case.title, "running case");

    let run = tokio::time::timeout(options.timeout, executor.run(case, state)).await;

    let (plan, response_body, result, duration_ms) = match run {
        Ok(run) => {
            let detail = run.failure_detail();
            (run.plan, detail, run.result, run.duration_ms)
        }
        Err(_) => (
            None,
            None,
            Err(RunnerError::Transport(format!(
                "case timed out after {:?}",
                options.timeout
            ))),
            options.timeout.as_millis(),
        ),
    };

    if options.show_curl {
        if let Some(ref plan) = plan {
            println!("   {DIM}{}{RESET}", plan.curl_command());
        }
    }

    match result {
        Ok(()) => {
            report.passed += 1;
            if options.verbose {
                println!(
                    "   {GREEN}PASS{RESET} {} - {} ({duration_ms}ms)",
                    case.title, case.request
                );
            }
        }
        Err(error) => {
            report.failed += 1;
            println!("   {RED}FAIL{RESET} {} - {}", case.title, case.request);

            report.failures.push(FailureDetail {
                group: group.name.clone(),
                title: case.title.clone(),
                request: plan
                    .as_ref()
                    .map(|p| format!("{} {}", p.method, p.url))
                    .unwrap_or_else(|| case.request.clone()),
                expected: describe_expectation(&case.expect),
                actual: error.to_string(),
                detail: response_body.unwrap_or_else(|| error.to_string()),
                curl_command: plan.as_ref().map(|p| p.curl_command()),
            });
        }
    }
}

fn describe_expectation(expectation: &Expectation) -> String {
    match expectation {
        Expectation::Status(code) => format!("status {code}"),
        Expectation::Script { script } => format!("predicate `{}`", script.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_use_ten_second_timeout() {
        let options = RunOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(!options.dry_run);
    }

    #[test]
    fn describes_both_expectation_shapes() {
        assert_eq!(describe_expectation(&Expectation::Status(201)), "status 201");
        let script = Expectation::Script {
            script: " assert(res.status < 300) ".to_string(),
        };
        assert_eq!(
            describe_expectation(&script),
            "predicate `assert(res.status < 300)`"
        );
    }
}
