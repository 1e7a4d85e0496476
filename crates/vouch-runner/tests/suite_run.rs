//! End-to-end suite runs against a scripted in-memory transport.
//!
//! These tests exercise the full path: YAML spec -> suite driver -> case
//! executor -> transport -> expectation + hooks -> report, covering ordering,
//! placeholder resolution, expectation polymorphism, hook sequencing, the
//! falsy-body quirk, failure isolation and diagnostic content.

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use vouch_runner::error::RunnerError;
use vouch_runner::request::RequestPlan;
use vouch_runner::suite::{run_suite, RunOptions};
use vouch_runner::transport::{HttpResponse, Transport};
use vouch_runner::Specification;

/// Transport that pops one scripted response per request and records every
/// plan it was handed, in order.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, RunnerError>>>,
    sent: Mutex<Vec<RequestPlan>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self::default()
    }

    fn respond(self, status: u16, body: Option<&str>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: body.map(str::to_string),
            }));
        self
    }

    fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(RunnerError::Transport(message.to_string())));
        self
    }

    fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|p| p.url.clone()).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, plan: &RequestPlan) -> Result<HttpResponse, RunnerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(plan.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(RunnerError::Transport(
                    "no scripted response left".to_string(),
                ))
            })
    }
}

fn spec(yaml: &str) -> Specification {
    Specification::from_yaml(yaml).unwrap()
}

// Execution order equals declaration order, including across groups, and
// downstream cases observe upstream state mutations.
#[tokio::test]
async fn cases_run_in_declaration_order_across_groups() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  setup:
    - title: noop
      request: GET /ping
      expect: 200
    - title: create
      request: POST /items
      body: { name: x }
      expect: 201
      on_response: "state.x = res.body.id"
  observe:
    - title: read back
      request: GET /items/:x
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new()
        .respond(200, None)
        .respond(201, Some(r#"{"id": 7}"#))
        .respond(200, Some(r#"{"id": 7}"#));

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;

    assert_eq!(report.passed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(
        transport.sent_urls(),
        [
            "http://api/ping",
            "http://api/items",
            "http://api/items/7"
        ]
    );
}

// An unbound placeholder fails the case before any dispatch.
#[tokio::test]
async fn unresolved_placeholder_fails_without_dispatch() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: fetch
      request: GET /items/:id
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new().respond(200, None);

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;

    assert_eq!(report.failed, 1);
    assert!(transport.sent_urls().is_empty());
    assert!(report.failures[0].actual.contains("id"));
}

// Literal status expectations are strict; script predicates decide for
// themselves.
#[tokio::test]
async fn expectation_polymorphism() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: wrong status
      request: POST /items
      expect: 201
    - title: predicate pass
      request: DELETE /items/1
      expect:
        script: "assert(res.status < 300)"
    - title: predicate fail
      request: GET /gone
      expect:
        script: "assert(res.status < 300)"
"#,
    );
    let transport = ScriptedTransport::new()
        .respond(200, None)
        .respond(204, None)
        .respond(404, None);

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;

    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 2);
    assert!(report.failures[0].actual.contains("status 200"));
}

// When assert raises, update_state never runs, so the downstream case
// that needs the state key fails unresolved.
#[tokio::test]
async fn failed_assert_suppresses_state_update() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: strict create
      request: POST /items
      expect: 201
      assert: "assert_eq(res.body.name, \"expected\")"
      update_state: "state.id = res.body.id"
    - title: dependent read
      request: GET /items/:id
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new()
        .respond(201, Some(r#"{"id": 9, "name": "other"}"#))
        .respond(200, None);

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;

    // both fail: the assert itself, then the cascade from the missing key
    assert_eq!(report.failed, 2);
    assert_eq!(transport.sent_urls(), ["http://api/items"]);
}

// Falsy bodies are omitted from the outgoing request.
#[tokio::test]
async fn falsy_bodies_are_not_sent() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: zero body
      request: POST /echo
      body: 0
      expect: 200
    - title: empty string body
      request: POST /echo
      body: ""
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new().respond(200, None).respond(200, None);

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;

    assert_eq!(report.passed, 2);
    for plan in transport.sent.lock().unwrap().iter() {
        assert!(plan.body.is_none());
    }
}

// One failing case does not prevent independent later cases from passing.
#[tokio::test]
async fn failures_are_isolated() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: broken
      request: GET /broken
      expect: 200
    - title: independent
      request: GET /ok
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new()
        .respond(500, Some("boom"))
        .respond(200, None);

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;

    assert_eq!(report.passed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(transport.sent_urls(), ["http://api/broken", "http://api/ok"]);
}

// The failure diagnostic carries the title, method, resolved URL and the
// response body (or transport error).
#[tokio::test]
async fn diagnostics_are_reproducible() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: create widget
      request: POST /items
      body: { name: widget }
      expect: 201
    - title: unreachable
      request: GET /net
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new()
        .respond(400, Some(r#"{"error": "bad name"}"#))
        .fail("connection refused");

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;
    assert_eq!(report.failed, 2);

    let first = &report.failures[0];
    assert_eq!(first.title, "create widget");
    assert_eq!(first.request, "POST http://api/items");
    assert!(first.detail.contains("bad name"));
    let curl = first.curl_command.as_deref().unwrap();
    assert!(curl.contains("-X POST"));
    assert!(curl.contains("http://api/items"));
    assert!(curl.contains("widget"));

    let second = &report.failures[1];
    assert!(second.detail.contains("connection refused"));
}

// Derived headers and bodies are evaluated against the live state snapshot.
#[tokio::test]
async fn derived_headers_and_bodies_follow_state() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  auth:
    - title: login
      request: POST /login
      body: { email: a@b.co, password: pw }
      expect: 200
      on_response: "state.token = res.body.token"
    - title: profile
      request: GET /me
      headers:
        script: "bearer_auth(state)"
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new()
        .respond(200, Some(r#"{"token": "t-42"}"#))
        .respond(200, Some(r#"{"email": "a@b.co"}"#));

    let report = run_suite(&spec, &transport, &RunOptions::default()).await;
    assert_eq!(report.passed, 2);

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent[0].body, Some(json!({"email": "a@b.co", "password": "pw"})));
    assert_eq!(
        sent[1].headers.get("Authorization"),
        Some(&"Bearer t-42".to_string())
    );
}

// A per-case timeout fails only the case that hung; the run continues.
#[tokio::test]
async fn timeout_fails_one_case_only() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: slow
      request: GET /slow
      expect: 200
    - title: fast
      request: GET /fast
      expect: 200
"#,
    );
    let mut transport = ScriptedTransport::new().respond(200, None).respond(200, None);
    transport.delay = Some(Duration::from_millis(500));

    let options = RunOptions {
        timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let report = run_suite(&spec, &transport, &options).await;

    assert_eq!(report.failed, 2);
    assert!(report.failures[0].actual.contains("timed out"));
}

// Dry runs enumerate cases without dispatching anything.
#[tokio::test]
async fn dry_run_dispatches_nothing() {
    let spec = spec(
        r#"
base_url: http://api
groups:
  g:
    - title: a
      request: GET /a
      expect: 200
    - title: b
      request: GET /b
      expect: 200
"#,
    );
    let transport = ScriptedTransport::new();
    let options = RunOptions {
        dry_run: true,
        ..Default::default()
    };

    let report = run_suite(&spec, &transport, &options).await;

    assert_eq!(report.skipped, 2);
    assert_eq!(report.passed, 0);
    assert!(transport.sent_urls().is_empty());
}

// Spec files load from disk with configuration errors surfacing before any
// case runs.
#[tokio::test]
async fn spec_files_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spec.yaml");
    std::fs::write(
        &path,
        r#"
base_url: http://api
groups:
  g:
    - title: ping
      request: GET /ping
      expect: 200
"#,
    )
    .unwrap();

    let spec = Specification::from_file(&path).unwrap();
    assert_eq!(spec.case_count(), 1);

    let missing = Specification::from_file(dir.path().join("nope.yaml"));
    assert!(matches!(missing, Err(RunnerError::Configuration(_))));
}
