//! Vouch: a declarative contract-test runner for HTTP APIs.
//!
//! A YAML specification (base URL + ordered groups of test cases) is
//! interpreted case by case: `:name` path placeholders are resolved against
//! shared state accumulated by earlier cases, the request is dispatched,
//! the response is checked against a literal status or a Rhai predicate, and
//! post-response hooks assert on the payload and thread values into shared
//! state for downstream cases. Failures are reported with an equivalent curl
//! command so they can be reproduced outside the runner.

// ===== Core interpretation engine =====
pub mod error;
pub mod executor;
pub mod expect;
pub mod request;
pub mod resolve;
pub mod script;
pub mod spec;
pub mod state;

// ===== Driving & reporting =====
pub mod report;
pub mod suite;
pub mod transport;

pub use error::RunnerError;
pub use report::SuiteReport;
pub use spec::Specification;
pub use suite::{run_suite, RunOptions};
pub use transport::{HttpResponse, HttpTransport, Transport};
