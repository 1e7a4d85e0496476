//! Error types for the contract-test runner.
//!
//! Every error except [`RunnerError::Configuration`] is case-scoped: it fails
//! the case that raised it and the run continues with the remaining cases.
//! Configuration errors surface before any case executes and abort the run.

/// Error types for spec loading and case execution
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Specification file is missing required fields or otherwise malformed.
    /// Fatal: raised before any case runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A path placeholder referenced a shared-state key that is unbound at
    /// resolution time. No request is dispatched for the affected case.
    #[error("no value bound for `:{key}` while resolving `{template}`")]
    MissingState { key: String, template: String },

    /// The response did not satisfy the declared expectation.
    #[error("expectation failed: expected {expected}, got {actual}")]
    ExpectationMismatch { expected: String, actual: String },

    /// A derived header/body script could not be evaluated.
    #[error("script error: {0}")]
    Script(String),

    /// An on_response/assert/update_state hook raised after the expectation
    /// had already passed. The hook's state writes are discarded.
    #[error("post-processing hook failed: {0}")]
    PostProcessing(String),

    /// The HTTP call itself could not complete (network failure or timeout).
    #[error("transport error: {0}")]
    Transport(String),
}

impl RunnerError {
    /// Whether this error aborts the whole run rather than a single case.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunnerError::Configuration(_))
    }
}
