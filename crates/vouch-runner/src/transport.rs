//! Transport boundary.
//!
//! The executor talks to the network through the [`Transport`] trait so any
//! HTTP client exposing status + headers + body is substitutable (tests use
//! a scripted in-memory transport). The production implementation wraps a
//! shared `reqwest` client.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::RunnerError;
use crate::request::RequestPlan;

/// Minimal view of an HTTP response the runner needs: status, headers and
/// the raw body text (parsed lazily as JSON when a script asks for it).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpResponse {
    /// Parsed body, when the payload is valid JSON.
    pub fn body_json(&self) -> Option<Value> {
        self.body
            .as_deref()
            .and_then(|text| serde_json::from_str(text).ok())
    }
}

/// Backend-agnostic trait for dispatching one request description.
///
/// A transport failure (connect error, timeout) is a [`RunnerError::Transport`]
/// carrying the underlying message; an HTTP error status is NOT a transport
/// failure and comes back as a normal response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, plan: &RequestPlan) -> Result<HttpResponse, RunnerError>;
}

/// Production transport over a pooled reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, RunnerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunnerError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, plan: &RequestPlan) -> Result<HttpResponse, RunnerError> {
        let mut request = self.client.request(parse_method(&plan.method)?, &plan.url);

        for (name, value) in &plan.headers {
            request = request.header(name, value);
        }

        if let Some(ref body) = plan.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RunnerError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.text().await.ok().filter(|text| !text.is_empty());

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Map a validated method string onto a reqwest method. Anything the spec
/// validator lets through must parse here (see [`crate::spec::KNOWN_METHODS`]).
fn parse_method(method: &str) -> Result<reqwest::Method, RunnerError> {
    reqwest::Method::from_bytes(method.as_bytes())
        .map_err(|_| RunnerError::Transport(format!("unsupported HTTP method: {method}")))
}
