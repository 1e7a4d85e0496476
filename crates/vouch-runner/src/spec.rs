//! Specification types and loading.
//!
//! A specification is a YAML document with a `base_url` and ordered `groups`
//! of test cases. Declaration order of groups and of cases within a group is
//! the execution order, so `groups` deserializes into a vector instead of a
//! hash map. All structural problems (missing fields, malformed request
//! lines, illegal hook combinations) are configuration errors raised before
//! any case runs.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

use crate::error::RunnerError;

/// Methods a case's request line may use. The transport dispatches every
/// entry (see `transport::parse_method`).
pub(crate) const KNOWN_METHODS: &[&str] =
    &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

#[derive(Debug, Clone, Deserialize)]
pub struct Specification {
    /// Root URL every resolved path is appended to. A trailing slash is
    /// tolerated and stripped.
    pub base_url: String,
    /// Groups in declaration order, each holding its cases in declaration
    /// order.
    #[serde(deserialize_with = "ordered_groups")]
    pub groups: Vec<TestGroup>,
}

#[derive(Debug, Clone)]
pub struct TestGroup {
    pub name: String,
    pub cases: Vec<TestCase>,
}

/// One declarative row: a request, its expectation and optional hooks.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Human-readable test name.
    pub title: String,
    /// `"METHOD /path/:param"`; the method is case-insensitive.
    pub request: String,
    #[serde(default)]
    pub headers: Option<ValueSource>,
    #[serde(default)]
    pub body: Option<ValueSource>,
    pub expect: Expectation,
    #[serde(default)]
    pub on_response: Option<String>,
    #[serde(default)]
    pub assert: Option<String>,
    #[serde(default)]
    pub update_state: Option<String>,
}

/// A literal value or a Rhai script deriving one from shared state.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValueSource {
    Script { script: String },
    Literal(Value),
}

/// Pass/fail criterion for a response: a fixed status code, or a Rhai
/// predicate run with `res` in scope that throws on mismatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    Status(u16),
    Script { script: String },
}

/// Post-response hook shape, discriminated explicitly instead of by row
/// length: either one combined hook, or an assertion followed by a state
/// update (the update never runs when the assertion raises).
#[derive(Debug, Clone, Copy)]
pub enum Hooks<'a> {
    Combined { on_response: &'a str },
    Split {
        assert: &'a str,
        update_state: &'a str,
    },
}

impl TestCase {
    /// Split the request line into an uppercased method and a path template.
    pub fn method_and_path(&self) -> Result<(String, String), RunnerError> {
        let mut parts = self.request.split_whitespace();
        let (method, path) = match (parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(path), None) => (method.to_uppercase(), path),
            _ => {
                return Err(RunnerError::Configuration(format!(
                    "case `{}`: request must be `METHOD /path`, got `{}`",
                    self.title, self.request
                )))
            }
        };

        if !KNOWN_METHODS.contains(&method.as_str()) {
            return Err(RunnerError::Configuration(format!(
                "case `{}`: unknown HTTP method `{method}`",
                self.title
            )));
        }
        if !path.starts_with('/') {
            return Err(RunnerError::Configuration(format!(
                "case `{}`: path `{path}` must start with `/`",
                self.title
            )));
        }

        Ok((method, path.to_string()))
    }

    /// The hook shape for this case, assuming [`Specification::validate`]
    /// already rejected illegal combinations.
    pub fn hooks(&self) -> Option<Hooks<'_>> {
        match (&self.on_response, &self.assert, &self.update_state) {
            (Some(on_response), None, None) => Some(Hooks::Combined { on_response }),
            (None, Some(assert), Some(update_state)) => Some(Hooks::Split {
                assert,
                update_state,
            }),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), RunnerError> {
        if self.title.trim().is_empty() {
            return Err(RunnerError::Configuration(
                "case with empty title".to_string(),
            ));
        }
        self.method_and_path()?;

        match (&self.on_response, &self.assert, &self.update_state) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                Err(RunnerError::Configuration(format!(
                    "case `{}`: on_response cannot be combined with assert/update_state",
                    self.title
                )))
            }
            (None, Some(_), None) | (None, None, Some(_)) => {
                Err(RunnerError::Configuration(format!(
                    "case `{}`: assert and update_state must be supplied together",
                    self.title
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Specification {
    /// Load and validate a specification file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RunnerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RunnerError::Configuration(format!(
                "cannot read specification `{}`: {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, RunnerError> {
        let spec: Specification = serde_yaml::from_str(contents)
            .map_err(|e| RunnerError::Configuration(format!("invalid specification: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.base_url.trim().is_empty() {
            return Err(RunnerError::Configuration(
                "base_url must not be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for group in &self.groups {
            if !seen.insert(group.name.as_str()) {
                return Err(RunnerError::Configuration(format!(
                    "duplicate group `{}`",
                    group.name
                )));
            }
            for case in &group.cases {
                case.validate()?;
            }
        }
        Ok(())
    }

    /// `base_url` without any trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn case_count(&self) -> usize {
        self.groups.iter().map(|g| g.cases.len()).sum()
    }
}

/// Deserialize the `groups` mapping into a vector, keeping YAML document
/// order. A plain map type would lose the ordering the state-dependency
/// chain relies on.
fn ordered_groups<'de, D>(deserializer: D) -> Result<Vec<TestGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = Vec<TestGroup>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a mapping of group name to a list of test cases")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, cases)) = access.next_entry::<String, Vec<TestCase>>()? {
                groups.push(TestGroup { name, cases });
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_map(GroupsVisitor)
}
