use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::exchange::{Request, Response};

/// Exact-string-equality constraint on a request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BodyPattern {
    #[serde(rename = "equalTo")]
    pub equal_to: String,
}

impl BodyPattern {
    pub fn equal_to(value: impl Into<String>) -> Self {
        Self {
            equal_to: value.into(),
        }
    }
}

/// The matching rule persisted for one recorded exchange, and the key the
/// dedup count query is asked about.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestPattern {
    pub method: String,
    pub url: String,
    #[serde(rename = "bodyPatterns", skip_serializing_if = "Option::is_none")]
    pub body_patterns: Option<Vec<BodyPattern>>,
}

impl RequestPattern {
    /// Derives the pattern for an observed request. Method and URL are copied
    /// verbatim (byte equality, no normalization of trailing slashes or query
    /// order). A non-empty body adds a single exact-equality constraint on
    /// the full body text.
    pub fn from_request(request: &Request) -> Self {
        let body = request.body_as_string();
        let body_patterns = if body.is_empty() {
            None
        } else {
            Some(vec![BodyPattern::equal_to(body)])
        };

        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            body_patterns,
        }
    }
}

/// The persisted response side of a stub. The body is never inlined; it lives
/// in a separate file referenced by `body_file_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseDefinition {
    pub status: u16,
    #[serde(rename = "bodyFileName")]
    pub body_file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl ResponseDefinition {
    /// Copies the status verbatim and attaches headers only when at least one
    /// was observed, so an empty header set is omitted from the serialized
    /// output instead of persisted as `{}`.
    pub fn from_response(response: &Response, body_file_name: String) -> Self {
        let headers = if response.headers.is_empty() {
            None
        } else {
            Some(response.headers.clone())
        };

        Self {
            status: response.status,
            body_file_name,
            headers,
        }
    }
}

/// One persisted stub: a request pattern paired with its canned response.
/// Created once per recorded exchange and immutable afterwards; the JSON form
/// is the durable contract replay relies on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StubMapping {
    pub request: RequestPattern,
    pub response: ResponseDefinition,
}

impl StubMapping {
    pub fn new(request: RequestPattern, response: ResponseDefinition) -> Self {
        Self { request, response }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
