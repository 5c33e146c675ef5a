//! Transport trait and implementations for talking to the RunCloud API.
//!
//! The core only needs `METHOD(path, body) -> (status, json)`. The primary
//! implementation is [`http::HttpTransport`], a blocking `ureq` client.
//!
//! # Testing
//!
//! Use [`MockTransport`] to script responses without network access:
//!
//! ```
//! use runcloud_api::transport::{Method, MockTransport, Transport};
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.respond(Method::Get, "servers/1", 200, json!({"id": 1}));
//!
//! let response = mock.send(Method::Get, "servers/1", None).unwrap();
//! assert_eq!(response.status, 200);
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

/// HTTP method used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read a resource or collection.
    Get,
    /// Create, or call an action endpoint.
    Post,
    /// Replace a resource.
    Put,
    /// Update part of a resource.
    Patch,
    /// Remove a resource.
    Delete,
}

impl Method {
    /// Whether requests with this method change remote state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Get)
    }

    /// Upper-case method name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded API response.
///
/// `body` is `Value::Null` when the response had no body or the body was not
/// valid JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body.
    pub body: Value,
}

impl ApiResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Whether the status code is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The API's `message` field, if present.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Return the body, or a transport error for non-2xx responses.
    pub fn into_success(self, method: Method, path: &str) -> Result<Value> {
        if self.is_success() {
            return Ok(self.body);
        }
        let message = self
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status));
        Err(Error::transport(method, path, Some(self.status), message))
    }
}

/// Transport for authenticated API calls.
///
/// Implementations own the base URL, credentials and timeout. `path` is
/// relative to the API base (a leading `/` is ignored).
pub trait Transport: Send + Sync {
    /// Send one request and decode the response.
    ///
    /// Returns `Ok` for any HTTP status; only network-level failures are
    /// errors here.
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        (**self).send(method, path, body)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        (**self).send(method, path, body)
    }
}

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Request method.
    pub method: Method,
    /// Path without leading slash.
    pub path: String,
    /// JSON body, if one was sent.
    pub body: Option<Value>,
}

/// Mock transport for testing without network access.
///
/// Responses are scripted per `(method, path)`. Several responses for the
/// same route are returned in order; the last one keeps being returned once
/// the queue is drained. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Create a new mock with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a route.
    pub fn respond(&self, method: Method, path: impl Into<String>, status: u16, body: Value) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry((method, path.into()))
            .or_default()
            .push_back(ApiResponse::new(status, body));
    }

    /// Queue a `200 OK` response for a route.
    pub fn ok(&self, method: Method, path: impl Into<String>, body: Value) {
        self.respond(method, path, 200, body);
    }

    /// Queue a single-page collection response for a `GET` route.
    pub fn collection(&self, path: impl Into<String>, records: Vec<Value>) {
        self.ok(Method::Get, path, page_envelope(records, 1, 1));
    }

    /// All requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests that change remote state.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method.is_mutating())
            .collect()
    }

    /// Requests received for a given method and path.
    #[must_use]
    pub fn calls(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Forget recorded requests, keeping the routes.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl Transport for MockTransport {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let path = path.trim_start_matches('/');
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(&(method, path.to_string()))
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::transport(method, path, None, "no mock response configured"))?;

        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| Error::transport(method, path, None, "no mock response configured"))
    }
}

/// Build a paginated list envelope as the API returns it.
#[must_use]
pub fn page_envelope(data: Vec<Value>, current_page: u64, total_pages: u64) -> Value {
    serde_json::json!({
        "data": data,
        "meta": {
            "pagination": {
                "current_page": current_page,
                "total_pages": total_pages,
            }
        }
    })
}
