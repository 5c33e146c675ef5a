//! # runcloud-api
//!
//! Blocking client plumbing for the RunCloud v2 REST API.
//!
//! This crate provides:
//! - A [`Transport`] abstraction with a `ureq` implementation and an
//!   in-memory [`MockTransport`] for tests
//! - Collection pagination ([`pager::fetch_all`])
//! - Name-to-id resolution ([`resolver::resolve`])
//! - A [`Client`] facade used by the reconcilers
//!
//! ## Example
//!
//! ```no_run
//! use runcloud_api::{ApiConfig, Client, Lookup};
//! use runcloud_api::resolver::Collection;
//!
//! let client = Client::from_config(&ApiConfig::from_env()?)?;
//!
//! let servers = client.fetch_all("servers")?;
//! println!("{} servers", servers.len());
//!
//! let id = client.resolve(Collection::named("server", "servers"), &Lookup::by_name("web-1"))?;
//! println!("web-1 is server {id}");
//! # Ok::<(), runcloud_api::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod pager;
pub mod resolver;
pub mod transport;
pub mod types;

pub use config::ApiConfig;
pub use error::{Error, ErrorCategory, Result};
pub use transport::{ApiResponse, Method, MockTransport, Transport};
pub use types::{Lookup, Record, record_id};

use resolver::Collection;
use serde_json::Value;
use transport::http::HttpTransport;

/// High-level client used by the reconcilers.
///
/// Checked helpers (`get`, `post`, ...) turn non-2xx responses into
/// [`Error::Transport`]; [`Client::send`] returns the raw response.
pub struct Client {
    transport: Box<dyn Transport>,
}

impl Client {
    /// Create a client over the `ureq` transport.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Ok(Self::with_transport(Box::new(HttpTransport::new(config)?)))
    }

    /// Create a client with a custom transport (useful for testing).
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Get the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Send a request without checking the status.
    pub fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.transport.send(method, path, body)
    }

    /// Send a request and require a 2xx status.
    pub fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.send(method, path, body)?.into_success(method, path)
    }

    /// `GET` a resource.
    pub fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::Get, path, None)
    }

    /// `POST` a JSON body.
    pub fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::Post, path, Some(body))
    }

    /// `PATCH` a JSON body.
    pub fn patch(&self, path: &str, body: &Value) -> Result<Value> {
        self.request(Method::Patch, path, Some(body))
    }

    /// `DELETE` a resource, with an optional JSON body.
    pub fn delete(&self, path: &str, body: Option<&Value>) -> Result<Value> {
        self.request(Method::Delete, path, body.filter(|b| !b.is_null()))
    }

    // =========================================================================
    // Collections
    // =========================================================================

    /// Fetch every record of a paginated collection.
    pub fn fetch_all(&self, path: &str) -> Result<Vec<Record>> {
        pager::fetch_all(self.transport(), path)
    }

    /// Resolve a name or id hint to an id.
    pub fn resolve(&self, collection: Collection<'_>, lookup: &Lookup) -> Result<u64> {
        resolver::resolve(self.transport(), collection, lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(mock: &MockTransport) -> Client {
        Client::with_transport(Box::new(mock.clone()))
    }

    #[test]
    fn test_client_checked_get() {
        let mock = MockTransport::new();
        mock.ok(Method::Get, "servers/1", json!({"id": 1}));
        mock.respond(Method::Get, "servers/2", 404, json!({"message": "Not found."}));

        let client = client(&mock);
        assert_eq!(client.get("servers/1").unwrap()["id"], 1);
        let err = client.get("servers/2").unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_client_send_is_unchecked() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "servers/2", 404, json!({"message": "Not found."}));
        let response = client(&mock).send(Method::Get, "servers/2", None).unwrap();
        assert_eq!(response.message(), Some("Not found."));
    }

    #[test]
    fn test_client_delete_null_body_sends_none() {
        let mock = MockTransport::new();
        mock.ok(Method::Delete, "servers/1/users/5", Value::Null);

        client(&mock).delete("servers/1/users/5", Some(&Value::Null)).unwrap();
        let calls = mock.calls(Method::Delete, "servers/1/users/5");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body, None);
    }

    #[test]
    fn test_client_delete_with_body() {
        let mock = MockTransport::new();
        mock.ok(Method::Delete, "servers/1/databases/3/grant", json!({}));

        let body = json!({"id": 8});
        client(&mock)
            .delete("servers/1/databases/3/grant", Some(&body))
            .unwrap();
        assert_eq!(mock.requests()[0].body, Some(body));
    }

    #[test]
    fn test_client_fetch_and_resolve() {
        let mock = MockTransport::new();
        mock.collection("servers", vec![json!({"id": 4, "name": "web-1"})]);
        let client = client(&mock);

        assert_eq!(client.fetch_all("servers").unwrap().len(), 1);
        let id = client
            .resolve(Collection::named("server", "servers"), &Lookup::by_name("web-1"))
            .unwrap();
        assert_eq!(id, 4);
    }
}
