//! Blocking HTTP transport backed by `ureq`.
//!
//! Every request carries HTTP Basic credentials and JSON `Accept` /
//! `Content-Type` headers. The configured timeout applies to the whole
//! request. Non-2xx statuses are returned as responses, not errors, so the
//! caller decides what a failure means.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::transport::{ApiResponse, Method, Transport};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::{Body, RequestBuilder};

type HttpResponse = ureq::http::Response<Body>;

/// `ureq` transport for the RunCloud API.
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
}

impl HttpTransport {
    /// Create a transport from a validated config.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.validate()?;

        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build();

        let credentials = format!("{}:{}", config.api_key, config.api_secret);
        Ok(Self {
            agent: ureq::Agent::new_with_config(agent_config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {}", STANDARD.encode(credentials)),
        })
    }

    /// Join the base URL and an API path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        request
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Authorization", &self.authorization)
    }

    fn call(&self, request: RequestBuilder<WithoutBody>) -> std::result::Result<HttpResponse, ureq::Error> {
        self.headers(request).call()
    }

    fn call_with(
        &self,
        request: RequestBuilder<WithBody>,
        body: Option<&Value>,
    ) -> std::result::Result<HttpResponse, ureq::Error> {
        let request = self.headers(request);
        match body {
            Some(body) => request.send_json(body),
            None => request.send_empty(),
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let url = self.url(path);
        // An explicit JSON null is not sent as a body.
        let body = body.filter(|b| !b.is_null());
        log::debug!("{} {}", method, url);

        let result = match method {
            Method::Get => self.call(self.agent.get(&url)),
            Method::Delete => match body {
                Some(_) => self.call_with(self.agent.delete(&url).force_send_body(), body),
                None => self.call(self.agent.delete(&url)),
            },
            Method::Post => self.call_with(self.agent.post(&url), body),
            Method::Put => self.call_with(self.agent.put(&url), body),
            Method::Patch => self.call_with(self.agent.patch(&url), body),
        };

        let mut response =
            result.map_err(|err| Error::transport(method, path, None, err.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|err| Error::transport(method, path, Some(status), err.to_string()))?;

        log::debug!("{} {} -> {}", method, path, status);
        Ok(ApiResponse::new(status, parse_body(&text)))
    }
}

/// Decode a response body, treating empty or non-JSON bodies as `null`.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or(Value::Null)
}
