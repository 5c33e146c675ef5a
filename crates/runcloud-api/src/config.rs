//! Client configuration: endpoint, credentials and request timeout.

use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;

/// Default RunCloud API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://manage.runcloud.io/api/v2";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV: &[&str] = &["RC_API_KEY", "RUNCLOUD_API_KEY"];

/// Environment variables consulted for the API secret, in order.
pub const API_SECRET_ENV: &[&str] = &["RC_API_SECRET", "RUNCLOUD_API_SECRET"];

/// Connection settings for the RunCloud API.
///
/// # Example
///
/// ```
/// use runcloud_api::ApiConfig;
///
/// let config = ApiConfig::new("key", "secret").timeout_secs(30);
/// assert_eq!(config.timeout().as_secs(), 30);
/// assert_eq!(config.base_url, runcloud_api::config::DEFAULT_BASE_URL);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// API key (HTTP Basic username).
    pub api_key: String,
    /// API secret (HTTP Basic password).
    pub api_secret: String,
    /// Timeout applied to every request.
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Create a config with the default endpoint and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build a config from `RC_API_KEY`/`RUNCLOUD_API_KEY` and
    /// `RC_API_SECRET`/`RUNCLOUD_API_SECRET`.
    pub fn from_env() -> Result<Self> {
        let api_key = env_fallback(API_KEY_ENV)
            .ok_or_else(|| Error::Config(format!("API key not set ({})", API_KEY_ENV.join(" or "))))?;
        let api_secret = env_fallback(API_SECRET_ENV).ok_or_else(|| {
            Error::Config(format!("API secret not set ({})", API_SECRET_ENV.join(" or ")))
        })?;
        Ok(Self::new(api_key, api_secret))
    }

    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the config can be used to authenticate.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("API key is empty".to_string()));
        }
        if self.api_secret.trim().is_empty() {
            return Err(Error::Config("API secret is empty".to_string()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "base URL must start with http:// or https:// (got '{}')",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be at least 1 second".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// First non-empty value among the given environment variables.
#[must_use]
pub fn env_fallback(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
