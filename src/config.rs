//! Client configuration
//!
//! Credentials are resolved per field: command-line flag, then environment,
//! then the profile file (`~/.config/rcctl/config.toml`), then defaults.

use anyhow::{Context, Result};
use runcloud_api::ApiConfig;
use runcloud_api::config::{
    API_KEY_ENV, API_SECRET_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, env_fallback,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("rcctl"))
}

/// Profile file with stored credentials
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Profile {
    /// Load the profile at `path`, or the default location
    ///
    /// A missing file is an empty profile; a malformed one is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
            None => config_dir()?.join("config.toml"),
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no profile at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid profile {}", path.display()))
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Overrides {
    /// Fill unset credentials from the environment
    pub fn with_env(mut self) -> Self {
        self.api_key = self.api_key.or_else(|| env_fallback(API_KEY_ENV));
        self.api_secret = self.api_secret.or_else(|| env_fallback(API_SECRET_ENV));
        self
    }
}

/// Merge flags/environment over the profile and validate the result
pub fn resolve(overrides: Overrides, profile: Profile) -> runcloud_api::Result<ApiConfig> {
    let api_key = overrides.api_key.or(profile.api_key).ok_or_else(|| {
        runcloud_api::Error::Config(format!(
            "API key not set (--api-key, {} or the profile file)",
            API_KEY_ENV.join("/")
        ))
    })?;
    let api_secret = overrides.api_secret.or(profile.api_secret).ok_or_else(|| {
        runcloud_api::Error::Config(format!(
            "API secret not set (--api-secret, {} or the profile file)",
            API_SECRET_ENV.join("/")
        ))
    })?;

    let config = ApiConfig::new(api_key, api_secret)
        .base_url(
            overrides
                .base_url
                .or(profile.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )
        .timeout_secs(
            overrides
                .timeout_secs
                .or(profile.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
    config.validate()?;
    Ok(config)
}
