//! Client configuration.
//!
//! # Responsibility
//! - Resolve API base URL, timeout, token slot path and refresh policy.
//! - Validate values once so downstream code can trust them.
//!
//! # Invariants
//! - `api_base_url` parses as an absolute http(s) URL with a host, no query
//!   and no fragment, and carries no trailing slash.
//! - `request_timeout`, when set, is non-zero.

use reqwest::Url;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const ENV_API_URL: &str = "JOTTER_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "JOTTER_TIMEOUT_SECS";
pub const ENV_DB_PATH: &str = "JOTTER_DB_PATH";
pub const ENV_REFRESH: &str = "JOTTER_REFRESH";
const DEFAULT_DB_FILE_NAME: &str = "jotter_session.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid API base URL `{0}`; expected an absolute http(s) URL")]
    InvalidBaseUrl(String),
    #[error("invalid request timeout `{0}`; expected a positive number of seconds")]
    InvalidTimeout(String),
    #[error("unsupported refresh policy `{0}`; expected manual|refetch")]
    InvalidRefreshPolicy(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// How the notes store keeps `notes` in step with the server after writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Create/update leave `notes` alone; delete prunes locally.
    #[default]
    Manual,
    /// Every successful create, update or delete is followed by a fetch.
    RefetchAfterWrite,
}

impl FromStr for RefreshPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "refetch" | "refetch_after_write" => Ok(Self::RefetchAfterWrite),
            other => Err(ConfigError::InvalidRefreshPolicy(other.to_string())),
        }
    }
}

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_base_url: String,
    request_timeout: Option<Duration>,
    token_db_path: PathBuf,
    refresh_policy: RefreshPolicy,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut builder = Self::builder();
        if let Some(url) = read(ENV_API_URL) {
            builder = builder.api_base_url(url);
        }
        if let Some(raw) = read(ENV_TIMEOUT_SECS) {
            builder = builder.request_timeout(Some(parse_timeout_secs(&raw)?));
        }
        if let Some(path) = read(ENV_DB_PATH) {
            builder = builder.token_db_path(path);
        }
        if let Some(policy) = read(ENV_REFRESH) {
            builder = builder.refresh_policy(policy.parse()?);
        }
        builder.build()
    }

    /// Reopens this configuration for overrides (e.g. from CLI flags).
    pub fn into_builder(self) -> ClientConfigBuilder {
        ClientConfigBuilder {
            api_base_url: Some(self.api_base_url),
            request_timeout: self.request_timeout,
            token_db_path: Some(self.token_db_path),
            refresh_policy: self.refresh_policy,
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn token_db_path(&self) -> &Path {
        &self.token_db_path
    }

    pub fn refresh_policy(&self) -> RefreshPolicy {
        self.refresh_policy
    }
}

/// Builder for `ClientConfig`; unset values take their defaults.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    api_base_url: Option<String>,
    request_timeout: Option<Duration>,
    token_db_path: Option<PathBuf>,
    refresh_policy: RefreshPolicy,
}

impl ClientConfigBuilder {
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn token_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_db_path = Some(path.into());
        self
    }

    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let api_base_url = normalize_base_url(
            self.api_base_url.as_deref().unwrap_or(DEFAULT_API_URL),
        )?;
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidTimeout("0".to_string()));
        }
        let token_db_path = self
            .token_db_path
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        Ok(ClientConfig {
            api_base_url,
            request_timeout: self.request_timeout,
            token_db_path,
            refresh_policy: self.refresh_policy,
        })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = || ConfigError::InvalidBaseUrl(raw.to_string());
    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    let is_http = matches!(url.scheme(), "http" | "https");
    if !is_http || !url.has_host() || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
