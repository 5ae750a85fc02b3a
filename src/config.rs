//! API client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use crate::error::ConfigError;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl ClientTimeouts {
    /// Timeouts from `API_REQUEST_TIMEOUT_SECS` / `API_CONNECT_TIMEOUT_SECS`.
    /// Missing or unparseable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            request_secs: parse_u64(lookup("API_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("API_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Remote API origin without a trailing slash, e.g. `https://api.example.com`.
    pub base_url: String,
    pub timeouts: ClientTimeouts,
}

impl ClientConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `base_url` is not an http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self { base_url: parse_base_url(base_url)?, timeouts: ClientTimeouts::default() })
    }

    /// Build typed client config from environment variables.
    ///
    /// Required:
    /// - `API_BASE_URL`
    ///
    /// Optional:
    /// - `API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `API_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if `API_BASE_URL` is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// [`ClientConfig::from_env`] over an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `API_BASE_URL` is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup("API_BASE_URL").ok_or(ConfigError::Missing("API_BASE_URL"))?;
        Ok(Self { base_url: parse_base_url(&raw)?, timeouts: ClientTimeouts::from_lookup(&lookup) })
    }

    #[must_use]
    pub fn with_timeouts(self, timeouts: ClientTimeouts) -> Self {
        Self { timeouts, ..self }
    }

    /// Absolute URL for an API path such as `/api/auth/me`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let valid_scheme = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    let has_host = trimmed.split_once("://").is_some_and(|(_, rest)| !rest.is_empty());
    if !valid_scheme || !has_host {
        return Err(ConfigError::Invalid { key: "API_BASE_URL", reason: format!("{raw:?} is not an http(s) URL") });
    }
    Ok(trimmed.to_owned())
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}
