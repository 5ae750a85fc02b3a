//! HTTP transport seam under the request pipeline.
//!
//! DESIGN
//! ======
//! `ApiRequest`/`ApiResponse` are the single request/response pipeline type
//! the outbound and inbound middleware operate on. `Transport` only moves
//! bytes: it never inspects status codes, so every auth decision stays in
//! `pipeline` where it can be tested without a network stack.

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
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

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/api/auth/me`.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: Vec::new(), body: None }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    #[must_use]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a header, replacing any existing value (names compare
    /// case-insensitively).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.into()));
        self
    }

    /// Drop a header (case-insensitive name match).
    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Token carried in the `Authorization: Bearer` header, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.header(AUTHORIZATION)?.strip_prefix("Bearer ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `message` (or `error`) string from a JSON error body.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        ["message", "error"]
            .iter()
            .find_map(|key| self.body.get(key).and_then(Value::as_str))
            .filter(|m| !m.trim().is_empty())
            .map(str::to_owned)
    }
}

/// No response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out")]
    Timeout,
}

/// Sends a prepared request and returns whatever the server answered,
/// including error statuses.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Decode a response body: empty is `null`, non-JSON text is kept as a string.
#[must_use]
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

// =============================================================================
// REQWEST
// =============================================================================

#[cfg(not(target_arch = "wasm32"))]
pub use native::ReqwestTransport;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::time::Duration;

    use super::{ApiRequest, ApiResponse, Method, Transport, TransportError, parse_body};
    use crate::config::ClientConfig;

    /// Native transport over a shared `reqwest::Client`.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        http: reqwest::Client,
        config: ClientConfig,
    }

    impl ReqwestTransport {
        /// # Errors
        ///
        /// Returns an error if the HTTP client cannot be constructed.
        pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeouts.request_secs))
                .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
                .build()
                .map_err(|e| TransportError::Request(e.to_string()))?;
            Ok(Self { http, config })
        }
    }

    fn reqwest_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    fn map_error(e: reqwest::Error) -> TransportError {
        if e.is_timeout() { TransportError::Timeout } else { TransportError::Request(e.to_string()) }
    }

    #[async_trait::async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            let url = self.config.url(&request.path);
            let mut builder = self.http.request(reqwest_method(request.method), url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(map_error)?;
            let status = response.status().as_u16();
            let bytes = response.bytes().await.map_err(map_error)?;
            Ok(ApiResponse::new(status, parse_body(&bytes)))
        }
    }
}

// =============================================================================
// BROWSER
// =============================================================================

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
pub use browser::GlooTransport;

#[cfg(all(feature = "hydrate", target_arch = "wasm32"))]
mod browser {
    use super::{ApiRequest, ApiResponse, Method, Transport, TransportError, parse_body};
    use crate::config::ClientConfig;

    /// Browser transport over `fetch` via `gloo-net`.
    #[derive(Debug, Clone)]
    pub struct GlooTransport {
        config: ClientConfig,
    }

    impl GlooTransport {
        #[must_use]
        pub fn new(config: ClientConfig) -> Self {
            Self { config }
        }
    }

    fn request_error(e: gloo_net::Error) -> TransportError {
        TransportError::Request(e.to_string())
    }

    #[async_trait::async_trait(?Send)]
    impl Transport for GlooTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            use gloo_net::http::{Method as GlooMethod, RequestBuilder};

            let method = match request.method {
                Method::Get => GlooMethod::GET,
                Method::Post => GlooMethod::POST,
                Method::Put => GlooMethod::PUT,
                Method::Patch => GlooMethod::PATCH,
                Method::Delete => GlooMethod::DELETE,
            };
            let mut builder = RequestBuilder::new(&self.config.url(&request.path)).method(method);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            let prepared = match &request.body {
                Some(body) => builder.json(body).map_err(request_error)?,
                None => builder.build().map_err(request_error)?,
            };

            let response = prepared.send().await.map_err(request_error)?;
            let status = response.status();
            let bytes = response.binary().await.map_err(request_error)?;
            Ok(ApiResponse::new(status, parse_body(&bytes)))
        }
    }
}
