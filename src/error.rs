//! Error taxonomy for the session core.
//!
//! DESIGN
//! ======
//! API failures fall into three classes that drive different behavior:
//! credential-invalid (401) tears the session down, request-rejected (4xx)
//! belongs to the calling form, service-unavailable (5xx, network) is a
//! retryable generic failure. `ApiError::kind` exposes the class so callers
//! never match on raw status codes.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Failure class of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote service rejected the bearer credential (401).
    CredentialInvalid,
    /// The request itself was refused (400, 403, 404, 409, 422, ...).
    RequestRejected,
    /// Server-side failure or no response at all.
    ServiceUnavailable,
}

/// Error returned by the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized: {}", message.as_deref().unwrap_or("credential rejected"))]
    Unauthorized { message: Option<String> },
    #[error("request rejected ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },
    #[error("server error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("request body could not be encoded: {0}")]
    Encode(String),
}

impl ApiError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::CredentialInvalid,
            Self::Rejected { .. } | Self::Encode(_) => ErrorKind::RequestRejected,
            Self::Server { .. } | Self::Network(_) | Self::Decode(_) => ErrorKind::ServiceUnavailable,
        }
    }

    /// HTTP status carried by the error, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) | Self::Encode(_) => None,
        }
    }

    /// Whether retrying the same request could succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { status: 500..=599, .. })
    }

    /// Server-provided message, when the response body carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Rejected { message, .. } | Self::Server { message, .. } => {
                message.as_deref()
            }
            Self::Network(_) | Self::Decode(_) | Self::Encode(_) => None,
        }
    }

    /// Message suitable for showing to the operator: the server's own text
    /// when present, otherwise a default for the status.
    #[must_use]
    pub fn user_message(&self) -> String {
        if let Some(message) = self.server_message() {
            return message.to_owned();
        }
        match self.status() {
            Some(400) => "Invalid request data".to_owned(),
            Some(401) => "Unauthorized access".to_owned(),
            Some(403) => "Access forbidden".to_owned(),
            Some(404) => "Resource not found".to_owned(),
            Some(409) => "Resource already exists".to_owned(),
            Some(422) => "Validation error".to_owned(),
            Some(500) => "Internal server error".to_owned(),
            _ => match self {
                Self::Network(detail) | Self::Decode(detail) | Self::Encode(detail) if !detail.is_empty() => {
                    detail.clone()
                }
                _ => "An error occurred".to_owned(),
            },
        }
    }
}

/// Error raised by a credential channel (cookie jar or script store).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Invalid route or client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
