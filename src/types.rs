//! Wire DTOs shared with the remote admin API.
//!
//! DESIGN
//! ======
//! Every endpoint answers with the same `{ success, message, data, error }`
//! envelope. Field names follow the backend's camelCase JSON so serde handles
//! the translation at the boundary and the rest of the crate stays snake_case.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Role value the backend assigns to panel administrators.
pub const ADMIN_ROLE: &str = "admin";

/// Staff account as returned by `/api/auth/me` and the login response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend user identifier.
    pub id: i64,
    /// Display name shown in the header.
    pub username: String,
    /// Login email address.
    pub email: String,
    /// Flat role string (`admin`, `kitchen`, `waiter`).
    pub role: String,
    /// Restaurant the account belongs to, when scoped.
    #[serde(default)]
    pub restaurant_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    /// Whether the account carries the admin role. Used for display only;
    /// the remote API enforces authorization.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE)
    }
}

/// Standard response envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Server-provided human message, preferring `message` over `error`.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|m| !m.trim().is_empty())
    }

    /// Consume the envelope, returning `data` only when the call succeeded.
    #[must_use]
    pub fn into_success(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}

/// Payload of a successful login.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /api/auth/login` body.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// The panel only admits admin accounts; the backend rejects other roles.
    pub required_role: &'a str,
}

/// `PUT /api/auth/change-password` body.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}
