//! Login form validation, run before any network call.

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;

use std::fmt;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Per-field messages for the login form. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [self.email.as_deref(), self.password.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        f.write_str(&messages.join("; "))
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
#[must_use]
pub fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Validate a login attempt.
///
/// # Errors
///
/// Returns the per-field messages when any field is invalid.
pub fn validate_login(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    let email = email.trim();
    if email.is_empty() {
        errors.email = Some("Email is required".to_owned());
    } else if !is_email_shaped(email) {
        errors.email = Some("Invalid email format".to_owned());
    }

    errors.password = password_error(password);

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Message for a password that fails the length rule.
#[must_use]
pub fn password_error(password: &str) -> Option<String> {
    if password.is_empty() {
        Some("Password is required".to_owned())
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        Some(format!("Password must be at least {MIN_PASSWORD_LEN} characters"))
    } else {
        None
    }
}
