//! Session lifecycle: sign in, sign out, who am I.
//!
//! SYSTEM CONTEXT
//! ==============
//! The controller is the only writer of a new session. Login persists the
//! token to both store channels and re-arms teardown; logout always drops
//! the local session, even when the remote call fails, so an operator who
//! cannot reach the API can still sign out of this browser.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::sync::Arc;

use serde_json::{Value, json};

use crate::error::{ApiError, StoreError};
use crate::navigate::Navigator;
use crate::pipeline::ApiClient;
use crate::routes::RouteTable;
use crate::store::Credentials;
use crate::transport::ApiRequest;
use crate::types::{ADMIN_ROLE, AuthToken, ChangePasswordRequest, Envelope, LoginRequest, User};
use crate::validation::{FieldErrors, password_error, validate_login};

/// Remote auth endpoints, relative to the API base URL.
pub mod endpoints {
    pub const LOGIN: &str = "/api/auth/login";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const ME: &str = "/api/auth/me";
    pub const CHANGE_PASSWORD: &str = "/api/auth/change-password";
}

const DEFAULT_LOGIN_FAILURE: &str = "Invalid email or password";
const DEFAULT_PROFILE_FAILURE: &str = "Could not load the current user";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid form: {0}")]
    Invalid(FieldErrors),
    /// The server refused the operation and said why.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not persist session: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Text to show the operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(fields) => fields.to_string(),
            Self::Rejected(message) => message.clone(),
            Self::Api(e) => e.user_message(),
            Self::Store(e) => e.to_string(),
        }
    }
}

pub struct SessionController {
    client: ApiClient,
    navigator: Arc<dyn Navigator>,
    routes: Arc<RouteTable>,
}

impl SessionController {
    #[must_use]
    pub fn new(client: ApiClient, navigator: Arc<dyn Navigator>, routes: Arc<RouteTable>) -> Self {
        Self { client, navigator, routes }
    }

    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.client.store().read().is_some()
    }

    /// Sign in and land on the dashboard.
    ///
    /// # Errors
    ///
    /// See [`SessionController::login_with_return`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, SessionError> {
        self.login_with_return(email, password, None).await
    }

    /// Sign in and land on `from` when it is a safe protected path, otherwise
    /// on the dashboard. Returns the user snapshot from the login response.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Invalid`] when the form fails validation (no I/O).
    /// - [`SessionError::Rejected`] with the server's message when the
    ///   credentials are refused. The store is not touched.
    /// - [`SessionError::Api`] when the service is unreachable or failing.
    /// - [`SessionError::Store`] when the session cannot be persisted.
    pub async fn login_with_return(
        &self,
        email: &str,
        password: &str,
        from: Option<&str>,
    ) -> Result<Option<User>, SessionError> {
        validate_login(email, password).map_err(SessionError::Invalid)?;

        let login = LoginRequest { email: email.trim(), password, required_role: ADMIN_ROLE };
        let body = serde_json::to_value(&login).map_err(|e| ApiError::Encode(e.to_string()))?;
        let request = ApiRequest::post(endpoints::LOGIN, body);
        let envelope: Envelope<AuthToken> = match self.client.call_anonymous(request).await {
            Ok(envelope) => envelope,
            Err(e) => return Err(login_failure(e)),
        };

        let message = envelope.server_message().map(str::to_owned);
        let Some(auth) = envelope.into_success().filter(|auth| !auth.token.trim().is_empty()) else {
            tracing::info!("login refused by server");
            return Err(SessionError::Rejected(message.unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_owned())));
        };

        let user = auth.user.clone();
        self.client.store().write(&Credentials::from(auth))?;
        self.client.teardown().rearm();

        let landing = self.routes.recover_return_path(from);
        tracing::info!(landing = %landing, "login succeeded");
        self.navigator.navigate(&landing);
        Ok(user)
    }

    /// Sign out. The local session is always gone and the operator is on
    /// the login page when this returns.
    ///
    /// # Errors
    ///
    /// Returns the remote failure, for messaging only.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let teardown = self.client.teardown();
        teardown.disarm();
        let remote = self.client.post::<Value>(endpoints::LOGOUT, json!({})).await;
        teardown.end_session();

        match remote {
            Ok(envelope) if !envelope.success => {
                tracing::warn!(message = ?envelope.server_message(), "remote logout refused; local session cleared");
                Ok(())
            }
            Ok(_) => {
                tracing::info!("logged out");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote logout failed; local session cleared");
                Err(e)
            }
        }
    }

    /// Fetch the signed-in user from `/api/auth/me` and cache the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Api`] for transport or HTTP failures and
    /// [`SessionError::Rejected`] when the envelope carries no user.
    pub async fn current_user(&self) -> Result<User, SessionError> {
        let envelope: Envelope<User> = self.client.get(endpoints::ME).await?;
        let message = envelope.server_message().map(str::to_owned);
        let Some(user) = envelope.into_success() else {
            return Err(SessionError::Rejected(message.unwrap_or_else(|| DEFAULT_PROFILE_FAILURE.to_owned())));
        };
        if let Err(e) = self.client.store().cache_user(&user) {
            tracing::warn!(error = %e, "could not cache user snapshot");
        }
        Ok(user)
    }

    /// Snapshot stored by login or the last [`SessionController::current_user`].
    #[must_use]
    pub fn cached_user(&self) -> Option<User> {
        self.client.store().cached_user()
    }

    /// Change the signed-in user's password. A wrong current password is a
    /// request rejection and leaves the session alone.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for a too-short new password,
    /// [`SessionError::Rejected`] when the server refuses in a 2xx envelope,
    /// and [`SessionError::Api`] for HTTP failures.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), SessionError> {
        if let Some(message) = password_error(new) {
            return Err(SessionError::Invalid(FieldErrors { email: None, password: Some(message) }));
        }

        let request = ChangePasswordRequest { current_password: current, new_password: new };
        let body = serde_json::to_value(&request).map_err(|e| ApiError::Encode(e.to_string()))?;
        let envelope: Envelope<Value> = self.client.put(endpoints::CHANGE_PASSWORD, body).await?;
        if !envelope.success {
            let message = envelope.server_message().unwrap_or("Password change failed").to_owned();
            return Err(SessionError::Rejected(message));
        }
        tracing::info!("password changed");
        Ok(())
    }
}

fn login_failure(error: ApiError) -> SessionError {
    match error {
        ApiError::Unauthorized { message } | ApiError::Rejected { message, .. } => {
            SessionError::Rejected(message.unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_owned()))
        }
        other => SessionError::Api(other),
    }
}
