//! Inbound failure interceptor and the teardown it triggers.
//!
//! DESIGN
//! ======
//! Only a 401 ends the session. Every other failure is classified and handed
//! back to the caller untouched.
//!
//! Several in-flight requests can hit 401 together when a token expires.
//! `Teardown` keeps an `armed` flag: the first 401 disarms it and navigates,
//! later ones only re-clear (a no-op on an empty store). Login re-arms it.
//! A 401 for a token that is no longer the stored one belongs to a request
//! issued before a re-login and is ignored, as is a 401 on a request that
//! carried no token at all.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ApiError;
use crate::navigate::Navigator;
use crate::routes::RouteTable;
use crate::store::CredentialStore;
use crate::transport::{ApiResponse, TransportError};

/// Ends the local session when the API rejects the stored token.
///
/// Shared by every in-flight request. Only the first rejection while armed
/// navigates to login; later ones just clear an already empty store.
pub struct Teardown {
    store: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    armed: AtomicBool,
}

impl Teardown {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>, routes: &RouteTable) -> Self {
        Self { store, navigator, login_path: routes.login().to_owned(), armed: AtomicBool::new(true) }
    }

    /// Handle a 401 for a request sent with `sent_with`. Returns `true` only
    /// for the call that performed the navigation.
    pub fn on_unauthorized(&self, sent_with: Option<&str>) -> bool {
        let Some(sent_with) = sent_with else {
            tracing::debug!("401 on a request without credentials; nothing to tear down");
            return false;
        };
        if self.store.read().is_some_and(|current| current != sent_with) {
            tracing::debug!("401 for a superseded token; current session kept");
            return false;
        }

        let first = self.armed.swap(false, Ordering::AcqRel);
        self.store.clear();
        if first {
            tracing::warn!(login = %self.login_path, "credential rejected; session cleared");
            self.navigator.navigate(&self.login_path);
        }
        first
    }

    /// Explicit logout: clear and navigate unconditionally, then stay
    /// disarmed so late 401s from the old session stay quiet.
    pub fn end_session(&self) {
        self.disarm();
        self.store.clear();
        self.navigator.navigate(&self.login_path);
    }

    /// Suppress navigation from 401s until the next [`Teardown::rearm`].
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    /// Called after a new session is written.
    pub fn rearm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

/// Classify a transport result. Runs after the response and before the
/// caller sees it.
///
/// # Errors
///
/// Returns the classified [`ApiError`] for any non-2xx status or transport
/// failure.
pub fn intercept(
    sent_with: Option<&str>,
    result: Result<ApiResponse, TransportError>,
    teardown: &Teardown,
) -> Result<ApiResponse, ApiError> {
    let response = result.map_err(|e| ApiError::Network(e.to_string()))?;
    if response.is_success() {
        return Ok(response);
    }

    let message = response.message();
    match response.status {
        401 => {
            teardown.on_unauthorized(sent_with);
            Err(ApiError::Unauthorized { message })
        }
        status @ 500..=599 => Err(ApiError::Server { status, message }),
        status => Err(ApiError::Rejected { status, message }),
    }
}
