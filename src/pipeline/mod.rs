//! Request pipeline: augment → send → intercept.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page-level API call goes through [`ApiClient`]. The outbound step
//! always runs before the network call and the inbound step always runs
//! after the response and before the caller observes it; that ordering is
//! structural (one `async fn`), not left to callback registration.

pub mod inbound;
pub mod outbound;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::navigate::Navigator;
use crate::routes::RouteTable;
use crate::store::CredentialStore;
use crate::transport::{AUTHORIZATION, ApiRequest, ApiResponse, Transport};
use crate::types::Envelope;

pub use inbound::Teardown;

/// Authenticated API client. Cheap to clone; clones share the store and
/// teardown state.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    teardown: Arc<Teardown>,
}

impl ApiClient {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
        routes: &RouteTable,
    ) -> Self {
        let teardown = Arc::new(Teardown::new(store.clone(), navigator, routes));
        Self { transport, store, teardown }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    #[must_use]
    pub fn teardown(&self) -> &Arc<Teardown> {
        &self.teardown
    }

    /// Run one request through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ApiError`] for non-2xx responses and
    /// transport failures. A 401 has already torn the session down by the
    /// time the caller sees it.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = outbound::augment(request, self.store.as_ref());
        self.dispatch(request).await
    }

    /// Run a request without attaching the stored token. Used for calls that
    /// must not be judged against the current session, such as login.
    ///
    /// # Errors
    ///
    /// Classified like [`ApiClient::send`], but a 401 leaves the session
    /// alone because the request carried no bearer.
    pub async fn send_anonymous(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let request = request.without_header(AUTHORIZATION);
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_with = request.bearer().map(str::to_owned);
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            authenticated = sent_with.is_some(),
            "api request"
        );

        let result = self.transport.send(request).await;
        let outcome = inbound::intercept(sent_with.as_deref(), result, &self.teardown);
        if let Err(e) = &outcome {
            tracing::debug!(error = %e, "api request failed");
        }
        outcome
    }

    /// Send and decode the standard envelope.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::send`], plus [`ApiError::Decode`] for a body that is
    /// not an envelope of `T`.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Envelope<T>, ApiError> {
        decode(self.send(request).await?)
    }

    /// [`ApiClient::call`] without the stored token.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn call_anonymous<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<Envelope<T>, ApiError> {
        decode(self.send_anonymous(request).await?)
    }

    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        self.call(ApiRequest::get(path)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<Envelope<T>, ApiError> {
        self.call(ApiRequest::post(path, body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<Envelope<T>, ApiError> {
        self.call(ApiRequest::put(path, body)).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        self.call(ApiRequest::delete(path)).await
    }
}

fn decode<T: DeserializeOwned>(response: ApiResponse) -> Result<Envelope<T>, ApiError> {
    serde_json::from_value(response.body).map_err(|e| ApiError::Decode(e.to_string()))
}
