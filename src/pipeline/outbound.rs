//! Outbound request augmenter.

use crate::store::CredentialStore;
use crate::transport::{AUTHORIZATION, ApiRequest};

/// Attach the current token as a bearer credential. Without a token the
/// request goes out unauthenticated and the remote API decides.
#[must_use]
pub fn augment(request: ApiRequest, store: &dyn CredentialStore) -> ApiRequest {
    match store.read() {
        Some(token) => request.with_header(AUTHORIZATION, format!("Bearer {token}")),
        None => request,
    }
}
