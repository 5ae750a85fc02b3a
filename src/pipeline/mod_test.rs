use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::error::ErrorKind;
use crate::store::Credentials;
use crate::test_helpers::{Harness, ScriptedTransport};
use crate::transport::{AUTHORIZATION, TransportError};

fn ok_envelope() -> ApiResponse {
    ApiResponse::new(200, json!({ "success": true, "data": { "n": 1 } }))
}

#[tokio::test]
async fn token_is_attached_as_bearer() {
    let h = Harness::signed_in(ScriptedTransport::new(vec![Ok(ok_envelope())]), "tok-1");
    h.client.send(ApiRequest::get("/api/menu")).await.unwrap();

    let sent = h.transport.sent();
    assert_eq!(sent[0].header(AUTHORIZATION), Some("Bearer tok-1"));
}

#[tokio::test]
async fn no_token_sends_unauthenticated() {
    let h = Harness::new(ScriptedTransport::new(vec![Ok(ok_envelope())]));
    h.client.send(ApiRequest::get("/api/menu")).await.unwrap();
    assert_eq!(h.transport.sent()[0].header(AUTHORIZATION), None);
}

#[test]
fn augment_overrides_caller_authorization() {
    let h = Harness::signed_in(ScriptedTransport::new(vec![]), "tok-1");
    let request = outbound::augment(
        ApiRequest::get("/x").with_header(AUTHORIZATION, "Bearer forged"),
        h.store.as_ref(),
    );
    assert_eq!(request.bearer(), Some("tok-1"));
}

#[tokio::test]
async fn unauthorized_clears_store_and_navigates_once() {
    let h = Harness::signed_in(ScriptedTransport::always(401, json!({ "message": "Token expired" })), "tok-1");

    let err = h.client.send(ApiRequest::get("/api/orders")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    assert_eq!(err.server_message(), Some("Token expired"));
    assert_eq!(h.store.read(), None);
    assert_eq!(h.store.cookie_token(), None);
    assert_eq!(h.cookies.header_value(), "");
    assert!(h.script.is_empty());
    assert_eq!(h.navigator.visits(), vec!["/login".to_owned()]);
    assert!(!h.client.teardown().is_armed());
}

#[tokio::test]
async fn bad_request_leaves_session_alone() {
    let h = Harness::signed_in(ScriptedTransport::always(400, json!({ "message": "Price must be positive" })), "tok-1");

    let err = h.client.send(ApiRequest::post("/api/menu", json!({ "price": -1 }))).await.unwrap_err();
    assert_eq!(err, ApiError::Rejected { status: 400, message: Some("Price must be positive".into()) });
    assert_eq!(h.store.read().as_deref(), Some("tok-1"));
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test]
async fn forbidden_and_server_errors_leave_session_alone() {
    let h = Harness::signed_in(
        ScriptedTransport::new(vec![
            Ok(ApiResponse::new(403, json!({}))),
            Ok(ApiResponse::new(503, json!("Service Unavailable"))),
            Err(TransportError::Timeout),
        ]),
        "tok-1",
    );

    let forbidden = h.client.send(ApiRequest::get("/a")).await.unwrap_err();
    assert_eq!(forbidden.kind(), ErrorKind::RequestRejected);
    let unavailable = h.client.send(ApiRequest::get("/b")).await.unwrap_err();
    assert_eq!(unavailable, ApiError::Server { status: 503, message: None });
    let network = h.client.send(ApiRequest::get("/c")).await.unwrap_err();
    assert!(matches!(network, ApiError::Network(_)));
    assert!(network.retryable());

    assert_eq!(h.store.read().as_deref(), Some("tok-1"));
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unauthorized_navigates_once() {
    let h = Arc::new(Harness::signed_in(ScriptedTransport::always(401, json!({})), "tok-1"));

    let mut tasks = Vec::new();
    for i in 0..16 {
        let client = h.client.clone();
        tasks.push(tokio::spawn(async move { client.send(ApiRequest::get(format!("/api/orders/{i}"))).await }));
    }
    for task in tasks {
        let result = task.await.unwrap();
        assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
    }

    assert_eq!(h.store.read(), None);
    assert_eq!(h.navigator.visits(), vec!["/login".to_owned()]);
}

#[test]
fn stale_unauthorized_keeps_new_session() {
    let h = Harness::signed_in(ScriptedTransport::new(vec![]), "new-token");
    let stale = Ok(ApiResponse::new(401, json!({})));

    let err = inbound::intercept(Some("old-token"), stale, h.client.teardown()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    assert_eq!(h.store.read().as_deref(), Some("new-token"));
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test]
async fn unauthenticated_unauthorized_does_not_navigate() {
    let h = Harness::new(ScriptedTransport::always(401, json!({ "message": "Invalid credentials" })));

    let err = h.client.send(ApiRequest::post("/api/auth/login", json!({}))).await.unwrap_err();
    assert_eq!(err.server_message(), Some("Invalid credentials"));
    assert!(h.navigator.visits().is_empty());
    assert!(h.client.teardown().is_armed());
}

#[tokio::test]
async fn rearm_allows_next_session_teardown() {
    let h = Harness::signed_in(ScriptedTransport::always(401, json!({})), "tok-1");
    h.client.send(ApiRequest::get("/a")).await.unwrap_err();

    h.store.write(&Credentials::new("tok-2")).unwrap();
    h.client.teardown().rearm();
    h.client.send(ApiRequest::get("/b")).await.unwrap_err();

    assert_eq!(h.navigator.visits(), vec!["/login".to_owned(), "/login".to_owned()]);
}

#[tokio::test]
async fn call_decodes_envelope() {
    let h = Harness::signed_in(ScriptedTransport::new(vec![Ok(ok_envelope())]), "tok-1");
    let envelope: Envelope<serde_json::Value> = h.client.get("/api/stats").await.unwrap();
    assert_eq!(envelope.into_success(), Some(json!({ "n": 1 })));
}

#[tokio::test]
async fn call_reports_non_envelope_body() {
    let h = Harness::signed_in(ScriptedTransport::new(vec![Ok(ApiResponse::new(200, json!("<html>")))]), "tok-1");
    let err = h.client.get::<serde_json::Value>("/api/stats").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn anonymous_send_carries_no_bearer_and_ignores_401() {
    let h = Harness::signed_in(ScriptedTransport::always(401, json!({ "success": false })), "live");
    let request = ApiRequest::post("/api/auth/login", json!({})).with_header("authorization", "Bearer forged");

    let err = h.client.send_anonymous(request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    assert_eq!(h.transport.sent()[0].header(AUTHORIZATION), None);
    assert_eq!(h.store.read().as_deref(), Some("live"));
    assert!(h.navigator.visits().is_empty());
}
