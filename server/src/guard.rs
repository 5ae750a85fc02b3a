//! Route guard middleware.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs in front of every page request, before any panel code is served.
//! The only credential it can see is the `authToken` cookie; the decision
//! itself is [`menu_admin::guard::evaluate`], this layer just extracts its
//! inputs and turns a redirect verdict into a `307`.

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use menu_admin::RouteTable;
use menu_admin::guard::{evaluate, token_present};
use menu_admin::store::TOKEN_COOKIE;

/// Request path as the route table spells it: no trailing slash except root.
#[must_use]
pub fn route_path(raw: &str) -> &str {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Axum middleware applying the guard to in-scope requests.
pub async fn route_guard(State(routes): State<Arc<RouteTable>>, jar: CookieJar, request: Request, next: Next) -> Response {
    if !routes.scope().applies_to(request.uri().path()) {
        return next.run(request).await;
    }

    let path = route_path(request.uri().path()).to_owned();
    let has_token = token_present(jar.get(TOKEN_COOKIE).map(Cookie::value));
    let verdict = evaluate(&routes, &path, has_token);
    let Some(location) = verdict.outcome.location(&routes) else {
        return next.run(request).await;
    };

    tracing::debug!(%path, has_token, rule = ?verdict.rule, %location, "guard redirect");
    Redirect::temporary(&location).into_response()
}
