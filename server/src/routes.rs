//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The edge serves the built panel as static files behind the route guard.
//! Unknown page paths fall back to `index.html` so client-side routes load;
//! asset and API paths are outside the guard scope and pass straight
//! through.

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::{EdgeConfig, HEALTH_PATH};
use crate::guard;

pub fn app(config: &EdgeConfig) -> Router {
    let routes = Arc::new(config.routes.clone());
    let site = ServeDir::new(&config.site_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(config.site_dir.join("index.html")));

    Router::new()
        .route(HEALTH_PATH, get(healthz))
        .fallback_service(site)
        .layer(middleware::from_fn_with_state(routes, guard::route_guard))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
