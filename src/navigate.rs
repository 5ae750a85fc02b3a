//! Navigation seam for redirects triggered by the session core.

/// Moves the operator to another page. Implementations must be cheap and
/// must not fail; a navigation that cannot happen is logged and dropped.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Full-page navigation through `window.location`, so every in-flight page
/// request is abandoned along with the page.
#[cfg(feature = "hydrate")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationNavigator;

#[cfg(feature = "hydrate")]
impl Navigator for LocationNavigator {
    fn navigate(&self, path: &str) {
        let Some(window) = web_sys::window() else {
            tracing::warn!(path, "no window; navigation dropped");
            return;
        };
        if let Err(e) = window.location().set_href(path) {
            tracing::warn!(path, error = ?e, "navigation failed");
        }
    }
}
