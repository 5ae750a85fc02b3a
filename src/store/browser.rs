//! Browser channels: `document.cookie` and `window.localStorage`.
//!
//! Requires a browser environment. Outside one (SSR, workers without a
//! document) `credential_store` falls back to whatever channels exist, so the
//! caller tolerates a cookie-only or empty store instead of panicking.

use std::sync::Arc;

use wasm_bindgen::{JsCast, JsValue};

use super::{CookieChannel, CookieSpec, DualChannelStore, ScriptStorage, cookie_value};
use crate::error::StoreError;

fn js_error(err: JsValue) -> StoreError {
    StoreError::Unavailable(format!("{err:?}"))
}

fn html_document() -> Result<web_sys::HtmlDocument, StoreError> {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
        .ok_or_else(|| StoreError::Unavailable("no html document".to_owned()))
}

fn local_storage() -> Result<web_sys::Storage, StoreError> {
    web_sys::window()
        .ok_or_else(|| StoreError::Unavailable("no window".to_owned()))?
        .local_storage()
        .map_err(js_error)?
        .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_owned()))
}

/// Cookie channel over `document.cookie`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentCookies;

impl CookieChannel for DocumentCookies {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let raw = html_document()?.cookie().map_err(js_error)?;
        Ok(cookie_value(&raw, name))
    }

    fn set(&self, cookie: &CookieSpec) -> Result<(), StoreError> {
        html_document()?.set_cookie(&cookie.to_string()).map_err(js_error)
    }
}

/// Script store over `window.localStorage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl ScriptStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        local_storage()?.get_item(key).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        local_storage()?.set_item(key, value).map_err(js_error)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        local_storage()?.remove_item(key).map_err(js_error)
    }
}

/// Store wired to the current page. Skips `localStorage` when it is disabled.
#[must_use]
pub fn credential_store() -> DualChannelStore {
    let cookies: Arc<dyn CookieChannel> = Arc::new(DocumentCookies);
    if local_storage().is_err() {
        tracing::warn!("localStorage unavailable; using cookie channel only");
        return DualChannelStore::cookie_only(cookies);
    }
    DualChannelStore::new(cookies, Arc::new(LocalStorage))
}
