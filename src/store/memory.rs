//! In-process channel implementations.
//!
//! Used for edge-only execution where there is no script context, and as the
//! backing for fakes in tests. Cookie expiry follows `max-age` semantics
//! against wall-clock time.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use time::OffsetDateTime;

use super::{CookieChannel, CookieSpec, ScriptStorage};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at: OffsetDateTime,
}

/// Cookie jar held in memory.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render live cookies as a `Cookie:` request header value, sorted by name.
    #[must_use]
    pub fn header_value(&self) -> String {
        let now = OffsetDateTime::now_utc();
        let cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        let mut pairs: Vec<String> = cookies
            .iter()
            .filter(|(_, c)| c.expires_at > now)
            .map(|(name, c)| format!("{name}={}", c.value))
            .collect();
        pairs.sort();
        pairs.join("; ")
    }
}

impl CookieChannel for MemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let now = OffsetDateTime::now_utc();
        let cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(cookies
            .get(name)
            .filter(|c| c.expires_at > now)
            .map(|c| c.value.clone()))
    }

    fn set(&self, cookie: &CookieSpec) -> Result<(), StoreError> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        if cookie.is_removal() {
            cookies.remove(&cookie.name);
        } else {
            let expires_at = OffsetDateTime::now_utc() + cookie.max_age;
            cookies.insert(cookie.name.clone(), StoredCookie { value: cookie.value.clone(), expires_at });
        }
        Ok(())
    }
}

/// Script store held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScriptStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
