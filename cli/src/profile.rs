//! File-backed credential channels for the CLI.
//!
//! A profile directory stands in for the browser: `cookies.json` is the
//! cookie channel and `storage.json` the script store. Each call re-reads
//! and rewrites the whole file; the files are tiny and the CLI is a single
//! process.

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use menu_admin::StoreError;
use menu_admin::store::{CookieChannel, CookieSpec, DualChannelStore, ScriptStorage};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const COOKIES_FILE: &str = "cookies.json";
pub const STORAGE_FILE: &str = "storage.json";

fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    match fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(T::default()),
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

// =============================================================================
// COOKIES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FileCookie {
    value: String,
    /// Unix seconds.
    expires_at: i64,
}

/// Cookie channel persisted as JSON. Expired entries read as absent.
#[derive(Debug)]
pub struct FileCookieJar {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCookieJar {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }

    /// Live cookies rendered as a `Cookie:` header value.
    ///
    /// # Errors
    ///
    /// Returns an error if the jar file cannot be read.
    pub fn header_value(&self) -> Result<String, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let cookies: BTreeMap<String, FileCookie> = load(&self.path)?;
        Ok(cookies
            .iter()
            .filter(|(_, c)| c.expires_at > now)
            .map(|(name, c)| format!("{name}={}", c.value))
            .collect::<Vec<_>>()
            .join("; "))
    }
}

impl CookieChannel for FileCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let cookies: BTreeMap<String, FileCookie> = load(&self.path)?;
        Ok(cookies
            .get(name)
            .filter(|c| c.expires_at > now)
            .map(|c| c.value.clone()))
    }

    fn set(&self, cookie: &CookieSpec) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut cookies: BTreeMap<String, FileCookie> = load(&self.path)?;
        if cookie.is_removal() {
            cookies.remove(&cookie.name);
        } else {
            let expires_at = (OffsetDateTime::now_utc() + cookie.max_age).unix_timestamp();
            cookies.insert(cookie.name.clone(), FileCookie { value: cookie.value.clone(), expires_at });
        }
        save(&self.path, &cookies)
    }
}

// =============================================================================
// SCRIPT STORE
// =============================================================================

/// Script store persisted as a flat JSON object.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }
}

impl ScriptStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let items: BTreeMap<String, String> = load(&self.path)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items: BTreeMap<String, String> = load(&self.path)?;
        items.insert(key.to_owned(), value.to_owned());
        save(&self.path, &items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items: BTreeMap<String, String> = load(&self.path)?;
        if items.remove(key).is_some() {
            save(&self.path, &items)?;
        }
        Ok(())
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// Channels for one profile directory.
pub struct Profile {
    pub cookies: Arc<FileCookieJar>,
    pub store: Arc<DualChannelStore>,
}

impl Profile {
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        let cookies = Arc::new(FileCookieJar::new(dir.join(COOKIES_FILE)));
        let storage = Arc::new(FileStorage::new(dir.join(STORAGE_FILE)));
        let store = Arc::new(DualChannelStore::new(cookies.clone(), storage));
        Self { cookies, store }
    }
}
