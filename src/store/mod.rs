//! Credential store: the session token kept in two channels.
//!
//! SYSTEM CONTEXT
//! ==============
//! The cookie channel is the only one the edge gatekeeper can see; the
//! script store is populated synchronously on login and is what the request
//! pipeline consults first. Both must agree: a token visible to one channel
//! and not the other makes the guard and the pipeline disagree about whether
//! the operator is signed in.
//!
//! DESIGN
//! ======
//! Channels are small traits (`CookieChannel`, `ScriptStorage`) so the same
//! fan-out logic runs over browser storage, in-memory maps, or files.
//! `DualChannelStore` is the single place that enforces write-both /
//! clear-both; everything else depends on the `CredentialStore` trait.

pub mod memory;

#[cfg(feature = "hydrate")]
pub mod browser;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::fmt;
use std::sync::Arc;

use time::Duration;

use crate::error::StoreError;
use crate::types::{AuthToken, User};

/// Cookie carrying the bearer token. Also the guard's only input.
pub const TOKEN_COOKIE: &str = "authToken";
pub const REFRESH_COOKIE: &str = "refreshToken";
/// Script-store key for the bearer token.
pub const TOKEN_KEY: &str = "authToken";
/// Script-store key for the serialized [`User`] snapshot.
pub const USER_KEY: &str = "user";

pub const TOKEN_MAX_AGE: Duration = Duration::days(7);
pub const REFRESH_MAX_AGE: Duration = Duration::days(30);

// =============================================================================
// COOKIES
// =============================================================================

/// A cookie to set (or expire) on the cookie channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age: Duration,
}

impl CookieSpec {
    #[must_use]
    pub fn new(name: &str, value: &str, max_age: Duration) -> Self {
        Self { name: name.to_owned(), value: value.to_owned(), path: "/".to_owned(), max_age }
    }

    /// Removal cookie: empty value with `max-age=0`. Expiring instead of
    /// deleting also works if the cookie is ever flagged http-only.
    #[must_use]
    pub fn expired(name: &str) -> Self {
        Self::new(name, "", Duration::ZERO)
    }

    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.max_age <= Duration::ZERO
    }
}

impl fmt::Display for CookieSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}; path={}; max-age={}",
            self.name,
            self.value,
            self.path,
            self.max_age.whole_seconds().max(0)
        )
    }
}

/// Find `name` in a `Cookie:` header style string (`a=1; b=2`).
/// Empty values count as absent.
#[must_use]
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// CHANNELS
// =============================================================================

/// Cookie jar visible to both the edge and script code.
pub trait CookieChannel: Send + Sync {
    /// Current value of a live (unexpired) cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying jar cannot be read.
    fn get(&self, name: &str) -> Result<Option<String>, StoreError>;

    /// Set or expire a cookie. A [`CookieSpec::is_removal`] spec removes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying jar cannot be written.
    fn set(&self, cookie: &CookieSpec) -> Result<(), StoreError>;
}

/// Key/value store readable only by script code (`localStorage` in a browser).
pub trait ScriptStorage: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// CREDENTIAL STORE
// =============================================================================

/// Token material written on login.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: Option<User>,
}

impl Credentials {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into(), refresh_token: None, user: None }
    }
}

impl From<AuthToken> for Credentials {
    fn from(auth: AuthToken) -> Self {
        Self { token: auth.token, refresh_token: auth.refresh_token, user: auth.user }
    }
}

/// Process-wide session storage, injected wherever the token is needed.
pub trait CredentialStore: Send + Sync {
    /// Current token, script store first then cookie channel. Read failures
    /// degrade to `None`.
    fn read(&self) -> Option<String>;

    /// Persist a new session to every available channel, or to none.
    ///
    /// # Errors
    ///
    /// Returns an error if any channel rejects the write; the store is left
    /// cleared in that case.
    fn write(&self, credentials: &Credentials) -> Result<(), StoreError>;

    /// Drop the session from every channel. Safe to call when already clear.
    fn clear(&self);

    /// Cached identity snapshot, if one was stored.
    fn cached_user(&self) -> Option<User>;

    /// Replace the cached identity snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or stored.
    fn cache_user(&self, user: &User) -> Result<(), StoreError>;
}

/// [`CredentialStore`] over a cookie channel and an optional script store.
///
/// Without a script store (edge execution) only cookies are written.
#[derive(Clone)]
pub struct DualChannelStore {
    cookies: Arc<dyn CookieChannel>,
    script: Option<Arc<dyn ScriptStorage>>,
}

impl DualChannelStore {
    #[must_use]
    pub fn new(cookies: Arc<dyn CookieChannel>, script: Arc<dyn ScriptStorage>) -> Self {
        Self { cookies, script: Some(script) }
    }

    #[must_use]
    pub fn cookie_only(cookies: Arc<dyn CookieChannel>) -> Self {
        Self { cookies, script: None }
    }

    /// Token as the edge guard sees it.
    #[must_use]
    pub fn cookie_token(&self) -> Option<String> {
        match self.cookies.get(TOKEN_COOKIE) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::debug!(error = %e, "cookie channel read failed");
                None
            }
        }
    }

    /// Token as script code sees it, without the cookie fallback.
    #[must_use]
    pub fn script_token(&self) -> Option<String> {
        let script = self.script.as_ref()?;
        match script.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::debug!(error = %e, "script store read failed");
                None
            }
        }
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        match self.cookies.get(REFRESH_COOKIE) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::debug!(error = %e, "refresh cookie read failed");
                None
            }
        }
    }

    fn write_channels(&self, credentials: &Credentials) -> Result<(), StoreError> {
        self.cookies.set(&CookieSpec::new(TOKEN_COOKIE, &credentials.token, TOKEN_MAX_AGE))?;
        match &credentials.refresh_token {
            Some(refresh) => self.cookies.set(&CookieSpec::new(REFRESH_COOKIE, refresh, REFRESH_MAX_AGE))?,
            None => self.cookies.set(&CookieSpec::expired(REFRESH_COOKIE))?,
        }

        let Some(script) = &self.script else {
            return Ok(());
        };
        script.set_item(TOKEN_KEY, &credentials.token)?;
        match &credentials.user {
            Some(user) => script.set_item(USER_KEY, &serde_json::to_string(user)?)?,
            None => script.remove_item(USER_KEY)?,
        }
        Ok(())
    }
}

impl CredentialStore for DualChannelStore {
    fn read(&self) -> Option<String> {
        self.script_token().or_else(|| self.cookie_token())
    }

    fn write(&self, credentials: &Credentials) -> Result<(), StoreError> {
        if let Err(e) = self.write_channels(credentials) {
            tracing::warn!(error = %e, "credential write failed; rolling back both channels");
            self.clear();
            return Err(e);
        }
        Ok(())
    }

    fn clear(&self) {
        for name in [TOKEN_COOKIE, REFRESH_COOKIE] {
            if let Err(e) = self.cookies.set(&CookieSpec::expired(name)) {
                tracing::warn!(cookie = name, error = %e, "failed to expire cookie");
            }
        }
        if let Some(script) = &self.script {
            for key in [TOKEN_KEY, USER_KEY] {
                if let Err(e) = script.remove_item(key) {
                    tracing::warn!(key, error = %e, "failed to remove script store item");
                }
            }
        }
    }

    fn cached_user(&self) -> Option<User> {
        let raw = match self.script.as_ref()?.get_item(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::debug!(error = %e, "user snapshot read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable user snapshot");
                None
            }
        }
    }

    fn cache_user(&self, user: &User) -> Result<(), StoreError> {
        let Some(script) = &self.script else {
            return Ok(());
        };
        script.set_item(USER_KEY, &serde_json::to_string(user)?)
    }
}
