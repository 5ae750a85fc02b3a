//! Route classification consulted by the edge guard.
//!
//! DESIGN
//! ======
//! A `RouteTable` names the three paths the guard redirects between (login
//! entry, root landing, dashboard) plus the public set. Construction rejects
//! tables that could loop: login must be public, the dashboard must be
//! protected and distinct from both login and root.
//!
//! `GuardScope` carves static assets and API routes out of guarding entirely.

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;

use std::fmt::Write;

use crate::error::ConfigError;

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_ROOT_PATH: &str = "/";
pub const DEFAULT_DASHBOARD_PATH: &str = "/dashboard";

/// Query parameter carrying the originally requested path.
pub const RETURN_PARAM: &str = "from";

const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &["/api", "/pkg", "/static", "/public", "/favicon.ico"];
const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "svg", "ico", "css", "js", "wasm"];

// =============================================================================
// GUARD SCOPE
// =============================================================================

/// Which request paths the guard evaluates at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardScope {
    excluded_prefixes: Vec<String>,
    excluded_extensions: Vec<String>,
}

impl Default for GuardScope {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES.iter().map(|p| (*p).to_owned()).collect(),
            excluded_extensions: DEFAULT_EXCLUDED_EXTENSIONS.iter().map(|e| (*e).to_owned()).collect(),
        }
    }
}

impl GuardScope {
    /// Exclude another path prefix. Matches whole segments only.
    #[must_use]
    pub fn exclude_prefix(mut self, prefix: &str) -> Self {
        self.excluded_prefixes.push(prefix.trim_end_matches('/').to_owned());
        self
    }

    /// `false` for static assets and API routes.
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        let excluded_prefix = self.excluded_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        });
        !excluded_prefix && !self.has_excluded_extension(path)
    }

    fn has_excluded_extension(&self, path: &str) -> bool {
        let last_segment = path.rsplit('/').next().unwrap_or(path);
        last_segment
            .rsplit_once('.')
            .is_some_and(|(_, ext)| self.excluded_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

// =============================================================================
// ROUTE TABLE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    login: String,
    root: String,
    dashboard: String,
    public: Vec<String>,
    scope: GuardScope,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login: DEFAULT_LOGIN_PATH.to_owned(),
            root: DEFAULT_ROOT_PATH.to_owned(),
            dashboard: DEFAULT_DASHBOARD_PATH.to_owned(),
            public: vec![DEFAULT_LOGIN_PATH.to_owned(), DEFAULT_ROOT_PATH.to_owned()],
            scope: GuardScope::default(),
        }
    }
}

impl RouteTable {
    /// Build a table whose public set is exactly `{login, root}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a path is not absolute or the
    /// table could produce a redirect loop.
    pub fn new(login: &str, root: &str, dashboard: &str) -> Result<Self, ConfigError> {
        let login = normalize("LOGIN_PATH", login)?;
        let root = normalize("ROOT_PATH", root)?;
        let dashboard = normalize("DASHBOARD_PATH", dashboard)?;
        let table =
            Self { public: vec![login.clone(), root.clone()], login, root, dashboard, scope: GuardScope::default() };
        table.validate()?;
        Ok(table)
    }

    /// Add a path to the public set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the path is not absolute or is the
    /// dashboard path.
    pub fn with_public(mut self, path: &str) -> Result<Self, ConfigError> {
        let path = normalize("PUBLIC_ROUTES", path)?;
        if !self.public.contains(&path) {
            self.public.push(path);
        }
        self.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn with_scope(mut self, scope: GuardScope) -> Self {
        self.scope = scope;
        self
    }

    /// Build from `LOGIN_PATH`, `ROOT_PATH`, `DASHBOARD_PATH` and the comma
    /// separated `PUBLIC_ROUTES`, each optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the resulting table is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut table = Self::new(
            &env_or("LOGIN_PATH", DEFAULT_LOGIN_PATH),
            &env_or("ROOT_PATH", DEFAULT_ROOT_PATH),
            &env_or("DASHBOARD_PATH", DEFAULT_DASHBOARD_PATH),
        )?;
        if let Ok(extra) = std::env::var("PUBLIC_ROUTES") {
            for path in extra.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                table = table.with_public(path)?;
            }
        }
        Ok(table)
    }

    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn dashboard(&self) -> &str {
        &self.dashboard
    }

    #[must_use]
    pub fn public_routes(&self) -> &[String] {
        &self.public
    }

    #[must_use]
    pub fn scope(&self) -> &GuardScope {
        &self.scope
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|p| p == path)
    }

    /// Login URL that remembers `from` as a recoverable query parameter.
    #[must_use]
    pub fn login_with_return(&self, from: &str) -> String {
        format!("{}?{RETURN_PARAM}={}", self.login, encode_path_param(from))
    }

    /// Where to land after login given the guard's `from` value. Anything not
    /// a same-origin protected path falls back to the dashboard.
    #[must_use]
    pub fn recover_return_path(&self, from: Option<&str>) -> String {
        let Some(decoded) = from.map(decode_path_param) else {
            return self.dashboard.clone();
        };
        let path_only = decoded.split(['?', '#']).next().unwrap_or_default();
        let same_origin = decoded.starts_with('/') && !decoded.starts_with("//") && !decoded.contains('\\');
        if same_origin && !self.is_public(path_only) {
            decoded
        } else {
            self.dashboard.clone()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.login == self.root {
            return Err(ConfigError::Invalid { key: "LOGIN_PATH", reason: "must differ from ROOT_PATH".into() });
        }
        if self.dashboard == self.login || self.dashboard == self.root {
            return Err(ConfigError::Invalid {
                key: "DASHBOARD_PATH",
                reason: "must differ from LOGIN_PATH and ROOT_PATH".into(),
            });
        }
        if self.is_public(&self.dashboard) {
            return Err(ConfigError::Invalid { key: "PUBLIC_ROUTES", reason: "dashboard must stay protected".into() });
        }
        if !self.is_public(&self.login) {
            return Err(ConfigError::Invalid { key: "PUBLIC_ROUTES", reason: "login must stay public".into() });
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .map(|v| v.trim().to_owned())
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn normalize(key: &'static str, path: &str) -> Result<String, ConfigError> {
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid { key, reason: format!("{path:?} is not an absolute path") });
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok("/".to_owned());
    }
    Ok(trimmed.to_owned())
}

// =============================================================================
// QUERY ENCODING
// =============================================================================

/// Percent-encode a path for use as a query value. `/` is kept readable.
#[must_use]
pub fn encode_path_param(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// Inverse of [`encode_path_param`]. Malformed escapes are kept literally.
#[must_use]
pub fn decode_path_param(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(byte) = hex_pair(bytes[i + 1], bytes[i + 2]) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(if bytes[i] == b'+' { b' ' } else { bytes[i] });
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = char::from(hi).to_digit(16)?;
    let lo = char::from(lo).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}
