//! Edge route guard: the per-navigation allow or redirect decision.
//!
//! DESIGN
//! ======
//! `evaluate` is a pure function of (route table, path, cookie token
//! presence). It never touches storage and keeps no memory between calls;
//! hosts (the axum middleware, the CLI's `guard` command) perform the actual
//! redirect from the returned [`Verdict`].
//!
//! Rules, first match wins:
//! 1. no token, path not public        -> login, remembering the path
//! 2. token, path is login             -> dashboard
//! 3. token, path is root              -> dashboard
//! 4. no token, path is root           -> login
//! 5. anything else                    -> allow

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;

use crate::routes::RouteTable;

/// Which rule produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ProtectedWithoutSession,
    SignedInAtLogin,
    SignedInAtRoot,
    SignedOutAtRoot,
    Proceed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    /// `from` holds the requested path when it should be recoverable.
    RedirectToLogin { from: Option<String> },
    RedirectToDashboard,
}

impl GuardOutcome {
    /// Redirect target, or `None` for [`GuardOutcome::Allow`].
    #[must_use]
    pub fn location(&self, routes: &RouteTable) -> Option<String> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin { from: Some(from) } => Some(routes.login_with_return(from)),
            Self::RedirectToLogin { from: None } => Some(routes.login().to_owned()),
            Self::RedirectToDashboard => Some(routes.dashboard().to_owned()),
        }
    }

    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub rule: Rule,
    pub outcome: GuardOutcome,
}

/// A cookie value counts as a token only when non-empty.
#[must_use]
pub fn token_present(cookie: Option<&str>) -> bool {
    cookie.is_some_and(|value| !value.trim().is_empty())
}

/// Decide what to do with a navigation to `path`.
#[must_use]
pub fn evaluate(routes: &RouteTable, path: &str, has_token: bool) -> Verdict {
    let is_root = path == routes.root();

    if !has_token && !routes.is_public(path) {
        return Verdict {
            rule: Rule::ProtectedWithoutSession,
            outcome: GuardOutcome::RedirectToLogin { from: Some(path.to_owned()) },
        };
    }
    if has_token && path == routes.login() {
        return Verdict { rule: Rule::SignedInAtLogin, outcome: GuardOutcome::RedirectToDashboard };
    }
    if has_token && is_root {
        return Verdict { rule: Rule::SignedInAtRoot, outcome: GuardOutcome::RedirectToDashboard };
    }
    if !has_token && is_root {
        return Verdict { rule: Rule::SignedOutAtRoot, outcome: GuardOutcome::RedirectToLogin { from: None } };
    }
    Verdict { rule: Rule::Proceed, outcome: GuardOutcome::Allow }
}
