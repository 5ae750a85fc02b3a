//! Edge server configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::path::PathBuf;

use menu_admin::ConfigError;
use menu_admin::RouteTable;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SITE_DIR: &str = "./site";

/// Served directly, never guarded.
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Debug, Clone)]
pub struct EdgeConfig {
    pub port: u16,
    /// Built panel assets; `index.html` doubles as the SPA fallback.
    pub site_dir: PathBuf,
    pub routes: RouteTable,
}

impl EdgeConfig {
    /// Build typed edge config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SITE_DIR`: default `./site`
    /// - `LOGIN_PATH`, `ROOT_PATH`, `DASHBOARD_PATH`, `PUBLIC_ROUTES`: see
    ///   [`RouteTable::from_env`]
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a port number or the route table is
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => parse_port(&raw)?,
            Err(_) => DEFAULT_PORT,
        };
        let site_dir = std::env::var("SITE_DIR").map_or_else(|_| PathBuf::from(DEFAULT_SITE_DIR), PathBuf::from);
        Ok(Self { port, site_dir, routes: edge_routes(RouteTable::from_env()?) })
    }
}

/// Route table with the health probe carved out of guarding.
pub fn edge_routes(routes: RouteTable) -> RouteTable {
    let scope = routes.scope().clone().exclude_prefix(HEALTH_PATH);
    routes.with_scope(scope)
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::Invalid { key: "PORT", reason: e.to_string() })
}
