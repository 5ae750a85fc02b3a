mod profile;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use menu_admin::config::{ClientConfig, ClientTimeouts};
use menu_admin::guard::{evaluate, token_present};
use menu_admin::store::{CookieChannel, TOKEN_COOKIE};
use menu_admin::transport::{ApiRequest, Method, ReqwestTransport, TransportError};
use menu_admin::{
    ApiClient, ApiError, ConfigError, CredentialStore, Navigator, RouteTable, SessionController, SessionError, StoreError,
};
use serde_json::{Value, json};

use crate::profile::Profile;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("http client error: {0}")]
    Transport(#[from] TransportError),
    #[error("{}", .0.user_message())]
    Session(#[from] SessionError),
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("profile error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "menu-admin", about = "Restaurant admin panel session CLI")]
struct Cli {
    #[arg(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:4000")]
    base_url: String,

    /// Directory holding the profile's cookie jar and script store.
    #[arg(long, env = "MENU_ADMIN_PROFILE", default_value = ".menu-admin")]
    profile_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in as an admin and store the session in the profile.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Page to return to, as carried in the login redirect.
        #[arg(long)]
        from: Option<String>,
    },
    Logout,
    Whoami,
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Show which channels hold a session. No network.
    Status,
    /// Evaluate the route guard for a path against the profile's cookie.
    Guard { path: String },
    /// Send an authenticated request through the session pipeline.
    Request {
        method: Method,
        path: String,
        #[arg(long)]
        data: Option<String>,
    },
}

/// Navigation target printed for the operator.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        println!("→ {path}");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    load_env_file(Path::new(".env"));

    let cli = Cli::parse();
    let profile = Profile::open(&cli.profile_dir);
    let routes = Arc::new(RouteTable::from_env()?);

    match cli.command {
        Command::Status => run_status(&profile),
        Command::Guard { path } => run_guard(&profile, &routes, &path),
        Command::Login { email, password, from } => {
            let session = connect(&cli.base_url, &profile, routes)?;
            run_login(&session, &email, &password, from.as_deref()).await
        }
        Command::Logout => run_logout(&connect(&cli.base_url, &profile, routes)?).await,
        Command::Whoami => run_whoami(&connect(&cli.base_url, &profile, routes)?).await,
        Command::ChangePassword { current, new } => {
            let session = connect(&cli.base_url, &profile, routes)?;
            session.change_password(&current, &new).await?;
            println!("password changed");
            Ok(())
        }
        Command::Request { method, path, data } => {
            let session = connect(&cli.base_url, &profile, routes)?;
            run_request(&session, method, path, data.as_deref()).await
        }
    }
}

/// Load `KEY=value` lines into the process environment. Variables already
/// set win, so `.env` only fills gaps.
fn load_env_file(path: &Path) {
    if let Err(e) = dotenvy::from_path(path) {
        tracing::debug!(path = %path.display(), error = %e, "no .env loaded");
    }
}

fn connect(base_url: &str, profile: &Profile, routes: Arc<RouteTable>) -> Result<SessionController, CliError> {
    let config = ClientConfig::new(base_url)?.with_timeouts(ClientTimeouts::from_env());
    let transport = Arc::new(ReqwestTransport::new(config)?);
    let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);
    let client = ApiClient::new(transport, profile.store.clone(), navigator.clone(), &routes);
    Ok(SessionController::new(client, navigator, routes))
}

async fn run_login(session: &SessionController, email: &str, password: &str, from: Option<&str>) -> Result<(), CliError> {
    match session.login_with_return(email, password, from).await? {
        Some(user) => println!("signed in as {} <{}> ({})", user.username, user.email, user.role),
        None => println!("signed in"),
    }
    Ok(())
}

async fn run_logout(session: &SessionController) -> Result<(), CliError> {
    if let Err(e) = session.logout().await {
        eprintln!("remote logout failed ({}); local session cleared", e.user_message());
    }
    Ok(())
}

async fn run_whoami(session: &SessionController) -> Result<(), CliError> {
    let user = session.current_user().await?;
    print_json(&serde_json::to_value(&user)?)
}

async fn run_request(
    session: &SessionController,
    method: Method,
    path: String,
    data: Option<&str>,
) -> Result<(), CliError> {
    let mut request = ApiRequest::new(method, path);
    if let Some(data) = data {
        request = request.with_body(serde_json::from_str::<Value>(data)?);
    }
    let response = session.client().send(request).await?;
    print_json(&response.body)
}

fn run_status(profile: &Profile) -> Result<(), CliError> {
    let status = json!({
        "cookieToken": profile.store.cookie_token().is_some(),
        "scriptToken": profile.store.script_token().is_some(),
        "refreshToken": profile.store.refresh_token().is_some(),
        "signedIn": profile.store.read().is_some(),
        "user": profile.store.cached_user(),
    });
    print_json(&status)
}

fn run_guard(profile: &Profile, routes: &RouteTable, path: &str) -> Result<(), CliError> {
    if !routes.scope().applies_to(path) {
        println!("outside guard scope");
        return Ok(());
    }
    let token = profile.cookies.get(TOKEN_COOKIE)?;
    let verdict = evaluate(routes, path, token_present(token.as_deref()));
    match verdict.outcome.location(routes) {
        Some(location) => println!("{:?}: → {location}", verdict.rule),
        None => println!("{:?}: allow", verdict.rule),
    }
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
