mod config;
mod guard;
mod routes;

use menu_admin::ConfigError;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("server io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt::init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env loaded");
    }

    let config = config::EdgeConfig::from_env()?;
    let app = routes::app(&config);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

    tracing::info!(
        port = config.port,
        site_dir = %config.site_dir.display(),
        login = config.routes.login(),
        dashboard = config.routes.dashboard(),
        "menu-admin edge listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
