use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod middleware;
mod modules;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use config::credentials::{self, AwsKeyPair};
use config::settings::AppConfig;
use infrastructure::db::pool;
use infrastructure::storage::s3::StorageService;
use state::AppState;

/// Keys from the environment win; otherwise the shared credentials file is read.
async fn resolve_credentials(config: &AppConfig) -> anyhow::Result<AwsKeyPair> {
    match (&config.aws.access_key_id, &config.aws.secret_access_key) {
        (Some(id), Some(secret)) => Ok(AwsKeyPair {
            aws_access_key_id: id.clone(),
            aws_secret_access_key: secret.clone(),
        }),
        _ => credentials::load()
            .await
            .context("No AWS keys in the environment and the credentials file could not be used"),
    }
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down, cancelling in-flight uploads...");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("Invalid configuration")?;

    let db = pool::connect_to_db(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    pool::run_migrations(&db)
        .await
        .context("Failed to apply database migrations")?;

    let keys = resolve_credentials(&config).await?;
    let storage = StorageService::new(&config.aws, &keys);

    let shutdown = CancellationToken::new();
    let port = config.server_port;
    let state = AppState::new(config, db, Arc::new(storage), shutdown.clone());
    let app = app::create_app(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    Ok(())
}
