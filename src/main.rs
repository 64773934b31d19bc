use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use campus_discipline_api::{
    config::AppConfig,
    database::{DatabaseManager, PgStore},
    server,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("campus_discipline_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Campus Discipline API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config)
        .await
        .context("failed to connect to database")?;
    let port = config.api.port;
    let state = AppState::new(config, Arc::new(PgStore::new(pool))).await?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Campus Discipline API listening on http://{}", bind_addr);
    axum::serve(listener, server::app(state)).await?;
    Ok(())
}
