use std::sync::Arc;

use anyhow::Context;
use hospital_registry::app::{build_app, AppState};
use hospital_registry::config::AppConfig;
use hospital_registry::database::{connect_lazy, PgStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hospital_registry=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    config.validate()?;
    tracing::info!("Starting hospital registry in {:?} mode", config.environment);
    if !config.security.jwt_secret_from_env {
        tracing::warn!("JWT_SECRET not set; using the development signing secret");
    }

    let pool = connect_lazy(&config.database)?;
    let store = Arc::new(PgStore::new(pool));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config, store)?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
