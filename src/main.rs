use std::sync::Arc;

use anyhow::Context;
use openshelter::auth::JwtSessions;
use openshelter::config::AppConfig;
use openshelter::database::{LazyDatabase, PgStore, PoolSettings};
use openshelter::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openshelter=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    config.validate()?;
    tracing::info!("Starting OpenShelter in {:?} mode", config.environment);

    // No connection is made here; the pool is built by the first request that needs it.
    let db = Arc::new(LazyDatabase::from_env(PoolSettings::from(&config.database)));
    let store = Arc::new(PgStore::new(db.clone()));
    let sessions = Arc::new(JwtSessions::from_config(&config.security).context("session provider")?);

    let bind_addr = config.bind_addr();
    let state = AppState::new(store, sessions, config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("OpenShelter listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
