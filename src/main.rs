use std::{str::FromStr, sync::Arc};

use anyhow::Context;
use meetu::{AppState, Config, logging, store::SqliteStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let config = Config::load()?;

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session_inactivity_minutes,
        )));

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("bad DATABASE_URL {}", config.database_url))?
        .foreign_keys(true);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(connect_options)
        .await
        .context("connecting to database")?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("running migrations")?;

    let app_state = AppState::new(Arc::new(SqliteStore::new(db_pool)));
    let app = meetu::router(app_state).layer(session_layer);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
    }
    info!("shutting down");
}
