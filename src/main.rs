use std::sync::Arc;

use anyhow::{Context, Result};
use wallet_manager::{
    api,
    app_state::AppState,
    config::Config,
    infrastructure::{db, logging},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate().context("invalid configuration")?;

    logging::init_logging(&config.logging)?;
    tracing::info!("Starting wallet-manager");
    tracing::debug!(blockchain = ?config.blockchain, "Blockchain configuration");

    let pool = db::init_pool(&config.database)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Database connected");

    if std::env::var("SKIP_MIGRATIONS").is_err() {
        db::run_migrations(&pool)
            .await
            .context("database migrations failed")?;
        tracing::info!("Database migrations completed");
    } else {
        tracing::info!("Database migrations skipped (SKIP_MIGRATIONS set)");
    }

    let config = Arc::new(config);
    let state = Arc::new(AppState::from_pool(pool, config.clone()));
    tracing::info!(currencies = ?state.currencies.supported(), "Currency managers registered");

    let app = api::routes(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!(addr = %config.server.bind_addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
