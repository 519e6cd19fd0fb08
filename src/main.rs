use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use review_assigner::config::Config;
use review_assigner::db;
use review_assigner::services::http_server;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration from environment")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    log::info!("[main] Starting review assigner");
    log::info!("[main] Using database: {}", config.database_path.display());

    let pool = db::initialize_with(&config.database_path, config.max_connections)
        .await
        .context("Failed to initialize database")?;

    let listener = http_server::bind(&config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr()))?;

    let cancel_token = CancellationToken::new();
    let shutdown = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("[main] Failed to listen for Ctrl-C: {}", e);
            return;
        }
        log::info!("[main] Received Ctrl-C");
        shutdown.cancel();
    });

    http_server::serve(listener, pool.clone(), cancel_token).await?;

    pool.close().await;
    log::info!("[main] Bye");

    Ok(())
}
