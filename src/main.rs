use anyhow::Context;

use appgen::api::{self, ApiConfig, AppState};
use appgen::config::AppConfig;
use appgen::{db, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    let _log_guard = match logging::init_logging(&config.logs_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("appgen server starting up...");
    tracing::info!("Data directory: {:?}", config.data_dir);
    tracing::info!("Project API: {}", config.idem_api_base_url);

    let database = db::Database::open(config.db_path()).context("Failed to open database")?;
    let state = AppState::from_config(database, &config);
    tracing::info!(models = state.models.entries().len(), "Model registry loaded");

    let server = api::start_server(state, ApiConfig::from(&config))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start API server: {}", e))?;
    tracing::info!("Download URLs use {}", config.public_url);

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested");
    server.shutdown().await;

    tracing::info!("appgen server stopped");
    Ok(())
}
