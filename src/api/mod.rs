pub mod auth;
pub mod chat;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::session::{spawn_sync_worker, write_batch};

pub use auth::AuthUser;
pub use error::{ApiError, ApiResult, AppError, ErrorCode};
pub use state::{AppState, Backends};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: crate::config::DEFAULT_PORT,
        }
    }
}

impl From<&AppConfig> for ApiConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            host: config.host,
            port: config.port,
        }
    }
}

/// Server handle for managing the running server
pub struct ServerHandle {
    pub addr: SocketAddr,
    pub shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait until in-flight requests and
    /// pending workspace writes are done.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {}", e);
        }
    }
}

/// Start the API server and the workspace sync worker.
pub async fn start_server(
    state: AppState,
    config: ApiConfig,
) -> Result<ServerHandle, Box<dyn std::error::Error + Send + Sync>> {
    let sync_worker = spawn_sync_worker(state.sync_queue.clone(), state.db.clone());
    let (queue, db) = (state.sync_queue.clone(), state.db.clone());
    let router = routes::create_router(state);

    let addr = SocketAddr::new(config.host, config.port);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("API server listening on http://{}", actual_addr);

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
                tracing::info!("API server shutting down");
            })
            .await;
        if let Err(e) = result {
            tracing::error!("API server error: {}", e);
        }
        sync_worker.abort();
        let pending = queue.drain();
        if !pending.is_empty() {
            let written = write_batch(&db, &pending);
            tracing::info!(written, "Flushed pending workspace writes");
        }
    });

    Ok(ServerHandle {
        addr: actual_addr,
        shutdown_tx,
        task,
    })
}
