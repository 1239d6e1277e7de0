//! Admin API server lifecycle.
//!
//! Pattern: bind, spawn a background task, return a handle carrying the
//! bound address and a shutdown channel.

use std::net::SocketAddr;

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::api::router::api_router;

/// Handle to a running admin API server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ServerHandle {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("admin API server shutdown signal sent");
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bind the admin API to `addr` (port 0 picks an ephemeral port) and spawn
/// it in a background task.
pub async fn start_server(conn: Connection, addr: SocketAddr) -> Result<ServerHandle, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind admin API server: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("failed to get server address: {e}"))?;

    let app = api_router(conn);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("admin API server received shutdown signal");
        };

        tracing::info!(%addr, "admin API server started");
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("admin API server error: {e}");
        }
        tracing::info!("admin API server stopped");
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[tokio::test]
    async fn binds_ephemeral_port_and_shuts_down() {
        let conn = open_memory_database().unwrap();
        let mut handle = start_server(conn, "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(handle.addr.port(), 0);

        // Unknown routes still answer, proving the listener is live.
        let url = format!("http://{}/nonexistent", handle.addr);
        let response = reqwest::get(&url).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

        handle.shutdown();
    }
}
