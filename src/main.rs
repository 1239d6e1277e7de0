use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use caretide::api;
use caretide::config;
use caretide::db;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Caretide starting v{}", config::APP_VERSION);

    std::fs::create_dir_all(config::app_data_dir())?;
    let conn = db::open_database(&config::database_path())?;

    let addr: SocketAddr = std::env::var("CARETIDE_ADDR")
        .unwrap_or_else(|_| config::DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    let handle = api::start_server(conn, addr)
        .await
        .map_err(std::io::Error::other)?;
    tracing::info!(addr = %handle.addr, "admin API listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    drop(handle);
    Ok(())
}
