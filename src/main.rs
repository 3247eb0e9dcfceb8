// src/main.rs
use std::net::SocketAddr;
use std::time::Duration;

use axum_server::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use poll_service::config::Config;
use poll_service::error::StartupError;
use poll_service::{create_routes, store, AppState};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("poll_service=info,tower_http=info")),
        )
        .init();

    let config = Config::load()?;
    let store = store::connect(&config.store).await?;
    let app = create_routes(AppState::with_store(store));

    let addr = SocketAddr::new(config.host, config.port);
    let handle = Handle::new();
    tokio::spawn(shutdown_on_ctrl_c(handle.clone(), config.shutdown_grace));

    info!("Server is running on http://{addr}");
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_on_ctrl_c(handle: Handle, grace: Duration) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down, draining connections for up to {grace:?}");
        handle.graceful_shutdown(Some(grace));
    }
}
