pub mod backend;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod server;
pub mod service;
pub mod shutdown;
pub mod state;

pub use config::{CliArgs, ServerConfig};
pub use error::{ApiError, BAD_REQUEST_MESSAGE};
pub use logging::{LoggingConfig, init_logging};
pub use server::build_router;
pub use shutdown::{ShutdownConfig, ShutdownCoordinator};

use anyhow::Result;
use backend::GoogleSheetsClient;
use state::AppState;
use std::{future::IntoFuture, sync::Arc};
use tokio::net::TcpListener;

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let backend = Arc::new(GoogleSheetsClient::new(&config)?);
    let state = Arc::new(AppState::new(config.clone(), backend));

    tracing::info!(
        backend = %config.backend_base_url,
        "starting sheets gateway",
    );

    let shutdown_config =
        ShutdownConfig::default().with_drain_timeout(config.graceful_shutdown_timeout_secs);
    let coordinator = Arc::new(ShutdownCoordinator::new(shutdown_config));

    let router = server::build_router(state);
    let listener = TcpListener::bind(config.http_bind_address).await?;
    let actual_addr = listener.local_addr()?;
    tracing::info!(bind = %actual_addr, "listening");

    let shutdown_coordinator = coordinator.clone();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_coordinator.wait_for_signal().await;
        })
        .into_future();

    // Drain in-flight requests for at most the configured grace period.
    let drain_deadline = {
        let coordinator = coordinator.clone();
        async move {
            coordinator.token().cancelled().await;
            tokio::time::sleep(coordinator.drain_timeout()).await;
        }
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!("drain timeout exceeded, forcing shutdown");
        }
    }

    tracing::info!("server stopped");
    Ok(())
}
