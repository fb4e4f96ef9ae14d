//! Graceful shutdown coordination.
//!
//! Listens for SIGINT/SIGTERM and exposes a cancellation token that the
//! HTTP server uses to stop accepting connections while in-flight requests
//! drain within a bounded grace period.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Grace period for in-flight requests before the process exits.
    pub drain_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl ShutdownConfig {
    pub fn with_drain_timeout(mut self, timeout_secs: u64) -> Self {
        self.drain_timeout = Duration::from_secs(timeout_secs);
        self
    }
}

pub struct ShutdownCoordinator {
    config: ShutdownConfig,
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(config: ShutdownConfig) -> Self {
        Self {
            config,
            token: CancellationToken::new(),
        }
    }

    /// Child token for async tasks that should stop on shutdown.
    pub fn token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn drain_timeout(&self) -> Duration {
        self.config.drain_timeout
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Triggers shutdown without a signal. Used by tests.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    /// Blocks until SIGINT or SIGTERM arrives (or `trigger` is called),
    /// then cancels the shutdown token.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = wait_for_os_signal() => {
                info!("shutdown signal received");
                self.token.cancel();
            }
            _ = self.token.cancelled() => {}
        }
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("failed to install SIGTERM handler: {}", e);
            std::future::pending().await
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
