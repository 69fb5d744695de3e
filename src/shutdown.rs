//! Graceful shutdown for the HTTP server.
//!
//! SIGINT/SIGTERM (ctrl-c off unix) flips a watch flag. The server stops
//! accepting connections and gives in-flight predictions a bounded drain
//! window.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Drain window for in-flight requests after a shutdown signal.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared shutdown flag. Cloning is cheap; every clone sees the same flag.
#[derive(Clone, Debug)]
pub struct ShutdownCoordinator {
    flag: Arc<watch::Sender<bool>>,
    drain_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_DRAIN_TIMEOUT)
    }

    /// Coordinator with a custom drain window.
    pub fn with_timeout(drain_timeout: Duration) -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
            drain_timeout,
        }
    }

    /// Request shutdown. Only the first call has an effect.
    pub fn shutdown(&self) {
        let first = self.flag.send_if_modified(|stopping| {
            if *stopping {
                false
            } else {
                *stopping = true;
                true
            }
        });

        if first {
            info!(drain_timeout = ?self.drain_timeout, "Shutdown requested");
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|stopping| *stopping).await;
    }

    /// Drain window for in-flight requests.
    pub fn timeout(&self) -> Duration {
        self.drain_timeout
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a termination signal, then request shutdown.
///
/// If the handlers cannot be installed the error is logged and the server
/// keeps running until killed.
pub async fn shutdown_on_signal(coordinator: ShutdownCoordinator) {
    match wait_for_signal().await {
        Ok(signal) => {
            info!(signal, "Received termination signal");
            coordinator.shutdown();
        }
        Err(e) => error!(error = %e, "Failed to install signal handlers"),
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    let name = tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
