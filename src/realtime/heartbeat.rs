//! Periodic liveness sweep over the connection pool
//!
//! Runs for the lifetime of the server and stops only through its handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, instrument};

use super::pool::ConnectionPool;

/// Heartbeat configuration
#[derive(Clone)]
pub struct HeartbeatConfig {
    /// Time between sweeps; a client must answer a ping within one interval
    pub interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
        }
    }
}

/// Drives [`ConnectionPool::sweep`] on a fixed interval
pub struct HeartbeatService {
    pool: Arc<ConnectionPool>,
    config: HeartbeatConfig,
}

impl HeartbeatService {
    pub fn new(pool: Arc<ConnectionPool>, config: HeartbeatConfig) -> Self {
        Self { pool, config }
    }

    /// Run the heartbeat until shutdown is signalled
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting WebSocket heartbeat ({}s interval)",
            self.config.interval.as_secs()
        );

        let mut ticker = interval(self.config.interval);
        ticker.tick().await; // Skip immediate tick

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.pool.sweep();
                    debug!(
                        pinged = report.pinged,
                        terminated = report.terminated,
                        remaining = self.pool.len(),
                        "Liveness sweep complete"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("WebSocket heartbeat stopped, interval cleared");
                        break;
                    }
                }
            }
        }
    }
}

/// Handle for stopping the heartbeat
pub struct HeartbeatHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl HeartbeatHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { shutdown_tx: tx }, rx)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
