//! Set of live WebSocket connections with liveness tracking.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::broadcast::Broadcaster;
use super::connection::ClientConnection;
use crate::models::Event;

/// Outcome of one liveness sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections that answered the previous ping and were pinged again
    pub pinged: usize,
    /// Connections that never answered and were terminated
    pub terminated: usize,
}

/// Live connections keyed by connection ID
#[derive(Default)]
pub struct ConnectionPool {
    connections: DashMap<Uuid, Arc<ClientConnection>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    ///
    /// The newcomer's snapshot is queued before it joins the map, so no
    /// broadcast can reach it ahead of the snapshot. Every client (newcomer
    /// included) then gets the count through a pool-wide broadcast.
    pub fn accept(&self, conn: Arc<ClientConnection>) {
        let expected = self.len() + 1;
        match Event::active_users(expected).to_frame() {
            Ok(frame) => {
                if let Err(e) = conn.send_text(Arc::from(frame)) {
                    warn!(conn_id = %conn.id, error = %e, "Failed to send connection count snapshot");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize connection count snapshot"),
        }

        self.connections.insert(conn.id, conn.clone());

        info!(
            conn_id = %conn.id,
            remote = %conn.remote_addr,
            total = self.len(),
            "Client connected"
        );

        self.broadcast_active_count();
    }

    /// Record a pong. No-op once the connection has been removed.
    pub fn on_pong(&self, id: Uuid) {
        if let Some(conn) = self.connections.get(&id) {
            conn.mark_alive();
        }
    }

    /// Drop a connection after close, error, or termination.
    ///
    /// Broadcasts the new count only if the connection was still registered,
    /// so a connection is counted out exactly once.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = self.connections.remove(&id).is_some();
        if removed {
            debug!(conn_id = %id, total = self.len(), "Connection removed from pool");
            self.broadcast_active_count();
        }
        removed
    }

    /// One liveness pass.
    ///
    /// A connection whose flag is still clear from the previous pass is
    /// terminated and removed; every other connection has its flag cleared
    /// and is pinged. A failed ping is logged and settled by the next pass.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let mut dead = Vec::new();

        // Removal happens after iteration; removing while iterating deadlocks the shard.
        for conn in self.snapshot() {
            if !conn.take_alive() {
                dead.push(conn);
                continue;
            }

            report.pinged += 1;
            if let Err(e) = conn.ping() {
                warn!(conn_id = %conn.id, remote = %conn.remote_addr, error = %e, "Failed to ping client");
            }
        }

        for conn in dead {
            info!(
                conn_id = %conn.id,
                remote = %conn.remote_addr,
                "Terminating dead client connection (no pong received)"
            );
            conn.terminate();
            if self.remove(conn.id) {
                report.terminated += 1;
            }
        }

        report
    }

    /// Terminate every connection, used on shutdown
    pub fn close_all(&self) {
        for conn in self.snapshot() {
            conn.terminate();
        }
        self.connections.clear();
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Current members, detached from the map's locks
    pub fn snapshot(&self) -> Vec<Arc<ClientConnection>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
