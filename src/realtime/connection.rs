//! WebSocket client connection state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use uuid::Uuid;

/// Frame queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized event, shared between all recipients of one broadcast
    Text(Arc<str>),
    /// Transport-level liveness ping
    Ping,
}

/// Failure to queue a frame for one connection
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue full")]
    QueueFull,

    #[error("connection closed")]
    Closed,
}

/// A connected WebSocket client
pub struct ClientConnection {
    /// Unique connection ID
    pub id: Uuid,
    /// Peer address, for diagnostics only
    pub remote_addr: String,
    /// When this connection was accepted
    connected_at: Instant,
    /// Cleared by each sweep, set again by each pong
    alive: AtomicBool,
    /// Queue drained in order by the connection's writer task
    tx: mpsc::Sender<Outbound>,
    /// Signalled when the connection must be torn down
    terminate: Notify,
}

impl ClientConnection {
    pub fn new(remote_addr: impl Into<String>, tx: mpsc::Sender<Outbound>) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote_addr: remote_addr.into(),
            connected_at: Instant::now(),
            alive: AtomicBool::new(true),
            tx,
            terminate: Notify::new(),
        }
    }

    /// Queue a text frame without waiting
    pub fn send_text(&self, frame: Arc<str>) -> Result<(), DeliveryError> {
        self.enqueue(Outbound::Text(frame))
    }

    /// Queue a ping without waiting
    pub fn ping(&self) -> Result<(), DeliveryError> {
        self.enqueue(Outbound::Ping)
    }

    fn enqueue(&self, frame: Outbound) -> Result<(), DeliveryError> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    /// Record a pong
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Relaxed);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Clear the liveness flag, returning whether it was set
    pub fn take_alive(&self) -> bool {
        self.alive.swap(false, Ordering::Relaxed)
    }

    /// Ask the session task to drop the socket.
    ///
    /// The permit is stored, so a request made before the task waits is not lost.
    pub fn terminate(&self) {
        self.terminate.notify_one();
    }

    /// Resolves once [`terminate`](Self::terminate) has been called
    pub async fn terminated(&self) {
        self.terminate.notified().await;
    }

    /// Time since the connection was accepted
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
