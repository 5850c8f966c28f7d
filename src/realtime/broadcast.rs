//! Event fan-out to connected WebSocket clients.
//!
//! Delivery is best-effort: a failure on one connection is logged and never
//! reaches the caller or the other recipients.

use std::sync::Arc;

use tracing::{debug, error, warn};

use super::pool::ConnectionPool;
use crate::models::Event;

/// Something that can push events to every connected client.
///
/// Handlers receive this at construction instead of reaching for a global.
pub trait Broadcaster: Send + Sync {
    /// Serialize `event` once and queue it on every open connection
    fn broadcast(&self, event: &Event);

    /// Number of currently connected clients
    fn active_count(&self) -> usize;

    /// Broadcast `ACTIVE_USERS_COUNT` with the count taken now
    fn broadcast_active_count(&self) {
        self.broadcast(&Event::active_users(self.active_count()));
    }

    /// Post-commit hook for a successful mutation: the domain event, then the
    /// connection count. The count is sent even though it has not changed.
    fn publish(&self, event: &Event) {
        self.broadcast(event);
        self.broadcast_active_count();
    }
}

impl Broadcaster for ConnectionPool {
    fn broadcast(&self, event: &Event) {
        let frame: Arc<str> = match event.to_frame() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                error!(event_type = event.event_type(), error = %e, "Failed to serialize event");
                return;
            }
        };

        let recipients = self.snapshot();
        debug!(
            event_type = event.event_type(),
            recipients = recipients.len(),
            "Broadcasting event"
        );

        for conn in recipients {
            if let Err(e) = conn.send_text(frame.clone()) {
                warn!(
                    conn_id = %conn.id,
                    remote = %conn.remote_addr,
                    error = %e,
                    "Error sending message to client"
                );
            }
        }
    }

    fn active_count(&self) -> usize {
        self.len()
    }
}
