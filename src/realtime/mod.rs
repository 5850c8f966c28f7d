//! Live WebSocket clients
//!
//! The [`ConnectionPool`] is the only record of who is connected. Every count
//! reported to clients is read from it at send time.

pub mod broadcast;
pub mod connection;
pub mod heartbeat;
pub mod pool;

pub use broadcast::Broadcaster;
pub use connection::{ClientConnection, DeliveryError, Outbound};
pub use heartbeat::{HeartbeatConfig, HeartbeatHandle, HeartbeatService};
pub use pool::{ConnectionPool, SweepReport};
