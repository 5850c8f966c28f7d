//! API server implementation
//!
//! Provides the item REST API and the WebSocket notification endpoint.

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod websocket;

pub use server::{ApiServer, AppState};
