//! WebSocket handlers
//!
//! Each connection gets a bounded outbound queue. Producers use `try_send`
//! so a slow client never blocks a broadcast.

pub mod items;
