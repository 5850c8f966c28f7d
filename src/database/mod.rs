//! Persistent store connection and schema

pub mod migrations;
pub mod pool;

pub use pool::Database;
