//! Itemcast - Item API with live WebSocket notifications
//!
//! A small item CRUD service that pushes every change to connected
//! WebSocket clients.
//!
//! ## Features
//!
//! - REST API for items under `/api/items`
//! - Change notifications and live client counts over WebSocket
//! - Ping/pong liveness sweep that evicts silent clients
//! - PostgreSQL or in-process item storage

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod realtime;
pub mod repository;

pub use config::Config;
pub use database::Database;
pub use error::{AppError, Result};
