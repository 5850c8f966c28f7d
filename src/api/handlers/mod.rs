//! API request handlers

pub mod health;
pub mod items;
