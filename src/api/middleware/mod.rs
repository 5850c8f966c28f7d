//! API middleware

mod cors;
mod panic;

pub use cors::cors_layer;
pub use panic::handle_panic;
