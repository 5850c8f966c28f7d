//! Last-resort handling for panics inside request handlers

use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::AppError;

/// Turn a handler panic into the generic 500 body; the detail is only logged
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}
