//! CORS middleware configuration
//!
//! No configured origins means any origin may call the API.

use axum::http::header;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Create a CORS layer with the specified allowed origins
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allowed_headers = [header::CONTENT_TYPE, header::ACCEPT];

    if allowed_origins.is_empty() {
        debug!("CORS: No origins specified, allowing any origin");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(allowed_headers)
    } else {
        debug!("CORS: Allowing origins: {:?}", allowed_origins);
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(ALLOWED_METHODS)
            .allow_headers(allowed_headers)
    }
}
