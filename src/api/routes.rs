//! API route definitions

use axum::routing::get;
use axum::Router;

use super::handlers;
use super::server::AppState;
use super::websocket;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // WebSocket notifications, also accepted on the root path
        .route("/", get(websocket::items::items_ws))
        .route("/ws", get(websocket::items::items_ws))
        .nest("/api", api_routes())
        .with_state(state)
}

/// Item CRUD routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route(
            "/items/:id",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
}
