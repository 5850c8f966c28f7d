//! Item CRUD handlers
//!
//! Every successful mutation is followed by a best-effort broadcast: the
//! domain event, then the active connection count. Broadcasting only queues
//! frames, so it never delays or fails the HTTP response.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::info;

use crate::api::extract::ItemBody;
use crate::api::server::AppState;
use crate::error::AppError;
use crate::models::{parse_item_id, ApiResponse, CreateItemRequest, Event, UpdateItemRequest};

/// List all items, newest first
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let items = state.store.find_all().await?;
    Ok(Json(ApiResponse::list(items)))
}

/// Get a single item
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = parse_item_id(&id)?;

    match state.store.find_by_id(item_id).await? {
        Some(item) => Ok(Json(ApiResponse::new(item))),
        None => Err(AppError::ItemNotFound { id }),
    }
}

/// Create a new item
pub async fn create_item(
    State(state): State<AppState>,
    ItemBody(req): ItemBody<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_item = req.into_new_item()?;

    let item = state.store.create(&new_item).await?;
    info!(id = %item.id, title = %item.title, "Created item");

    state
        .broadcaster
        .publish(&Event::ItemCreated { data: item.clone() });

    Ok((StatusCode::CREATED, Json(ApiResponse::new(item))))
}

/// Update an item's title and/or description.
///
/// Checks run in order: a field is present, the id is well formed, the item
/// exists, the field lengths are valid.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ItemBody(req): ItemBody<UpdateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patch = req.into_patch()?;
    let item_id = parse_item_id(&id)?;

    if state.store.find_by_id(item_id).await?.is_none() {
        return Err(AppError::ItemNotFound { id });
    }
    patch.validate()?;

    match state.store.update(item_id, &patch).await? {
        Some(item) => {
            info!(id = %item.id, "Updated item");
            state
                .broadcaster
                .publish(&Event::ItemUpdated { data: item.clone() });
            Ok(Json(ApiResponse::new(item)))
        }
        None => Err(AppError::ItemNotFound { id }),
    }
}

/// Delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = parse_item_id(&id)?;

    if state.store.delete(item_id).await? {
        info!(id = %item_id, "Deleted item");
        state.broadcaster.publish(&Event::ItemDeleted { id: item_id });
        Ok(Json(ApiResponse::new(json!({ "id": id }))))
    } else {
        Err(AppError::ItemNotFound { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::create_router;
    use crate::error::Result;
    use crate::models::{Item, ItemPatch, NewItem};
    use crate::realtime::{Broadcaster, ConnectionPool};
    use crate::repository::{ItemStore, MemoryItemStore};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::Router;
    use http_body_util::BodyExt;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Instant;
    use tower::ServiceExt;
    use uuid::Uuid;

    /// Records events instead of sending them
    struct RecordingBroadcaster {
        events: Mutex<Vec<Event>>,
        count: usize,
    }

    impl RecordingBroadcaster {
        fn new(count: usize) -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                count,
            }
        }

        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl Broadcaster for RecordingBroadcaster {
        fn broadcast(&self, event: &Event) {
            self.events.lock().push(event.clone());
        }

        fn active_count(&self) -> usize {
            self.count
        }
    }

    /// Store whose backend is always down
    struct UnavailableStore;

    #[async_trait]
    impl ItemStore for UnavailableStore {
        async fn find_all(&self) -> Result<Vec<Item>> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Item>> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn create(&self, _item: &NewItem) -> Result<Item> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn update(&self, _id: Uuid, _patch: &ItemPatch) -> Result<Option<Item>> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn delete(&self, _id: Uuid) -> Result<bool> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn health_check(&self) -> Result<()> {
            Err(AppError::DatabaseConnection("connection refused".to_string()))
        }
    }

    fn test_app(store: Arc<dyn ItemStore>) -> (Router, Arc<RecordingBroadcaster>) {
        let broadcaster = Arc::new(RecordingBroadcaster::new(2));
        let state = AppState {
            store,
            broadcaster: broadcaster.clone(),
            pool: Arc::new(ConnectionPool::new()),
            ws_buffer_size: 16,
            started_at: Instant::now(),
        };
        (create_router(state), broadcaster)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create(app: &Router, body: &str) -> Value {
        let (status, value) = send(app, Method::POST, "/api/items", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        value["data"].clone()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips_fields() {
        let (app, _events) = test_app(Arc::new(MemoryItemStore::new()));

        let created = create(&app, r#"{"title":"  Buy milk ","description":"2 litres"}"#).await;
        assert_eq!(created["title"], "Buy milk");

        let uri = format!("/api/items/{}", created["id"].as_str().unwrap());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "Buy milk");
        assert_eq!(body["data"]["description"], "2 litres");
        assert!(body["data"]["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_create_broadcasts_event_then_count() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));

        let created = create(&app, r#"{"title":"x"}"#).await;

        let recorded = events.take();
        assert_eq!(recorded.len(), 2);
        match &recorded[0] {
            Event::ItemCreated { data } => assert_eq!(data.id.to_string(), created["id"]),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(recorded[1], Event::ActiveUsersCount { count: 2 });
    }

    #[tokio::test]
    async fn test_create_without_title_is_rejected() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));

        let (status, body) =
            send(&app, Method::POST, "/api/items", Some(r#"{"description":"d"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Title is required"}));
        assert!(events.take().is_empty());
    }

    #[tokio::test]
    async fn test_create_validation_lists_messages() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));
        let body = json!({"title": "t".repeat(101)}).to_string();

        let (status, value) = send(&app, Method::POST, "/api/items", Some(&body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            value["error"],
            json!(["Title cannot be more than 100 characters"])
        );
        assert!(events.take().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_client_error() {
        let (app, _events) = test_app(Arc::new(MemoryItemStore::new()));

        let (status, body) = send(&app, Method::POST, "/api/items", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_list_items_newest_first_with_count() {
        let (app, _events) = test_app(Arc::new(MemoryItemStore::new()));
        create(&app, r#"{"title":"older"}"#).await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        create(&app, r#"{"title":"newer"}"#).await;

        let (status, body) = send(&app, Method::GET, "/api/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"][0]["title"], "newer");
        assert_eq!(body["data"][1]["title"], "older");
    }

    #[tokio::test]
    async fn test_get_distinguishes_malformed_and_missing_ids() {
        let (app, _events) = test_app(Arc::new(MemoryItemStore::new()));

        let (status, body) = send(&app, Method::GET, "/api/items/12345", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid item ID format");

        let uri = format!("/api/items/{}", Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Item not found");
    }

    #[tokio::test]
    async fn test_update_without_fields_changes_nothing() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));
        let created = create(&app, r#"{"title":"keep","description":"same"}"#).await;
        events.take();

        let uri = format!("/api/items/{}", created["id"].as_str().unwrap());
        let (status, body) = send(&app, Method::PUT, &uri, Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please provide title or description");
        assert!(events.take().is_empty());

        let (_, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(body["data"], created);
    }

    #[tokio::test]
    async fn test_update_partial_fields_and_broadcast() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));
        let created = create(&app, r#"{"title":"draft","description":"old"}"#).await;
        events.take();

        let uri = format!("/api/items/{}", created["id"].as_str().unwrap());
        let (status, body) =
            send(&app, Method::PUT, &uri, Some(r#"{"description":" new "}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "draft");
        assert_eq!(body["data"]["description"], "new");

        let recorded = events.take();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].event_type(), "ITEM_UPDATED");
        assert_eq!(recorded[1], Event::ActiveUsersCount { count: 2 });
    }

    #[tokio::test]
    async fn test_update_checks_existence_before_lengths() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));
        let body = json!({"title": "t".repeat(101)}).to_string();

        let uri = format!("/api/items/{}", Uuid::new_v4());
        let (status, value) = send(&app, Method::PUT, &uri, Some(&body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value["error"], "Item not found");

        let (status, value) = send(&app, Method::PUT, "/api/items/123", Some(&body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "Invalid item ID format");

        let (status, value) = send(&app, Method::PUT, "/api/items/123", Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"], "Please provide title or description");
        assert!(events.take().is_empty());
    }

    #[tokio::test]
    async fn test_form_encoded_bodies_are_accepted() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/items")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=Bread&description=whole+grain"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let created: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(created["data"]["description"], "whole grain");

        let uri = format!("/api/items/{}", created["data"]["id"].as_str().unwrap());
        let request = Request::builder()
            .method(Method::PUT)
            .uri(&uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("title=Rye"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(events.take().len(), 4);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));

        let (status, _) =
            send(&app, Method::PUT, "/api/items/nope", Some(r#"{"title":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/items/{}", Uuid::new_v4());
        let (status, _) = send(&app, Method::PUT, &uri, Some(r#"{"title":"x"}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let created = create(&app, r#"{"title":"ok"}"#).await;
        events.take();
        let uri = format!("/api/items/{}", created["id"].as_str().unwrap());
        let body = json!({"description": "d".repeat(501)}).to_string();
        let (status, value) = send(&app, Method::PUT, &uri, Some(&body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            value["error"],
            json!(["Description cannot be more than 500 characters"])
        );
        assert!(events.take().is_empty());
    }

    #[tokio::test]
    async fn test_delete_flow() {
        let (app, events) = test_app(Arc::new(MemoryItemStore::new()));
        let created = create(&app, r#"{"title":"gone soon"}"#).await;
        events.take();
        let id = created["id"].as_str().unwrap().to_string();
        let uri = format!("/api/items/{}", id);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": {"id": id}}));

        let recorded = events.take();
        assert_eq!(
            recorded,
            vec![
                Event::ItemDeleted {
                    id: Uuid::parse_str(&id).unwrap()
                },
                Event::ActiveUsersCount { count: 2 },
            ]
        );

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, "/api/items/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(events.take().is_empty());
    }

    #[tokio::test]
    async fn test_delete_echoes_path_id() {
        let (app, _events) = test_app(Arc::new(MemoryItemStore::new()));
        let created = create(&app, r#"{"title":"shout"}"#).await;
        let raw = created["id"].as_str().unwrap().to_uppercase();

        let (status, body) = send(&app, Method::DELETE, &format!("/api/items/{}", raw), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], raw);

        let braced = format!("/api/items/%7B{}%7D", Uuid::new_v4());
        let (status, body) = send(&app, Method::DELETE, &braced, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid item ID format");
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500_without_broadcast() {
        let (app, events) = test_app(Arc::new(UnavailableStore));

        let (status, body) = send(&app, Method::GET, "/api/items", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "error": "Server Error"}));

        let (status, _) = send(&app, Method::POST, "/api/items", Some(r#"{"title":"x"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(events.take().is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_connection_count() {
        let (app, _events) = test_app(Arc::new(MemoryItemStore::new()));

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["store"], "ok");
        assert_eq!(body["connections"], 2);
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_store() {
        let (app, _events) = test_app(Arc::new(UnavailableStore));

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["store"], "unavailable");
        assert_eq!(body["connections"], 2);
    }
}
