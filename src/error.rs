use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;

/// Unified error type for the Itemcast application
#[derive(Error, Debug)]
pub enum AppError {
    // Item errors
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Invalid item ID format: {0}")]
    InvalidItemId(String),

    #[error("Item not found: {id}")]
    ItemNotFound { id: String },

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Itemcast operations
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation(_)
            | AppError::InvalidItemId(_)
            | AppError::InvalidRequest(_)
            | AppError::InvalidConfig(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::ItemNotFound { .. } => StatusCode::NOT_FOUND,

            // 503 Service Unavailable
            AppError::DatabaseConnection(_) => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            AppError::Database(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// The value placed under `error` in the response body.
    ///
    /// Server errors never leak details to the caller.
    fn client_message(&self) -> Value {
        match self {
            AppError::Validation(messages) => json!(messages),
            AppError::InvalidItemId(_) => json!("Invalid item ID format"),
            AppError::ItemNotFound { .. } => json!("Item not found"),
            AppError::InvalidRequest(message) => json!(message),
            AppError::InvalidConfig(message) => json!(message),
            _ => json!("Server Error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = json!({
            "success": false,
            "error": self.client_message(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_status_code_mapping() {
        assert_eq!(
            AppError::Validation(vec!["bad".to_string()]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidItemId("xyz".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::ItemNotFound {
                id: "abc".to_string()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::DatabaseConnection("refused".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_client_server_helpers() {
        assert!(AppError::InvalidItemId("x".to_string()).is_client_error());
        assert!(!AppError::InvalidItemId("x".to_string()).is_server_error());

        assert!(AppError::Internal("boom".to_string()).is_server_error());
        assert!(!AppError::Internal("boom".to_string()).is_client_error());
    }

    #[tokio::test]
    async fn test_validation_error_body_lists_messages() {
        let (status, body) = body_json(AppError::Validation(vec![
            "Please add a title".to_string(),
            "Description cannot be more than 500 characters".to_string(),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            json!([
                "Please add a title",
                "Description cannot be more than 500 characters"
            ])
        );
    }

    #[tokio::test]
    async fn test_server_error_body_is_generic() {
        let (status, body) =
            body_json(AppError::Internal("connection reset by peer".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Server Error");
    }

    #[tokio::test]
    async fn test_malformed_id_and_not_found_are_distinct() {
        let (status, body) = body_json(AppError::InvalidItemId("zzz".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid item ID format");

        let (status, body) = body_json(AppError::ItemNotFound {
            id: "6f1c".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Item not found");
    }
}
