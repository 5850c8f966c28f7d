//! Request extractors

use axum::extract::{Form, FromRequest, Request};
use axum::http::header;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Item request body, read as JSON or as a urlencoded form.
///
/// The form is chosen by `Content-Type`; every other request goes through
/// the JSON extractor. Rejections become `400` with the extractor's message.
#[derive(Debug, Clone)]
pub struct ItemBody<T>(pub T);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for ItemBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
            Ok(ItemBody(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
            Ok(ItemBody(value))
        }
    }
}
