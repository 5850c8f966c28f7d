use serde::Serialize;

/// Success envelope: `{success: true, [count,] data}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        ApiResponse {
            success: true,
            count: None,
            data,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        ApiResponse {
            success: true,
            count: Some(data.len()),
            data,
        }
    }
}
