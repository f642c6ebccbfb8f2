//! Response construction seam.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error response body
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Produces outgoing error responses in the application's preferred shape.
///
/// The builder requires one of these at construction; the default error
/// handlers fall back to it whenever no template page is available for an
/// error category.
pub trait ResponseFactory: Send + Sync {
    fn error_response(&self, status: StatusCode, message: &str, detail: Option<&str>) -> Response;
}

/// Default factory producing JSON error bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseFactory;

impl ResponseFactory for JsonResponseFactory {
    fn error_response(&self, status: StatusCode, message: &str, detail: Option<&str>) -> Response {
        let body = Json(ErrorBody {
            code: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: message.to_string(),
            detail: detail.map(str::to_string),
        });

        (status, body).into_response()
    }
}
