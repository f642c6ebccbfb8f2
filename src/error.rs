//! Error types for Plinth applications

use axum::{
    http::{header::ALLOW, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::{JsonResponseFactory, ResponseFactory};

/// Error categories the error middleware dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    Internal,
}

impl ErrorKind {
    /// HTTP status this category maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Category for responses the framework produced directly, without an
    /// error value (axum signals unmatched routes and methods by status).
    pub(crate) fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::UNAUTHORIZED => Some(ErrorKind::Unauthorized),
            StatusCode::NOT_FOUND => Some(ErrorKind::NotFound),
            StatusCode::METHOD_NOT_ALLOWED => Some(ErrorKind::MethodNotAllowed),
            _ => None,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: String, allowed: Vec<String> },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Dispatch category for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            AppError::Template(_) => ErrorKind::Internal,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Snapshot of a failed request outcome, carried in response extensions so
/// the error middleware can route it to the handler bound for its category.
#[derive(Debug, Clone)]
pub struct CaughtError {
    pub kind: ErrorKind,
    /// User-facing message.
    pub message: String,
    /// Internal diagnostic detail. Only exposed to clients when the
    /// middleware's `display_error_details` flag is set.
    pub detail: Option<String>,
    /// Allowed methods, when the category is MethodNotAllowed.
    pub allowed: Vec<String>,
}

impl From<&AppError> for CaughtError {
    fn from(err: &AppError) -> Self {
        let allowed = match err {
            AppError::MethodNotAllowed { allowed, .. } => allowed.clone(),
            _ => Vec::new(),
        };

        CaughtError {
            kind: err.kind(),
            message: err.to_string(),
            detail: Some(format!("{err:?}")),
            allowed,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let caught = CaughtError::from(&self);

        let mut response =
            JsonResponseFactory.error_response(caught.kind.status(), &caught.message, None);

        if !caught.allowed.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&caught.allowed.join(", ")) {
                response.headers_mut().insert(ALLOW, value);
            }
        }

        response.extensions_mut().insert(caught);
        response
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
