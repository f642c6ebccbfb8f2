//! Default handlers for the unauthorized, not-found, and method-not-allowed
//! error categories.
//!
//! Each handler holds the application state so the response is produced in
//! the application's own context: an error page rendered through the view
//! service when one is registered and carries the matching template, the
//! response factory's body otherwise.

use axum::{
    async_trait,
    http::{header::ALLOW, HeaderValue},
    response::{Html, IntoResponse, Response},
};
use tera::Context;

use crate::error::CaughtError;
use crate::views::{ViewEngine, VIEW_SERVICE_KEY};
use crate::AppState;

/// Handles one error category.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, error: &CaughtError, display_error_details: bool) -> Response;
}

async fn respond(app: &AppState, error: &CaughtError, template: &str, display: bool) -> Response {
    let status = error.kind.status();
    let detail = if display { error.detail.as_deref() } else { None };

    if app.registry.contains(VIEW_SERVICE_KEY) {
        match app.registry.get::<ViewEngine>(VIEW_SERVICE_KEY) {
            Ok(view) if view.has_template(template) => {
                let mut context = Context::new();
                context.insert("status", &status.as_u16());
                context.insert("message", &error.message);
                context.insert("detail", &detail);

                match view.render(template, &context) {
                    Ok(body) => return (status, Html(body)).into_response(),
                    Err(err) => {
                        tracing::warn!(template = template, "error page failed to render: {err}");
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("view service could not be resolved for error page: {err}");
            }
        }
    }

    app.response_factory
        .error_response(status, &error.message, detail)
}

/// HTTP 401 Unauthorized handler.
pub struct UnauthorizedHandler {
    app: AppState,
}

impl UnauthorizedHandler {
    pub fn new(app: AppState) -> Self {
        Self { app }
    }
}

#[async_trait]
impl ErrorHandler for UnauthorizedHandler {
    async fn handle(&self, error: &CaughtError, display_error_details: bool) -> Response {
        respond(&self.app, error, "errors/401.html", display_error_details).await
    }
}

/// HTTP 404 Not Found handler.
pub struct NotFoundHandler {
    app: AppState,
}

impl NotFoundHandler {
    pub fn new(app: AppState) -> Self {
        Self { app }
    }
}

#[async_trait]
impl ErrorHandler for NotFoundHandler {
    async fn handle(&self, error: &CaughtError, display_error_details: bool) -> Response {
        respond(&self.app, error, "errors/404.html", display_error_details).await
    }
}

/// HTTP 405 Method Not Allowed handler. Restores the `Allow` header when
/// the allowed-methods list is known.
pub struct MethodNotAllowedHandler {
    app: AppState,
}

impl MethodNotAllowedHandler {
    pub fn new(app: AppState) -> Self {
        Self { app }
    }
}

#[async_trait]
impl ErrorHandler for MethodNotAllowedHandler {
    async fn handle(&self, error: &CaughtError, display_error_details: bool) -> Response {
        let mut response =
            respond(&self.app, error, "errors/405.html", display_error_details).await;

        if !error.allowed.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&error.allowed.join(", ")) {
                response.headers_mut().insert(ALLOW, value);
            }
        }

        response
    }
}
