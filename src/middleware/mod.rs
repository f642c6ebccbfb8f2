//! Error-handling middleware.
//!
//! Classifies failed responses into the unauthorized / not-found /
//! method-not-allowed categories and routes each to its bound handler.
//! Categories without a binding get uniform default handling governed by
//! the `display_error_details` flag.

pub mod handlers;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use axum::{
    extract::Request,
    http::{header::ALLOW, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    Router,
};

use crate::error::{CaughtError, ErrorKind};
use crate::response::ResponseFactory;

pub use handlers::{ErrorHandler, MethodNotAllowedHandler, NotFoundHandler, UnauthorizedHandler};

/// Error middleware configured by the three error-handling flags.
///
/// NOTE: attach this last; it only sees responses produced by the layers
/// and routes below it, so anything added after attachment bypasses the
/// bound handlers.
pub struct ErrorMiddleware {
    display_error_details: bool,
    log_errors: bool,
    log_error_details: bool,
    response_factory: Arc<dyn ResponseFactory>,
    handlers: RwLock<HashMap<ErrorKind, Arc<dyn ErrorHandler>>>,
    attached: AtomicBool,
}

impl ErrorMiddleware {
    pub fn new(
        response_factory: Arc<dyn ResponseFactory>,
        display_error_details: bool,
        log_errors: bool,
        log_error_details: bool,
    ) -> Self {
        Self {
            display_error_details,
            log_errors,
            log_error_details,
            response_factory,
            handlers: RwLock::new(HashMap::new()),
            attached: AtomicBool::new(false),
        }
    }

    /// Bind `handler` for `kind`, replacing any prior binding.
    pub fn set_error_handler(&self, kind: ErrorKind, handler: Arc<dyn ErrorHandler>) {
        self.handlers
            .write()
            .expect("handler map lock poisoned")
            .insert(kind, handler);
    }

    /// Categories with an explicit handler bound.
    pub fn handler_kinds(&self) -> Vec<ErrorKind> {
        self.handlers
            .read()
            .expect("handler map lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    pub fn has_handler(&self, kind: ErrorKind) -> bool {
        self.handlers
            .read()
            .expect("handler map lock poisoned")
            .contains_key(&kind)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Relaxed)
    }

    /// Wrap `router` with this middleware as its outermost layer.
    pub fn attach(self: Arc<Self>, router: Router) -> Router {
        self.attached.store(true, Ordering::Relaxed);

        let mw = Arc::clone(&self);
        router.layer(middleware::from_fn(move |request: Request, next: Next| {
            let mw = Arc::clone(&mw);
            async move { mw.handle(request, next).await }
        }))
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let response = next.run(request).await;

        let caught = match response.extensions().get::<CaughtError>() {
            Some(caught) => caught.clone(),
            None => match ErrorKind::from_status(response.status()) {
                Some(kind) => Self::synthesize(kind, &method, &path, &response),
                None => return response,
            },
        };

        if self.log_errors {
            if self.log_error_details {
                tracing::error!(
                    method = %method,
                    path = %path,
                    kind = ?caught.kind,
                    detail = caught.detail.as_deref().unwrap_or(""),
                    "{}",
                    caught.message
                );
            } else {
                tracing::error!(method = %method, path = %path, kind = ?caught.kind, "{}", caught.message);
            }
        }

        let handler = self
            .handlers
            .read()
            .expect("handler map lock poisoned")
            .get(&caught.kind)
            .cloned();

        match handler {
            Some(handler) => handler.handle(&caught, self.display_error_details).await,
            None => self.default_response(&caught),
        }
    }

    /// Category record for a response the framework produced directly,
    /// without an error value.
    fn synthesize(kind: ErrorKind, method: &Method, path: &str, response: &Response) -> CaughtError {
        let allowed = response
            .headers()
            .get(ALLOW)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(',').map(|m| m.trim().to_string()).collect())
            .unwrap_or_default();

        let message = match kind {
            ErrorKind::Unauthorized => format!("authorization required for {path}"),
            ErrorKind::NotFound => format!("no route matches {path}"),
            ErrorKind::MethodNotAllowed => format!("method {method} is not allowed for {path}"),
            ErrorKind::Internal => format!("request to {path} failed"),
        };

        CaughtError {
            kind,
            message,
            detail: None,
            allowed,
        }
    }

    /// Uniform handling for categories without a bound handler.
    fn default_response(&self, caught: &CaughtError) -> Response {
        let detail = if self.display_error_details {
            caught.detail.as_deref()
        } else {
            None
        };

        let mut response =
            self.response_factory
                .error_response(caught.kind.status(), &caught.message, detail);

        if !caught.allowed.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&caught.allowed.join(", ")) {
                response.headers_mut().insert(ALLOW, value);
            }
        }

        response
    }
}

impl Drop for ErrorMiddleware {
    fn drop(&mut self) {
        if !self.is_attached() && !self.handler_kinds().is_empty() {
            tracing::warn!(
                "error middleware was configured but never attached; its handlers will not run"
            );
        }
    }
}
