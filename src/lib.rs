//! Plinth: application bootstrap for axum services.
//!
//! Composes an axum application with a lazily-registered template-rendering
//! service and default handlers for the unauthorized, not-found, and
//! method-not-allowed error categories. Routing, middleware dispatch, and
//! rendering are delegated to axum and Tera; this crate is the wiring.

use std::sync::Arc;

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod registry;
pub mod response;
pub mod views;

pub use app::AppBuilder;
pub use config::AppConfig;
pub use error::{AppError, AppResult, CaughtError, ErrorKind};
pub use middleware::{ErrorHandler, ErrorMiddleware};
pub use registry::{Provider, Registry};
pub use response::{JsonResponseFactory, ResponseFactory};
pub use views::{View, ViewEngine, ViewOptions, VIEW_SERVICE_KEY};

/// Application state shared across handlers, middleware, and error pages
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub response_factory: Arc<dyn ResponseFactory>,
}
