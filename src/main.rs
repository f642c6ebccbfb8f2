//! Plinth demo server
//!
//! Boots a small axum application through the Plinth builder: view
//! service, default error handlers, and two demonstration routes.

use axum::{
    http::{header::AUTHORIZATION, HeaderMap},
    response::Html,
    routing::get,
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tera::Context;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plinth::{AppBuilder, AppConfig, AppError, AppResult, JsonResponseFactory, View};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("plinth={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Plinth demo v{}", env!("CARGO_PKG_VERSION"));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Wire the application
    let mut app = AppBuilder::new(Arc::new(JsonResponseFactory));
    app.add_view_rendering_middleware(
        config.view.paths.clone(),
        config.view.options.clone(),
        config.view.debug,
        config.view.base_path.clone(),
    );
    let errors = app.add_default_error_handlers(
        config.errors.display_error_details,
        config.errors.log_errors,
        config.errors.log_error_details,
    );

    let router = app
        .route("/", get(index))
        .route("/secure", get(secure))
        .build()
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // The error middleware goes on last so it sees everything below it
    let router = errors.attach(router);

    // Start server
    let addr = SocketAddr::new(
        config.server.host.parse().expect("Invalid host address"),
        config.server.port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

/// Landing page rendered through the view service
async fn index(View(view): View) -> AppResult<Html<String>> {
    let mut context = Context::new();
    context.insert("title", "Plinth");
    Ok(Html(view.render("index.html", &context)?))
}

/// A route that insists on credentials, to exercise the 401 handler
async fn secure(headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    if !headers.contains_key(AUTHORIZATION) {
        return Err(AppError::Unauthorized(
            "credentials are required for this area".to_string(),
        ));
    }

    Ok(Json(serde_json::json!({ "status": "welcome" })))
}
