//! Application builder.
//!
//! Composes a framework router with the view-rendering service and the
//! default error handlers. The builder owns the router and the dependency
//! registry; callers invoke the two setup operations once during startup,
//! register routes, and finalize with [`AppBuilder::build`].

use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::MethodRouter,
    Router,
};

use crate::error::ErrorKind;
use crate::middleware::{
    ErrorMiddleware, MethodNotAllowedHandler, NotFoundHandler, UnauthorizedHandler,
};
use crate::registry::Registry;
use crate::response::ResponseFactory;
use crate::views::{ViewEngine, ViewOptions, VIEW_SERVICE_KEY};
use crate::AppState;

pub struct AppBuilder {
    router: Router<AppState>,
    state: AppState,
    view_registered: bool,
}

impl AppBuilder {
    /// Create a builder around the given response factory.
    ///
    /// Every omitted collaborator gets a framework-standard default: an
    /// empty [`Registry`] and an empty [`Router`]. Construction itself
    /// cannot fail.
    pub fn new(response_factory: Arc<dyn ResponseFactory>) -> Self {
        Self {
            router: Router::new(),
            state: AppState {
                registry: Arc::new(Registry::new()),
                response_factory,
            },
            view_registered: false,
        }
    }

    /// Use a caller-supplied dependency container instead of an empty one.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.state.registry = registry;
        self
    }

    /// Seed the builder with a pre-populated router.
    pub fn with_router(mut self, router: Router<AppState>) -> Self {
        self.router = router;
        self
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.state.registry)
    }

    /// Register a route on the underlying router.
    pub fn route(mut self, path: &str, method_router: MethodRouter<AppState>) -> Self {
        self.router = self.router.route(path, method_router);
        self
    }

    /// Register the view-rendering service under the `"view"` key.
    ///
    /// The engine is constructed on first resolution, so no template
    /// directory is touched if the service is never used; a bad `paths`
    /// entry surfaces at first render. Calling this again replaces the
    /// prior registration. `base_path` seeds the query-string routing
    /// function templates use for self-referential URLs.
    pub fn add_view_rendering_middleware(
        &mut self,
        paths: Vec<String>,
        options: ViewOptions,
        debug: bool,
        base_path: impl Into<String>,
    ) {
        let base_path = base_path.into();

        self.state.registry.set(VIEW_SERVICE_KEY, move || {
            let mut engine = ViewEngine::create(&paths, &options)?;
            engine.register_routing(base_path.clone(), debug);
            Ok(engine)
        });

        self.view_registered = true;
    }

    /// Build the error middleware and bind the three default handlers
    /// (401 Unauthorized, 404 Not Found, 405 Method Not Allowed).
    ///
    /// The caller attaches the returned middleware with
    /// [`ErrorMiddleware::attach`], after every layer that can produce one
    /// of the handled categories.
    #[must_use = "attach the error middleware to the router or its handlers will never run"]
    pub fn add_default_error_handlers(
        &mut self,
        display_error_details: bool,
        log_errors: bool,
        log_error_details: bool,
    ) -> Arc<ErrorMiddleware> {
        let error_middleware = Arc::new(ErrorMiddleware::new(
            Arc::clone(&self.state.response_factory),
            display_error_details,
            log_errors,
            log_error_details,
        ));

        error_middleware.set_error_handler(
            ErrorKind::Unauthorized,
            Arc::new(UnauthorizedHandler::new(self.state.clone())),
        );
        error_middleware.set_error_handler(
            ErrorKind::NotFound,
            Arc::new(NotFoundHandler::new(self.state.clone())),
        );
        error_middleware.set_error_handler(
            ErrorKind::MethodNotAllowed,
            Arc::new(MethodNotAllowedHandler::new(self.state.clone())),
        );

        error_middleware
    }

    /// Finalize into a serveable router.
    ///
    /// When the view service was registered, the rendering middleware is
    /// attached here so every request carries the engine in its
    /// extensions.
    pub fn build(self) -> Router {
        let AppBuilder {
            router,
            state,
            view_registered,
        } = self;

        let mut router = router.with_state(state.clone());

        if view_registered {
            let registry = Arc::clone(&state.registry);
            router = router.layer(middleware::from_fn(
                move |mut request: Request, next: Next| {
                    let registry = Arc::clone(&registry);
                    async move {
                        match registry.get::<ViewEngine>(VIEW_SERVICE_KEY) {
                            Ok(engine) => {
                                request.extensions_mut().insert(engine);
                                next.run(request).await
                            }
                            Err(err) => err.into_response(),
                        }
                    }
                },
            ));
        }

        router
    }
}
