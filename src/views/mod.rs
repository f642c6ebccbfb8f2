//! Template rendering service.
//!
//! Wraps a Tera engine loaded from an ordered list of search paths, with a
//! template name found in an earlier path shadowing the same name in later
//! ones. The engine is registered in the application registry under
//! [`VIEW_SERVICE_KEY`] and constructed lazily on first resolution; request
//! handlers reach it through the [`View`] extractor.

pub mod routing;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;
use serde_json::Value;
use tera::{Context, Tera};

use crate::error::{AppError, AppResult};

use self::routing::QueryRouteFunction;

/// Registry key the view service is stored under.
pub const VIEW_SERVICE_KEY: &str = "view";

/// Engine construction switches.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewOptions {
    /// Escape HTML in rendered values.
    #[serde(default = "default_autoescape")]
    pub autoescape: bool,
    /// Glob appended to each search path when loading templates.
    #[serde(default = "default_template_glob")]
    pub template_glob: String,
    /// Values exposed to every template.
    #[serde(default)]
    pub globals: HashMap<String, Value>,
}

fn default_autoescape() -> bool {
    true
}

fn default_template_glob() -> String {
    "**/*.html".to_string()
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            autoescape: default_autoescape(),
            template_glob: default_template_glob(),
            globals: HashMap::new(),
        }
    }
}

/// Template engine shared read-only across requests once constructed.
pub struct ViewEngine {
    tera: Tera,
    globals: HashMap<String, Value>,
    roots: Vec<String>,
}

impl ViewEngine {
    /// Load templates from `paths` in order. A missing directory loads
    /// nothing; the failure surfaces at first render as an unknown
    /// template.
    pub fn create(paths: &[String], options: &ViewOptions) -> AppResult<Self> {
        let mut tera = Tera::default();

        for path in paths {
            let glob = format!("{}/{}", path.trim_end_matches('/'), options.template_glob);
            let loaded = Tera::parse(&glob)?;
            tera.extend(&loaded)?;
        }
        tera.build_inheritance_chains()?;

        if !options.autoescape {
            tera.autoescape_on(vec![]);
        }

        Ok(Self {
            tera,
            globals: options.globals.clone(),
            roots: paths.to_vec(),
        })
    }

    /// Attach the query-string routing function and its `debug` global.
    ///
    /// `base_path` is the invocation path self-referential URLs are rooted
    /// at; it is threaded in explicitly rather than read from the process
    /// environment.
    pub fn register_routing(&mut self, base_path: impl Into<String>, debug: bool) {
        self.tera
            .register_function("route", QueryRouteFunction::new(base_path, debug));
        self.globals.insert("debug".to_string(), Value::Bool(debug));
    }

    /// Expose `value` to every template under `key`.
    pub fn add_global(&mut self, key: impl Into<String>, value: Value) {
        self.globals.insert(key.into(), value);
    }

    /// Search paths the engine was rooted at.
    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render `name` with the engine globals plus `context`.
    pub fn render(&self, name: &str, context: &Context) -> AppResult<String> {
        let mut merged = Context::new();
        for (key, value) in &self.globals {
            merged.insert(key.as_str(), value);
        }
        merged.extend(context.clone());

        Ok(self.tera.render(name, &merged)?)
    }
}

/// Extractor handing a handler the view engine bound to its request.
pub struct View(pub Arc<ViewEngine>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for View {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<ViewEngine>>()
            .cloned()
            .map(View)
            .ok_or_else(|| {
                AppError::Internal("view service is not registered for this request".to_string())
            })
    }
}
