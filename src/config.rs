//! Configuration management for Plinth applications

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::views::ViewOptions;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    /// Template search paths, in precedence order.
    pub paths: Vec<String>,
    /// Invocation path self-referential URLs are rooted at.
    pub base_path: String,
    /// Verbose diagnostics in generated URLs and templates.
    pub debug: bool,
    /// Engine switches.
    #[serde(default)]
    pub options: ViewOptions,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ErrorConfig {
    /// Should be set to false in production.
    pub display_error_details: bool,
    pub log_errors: bool,
    pub log_error_details: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub errors: ErrorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix PLINTH_)
            .add_source(
                Environment::with_prefix("PLINTH")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            paths: vec!["./views/".to_string()],
            base_path: "/".to_string(),
            debug: false,
            options: ViewOptions::default(),
        }
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            display_error_details: false,
            log_errors: true,
            log_error_details: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
