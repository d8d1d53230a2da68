//! Domain error types

use std::path::PathBuf;

use thiserror::Error;

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Error when building a template set
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to read template directory {path}: {source}")]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read template {path}: {source}")]
    UnreadableTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid template '{name}': {message}")]
    Invalid { name: String, message: String },

    #[error("Missing mandatory 'default' template{}", .0.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    MissingDefault(Option<PathBuf>),
}

/// Error when a template cannot be rendered against event data
#[derive(Debug, Clone, Error)]
#[error("Failed to render template '{template}': {message}")]
pub struct RenderError {
    pub template: String,
    pub message: String,
}

/// Error when notifying with a category the session never registered
#[derive(Debug, Clone, Error)]
#[error("Notification category '{category}' was not declared at registration")]
pub struct UndeclaredCategory {
    pub category: String,
}
