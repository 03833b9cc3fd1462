// src/error.rs
use bindery_traits::ProviderError;
use bindery_types::ModelError;
use thiserror::Error;

/// Errors raised while loading pages and configuration. Rendering itself is
/// total and never produces one of these.
#[derive(Error, Debug)]
pub enum BinderyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid page model: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid table definitions: {0}")]
    Provider(#[from] ProviderError),
    #[error("Configuration error: {0}")]
    Config(String),
}
