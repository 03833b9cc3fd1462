use thiserror::Error;

/// Errors raised while loading authored model data (component trees,
/// binding descriptors) from JSON. These indicate a malformed document,
/// never a missing value at render time.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid binding descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid component '{id}': {message}")]
    InvalidComponent { id: String, message: String },
}
