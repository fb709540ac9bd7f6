//! Error types for the map data model.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Errors raised while building or loading map model objects.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Failed to parse style: {0}")]
    StyleParse(String),

    #[error("Style not found: {0}")]
    StyleNotFound(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::StyleParse(format!("JSON error: {}", err))
    }
}
