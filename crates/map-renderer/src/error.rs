//! Error types for the frame renderer.

use map_common::MapError;
use thiserror::Error;

/// Result type alias using RenderError.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The output surface or a clip mask could not be allocated.
    #[error("Failed to create {width}x{height} surface")]
    SurfaceCreation { width: u32, height: u32 },

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    #[error("Failed to decode symbol {id}: {message}")]
    SymbolDecode { id: u64, message: String },

    #[error("Failed to decode raster tile {key}: {message}")]
    RasterDecode { key: u64, message: String },

    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Map(#[from] MapError),
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::InvalidConfig(format!("JSON error: {}", err))
    }
}
