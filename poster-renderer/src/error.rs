//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The raster surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Encoding the rendered surface failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// I/O error while reading an asset or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
