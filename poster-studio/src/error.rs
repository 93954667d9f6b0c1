//! Error types for the editing session and command-line host.

use thiserror::Error;

use crate::generator::GenerationError;

/// Result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors that can occur in the studio.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Document could not be loaded or edited.
    #[error("Document error: {0}")]
    Document(#[from] poster_core::PosterError),

    /// Rendering or export failed.
    #[error("Render error: {0}")]
    Render(#[from] poster_renderer::RenderError),

    /// Background generation failed.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// An image source could not be resolved.
    #[error("Asset error: {0}")]
    Asset(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
