//! Error types for poster document operations.

use thiserror::Error;

/// Result type for poster document operations.
pub type PosterResult<T> = Result<T, PosterError>;

/// Errors that can occur while building or editing a poster document.
#[derive(Debug, Error)]
pub enum PosterError {
    /// A configuration value could not be interpreted.
    ///
    /// Numeric values are clamped rather than rejected, so this only covers
    /// values with no sensible nearest neighbour (unknown aspect ratios,
    /// malformed colors, unknown element names).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
