//! Error types for the renderer.
//!
//! A renderer that runs and exits non-zero is not an error here; see
//! [`crate::RenderOutcome::Failure`].

use thiserror::Error;

/// Result type alias for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that prevent a render from producing an outcome.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Renderer not available: {0}")]
    NotAvailable(String),

    #[error("Failed to spawn renderer: {0}")]
    SpawnFailed(String),

    #[error("Renderer timeout after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
