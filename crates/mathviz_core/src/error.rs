//! Error types for the generation pipeline.

use std::path::PathBuf;

use mathviz_llm::LlmError;
use mathviz_render::RenderError;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can end a pipeline invocation.
///
/// Only a renderer failure on the first attempt is recovered inside the
/// pipeline; every variant here reaches the caller.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Upstream model call failed: {0}")]
    Upstream(#[source] LlmError),

    #[error("Model output does not match the visualization schema: {0}")]
    SchemaValidation(String),

    #[error("Renderer failed after retry (exit code {exit_code}): {}", last_line(.stderr))]
    RenderFailed { exit_code: i32, stderr: String },

    #[error("No scene class declaration found in generated code")]
    NoSceneClassFound,

    #[error("Rendered video for scene '{scene_class}' not found under {search_root:?}")]
    ArtifactNotFound {
        scene_class: String,
        search_root: PathBuf,
    },

    #[error("Renderer error: {0}")]
    Renderer(#[from] RenderError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Stable label for logs and error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "upstream_error",
            Self::SchemaValidation(_) => "schema_validation_error",
            Self::RenderFailed { .. } => "render_failed",
            Self::NoSceneClassFound => "no_scene_class_found",
            Self::ArtifactNotFound { .. } => "artifact_not_found",
            Self::Renderer(_) => "renderer_error",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

fn last_line(text: &str) -> &str {
    text.lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no stderr output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failed_shows_last_stderr_line() {
        let err = PipelineError::RenderFailed {
            exit_code: 1,
            stderr: "Traceback...\n  line 3\nValueError: latex error converting to dvi\n\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "Renderer failed after retry (exit code 1): ValueError: latex error converting to dvi"
        );
        assert_eq!(err.kind(), "render_failed");
    }

    #[test]
    fn test_render_failed_without_stderr() {
        let err = PipelineError::RenderFailed {
            exit_code: 2,
            stderr: String::new(),
        };
        assert!(err.to_string().ends_with("no stderr output"));
    }
}
