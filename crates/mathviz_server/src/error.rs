//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mathviz_core::PipelineError;
use serde::Serialize;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Server configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Pipeline(e) => match e {
                PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                PipelineError::Upstream(_) | PipelineError::SchemaValidation(_) => {
                    StatusCode::BAD_GATEWAY
                }
                PipelineError::RenderFailed { .. }
                | PipelineError::NoSceneClassFound
                | PipelineError::ArtifactNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Pipeline(e) => e.kind(),
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        } else {
            tracing::warn!(kind = self.kind(), "Request rejected: {}", self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathviz_llm::LlmError;

    #[test]
    fn test_status_mapping() {
        let upstream = ServerError::from(PipelineError::Upstream(LlmError::NotConfigured));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let render = ServerError::from(PipelineError::RenderFailed {
            exit_code: 1,
            stderr: "boom".into(),
        });
        assert_eq!(render.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(render.kind(), "render_failed");

        let config = ServerError::from(PipelineError::Config("x".into()));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ServerError::BadRequest("missing".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
