//! Error types for model calls.

use thiserror::Error;

/// Result type alias for model operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur while talking to a language model.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM not configured. Set OPENAI_API_KEY")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model refused the request: {0}")]
    Refusal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether another attempt may succeed (network failures, 5xx, rate limits).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
