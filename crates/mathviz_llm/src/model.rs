//! Language-model trait and response type.

use async_trait::async_trait;
use serde_json::json;

use crate::error::LlmResult;
use crate::types::CompletionRequest;

/// Response from a completion call, including the raw payload for diagnostics.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Assistant message text
    pub content: String,
    /// Full response body as returned by the API
    pub raw: serde_json::Value,
    /// Model that produced the response
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ModelResponse {
    /// Build a response from plain text, synthesizing a chat-completion shaped payload.
    pub fn from_content(model: impl Into<String>, content: impl Into<String>) -> Self {
        let model = model.into();
        let content = content.into();
        let raw = json!({
            "object": "chat.completion",
            "model": model,
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        });
        Self {
            content,
            raw,
            model,
            input_tokens: 0,
            output_tokens: 0,
        }
    }
}

/// A remote (or scripted) language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one completion.
    ///
    /// When the request carries a response schema the returned `content` is
    /// the JSON text the model produced; validating it is up to the caller.
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<ModelResponse>;
}
