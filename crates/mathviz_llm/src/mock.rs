//! Scripted language model for testing.
//!
//! Replies are consumed in order, one per `complete` call. Every request is
//! captured so tests can assert on prompts and call counts.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{LlmError, LlmResult};
use crate::model::{LanguageModel, ModelResponse};
use crate::types::CompletionRequest;

/// Predefined reply for the next call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful response with this content
    Content(String),
    /// API failure with status and body
    Failure { status: u16, body: String },
    /// Model refusal
    Refusal(String),
}

impl MockReply {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content(text.into())
    }

    pub fn failure(status: u16, body: impl Into<String>) -> Self {
        Self::Failure {
            status,
            body: body.into(),
        }
    }
}

/// Mock model returning scripted replies.
#[derive(Clone, Default)]
pub struct MockModel {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.replies.lock().push_back(MockReply::content(content));
        self
    }

    /// Queue an arbitrary reply.
    pub fn push(self, reply: MockReply) -> Self {
        self.replies.lock().push_back(reply);
        self
    }

    /// All captured requests, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<ModelResponse> {
        self.requests.lock().push(request.clone());

        let reply = self.replies.lock().pop_front();
        match reply {
            Some(MockReply::Content(content)) => {
                Ok(ModelResponse::from_content(&request.model, content))
            }
            Some(MockReply::Failure { status, body }) => Err(LlmError::Api { status, body }),
            Some(MockReply::Refusal(reason)) => Err(LlmError::Refusal(reason)),
            None => Err(LlmError::InvalidResponse(
                "Mock model has no scripted reply left".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    #[tokio::test]
    async fn test_replies_in_order() {
        let model = MockModel::new()
            .reply("first")
            .push(MockReply::failure(503, "overloaded"));
        let request = CompletionRequest::new("m").message(ChatMessage::user("q"));

        let first = model.complete(&request).await.unwrap();
        assert_eq!(first.content, "first");
        assert_eq!(first.raw["choices"][0]["message"]["content"], "first");

        let second = model.complete(&request).await;
        assert!(matches!(second, Err(LlmError::Api { status: 503, .. })));

        assert!(model.complete(&request).await.is_err());
        assert_eq!(model.call_count(), 3);
        assert_eq!(model.remaining(), 0);
    }

    #[tokio::test]
    async fn test_captures_requests() {
        let model = MockModel::new().reply("ok");
        let request = CompletionRequest::new("gpt-4o-mini").message(ChatMessage::user("hello"));
        model.complete(&request).await.unwrap();

        let captured = model.requests();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].model, "gpt-4o-mini");
        assert_eq!(captured[0].last_user_content(), Some("hello"));
    }
}
