//! Request types shared by all model implementations.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// An image attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// Publicly reachable image URL
    Url(String),
    /// Raw image bytes, sent inline as a data URL
    Inline { media_type: String, data: Vec<u8> },
}

impl ImageInput {
    /// URL form accepted by the chat completions API.
    pub fn to_url(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Inline { media_type, data } => {
                format!("data:{};base64,{}", media_type, STANDARD.encode(data))
            }
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub images: Vec<ImageInput>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.images.push(image);
        self
    }
}

/// JSON schema the model output must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: serde_json::Value,
    pub strict: bool,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
            strict: true,
        }
    }
}

/// A completion request against one model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// When set, the model is asked for JSON matching this schema
    pub response_schema: Option<ResponseSchema>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            response_schema: None,
        }
    }

    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Text of the last user message, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_image_data_url() {
        let image = ImageInput::Inline {
            media_type: "image/png".to_string(),
            data: b"abc".to_vec(),
        };
        assert_eq!(image.to_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("gpt-4o-mini")
            .message(ChatMessage::system("be terse"))
            .message(ChatMessage::user("hello").with_image(ImageInput::Url("https://x/y.png".into())));

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.last_user_content(), Some("hello"));
        assert_eq!(request.messages[1].images.len(), 1);
        assert!(request.response_schema.is_none());
    }
}
