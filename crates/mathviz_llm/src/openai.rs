//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{LlmError, LlmResult};
use crate::model::{LanguageModel, ModelResponse};
use crate::types::{ChatMessage, CompletionRequest, ResponseSchema};

/// HTTP client for the chat completions endpoint.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    max_attempts: u32,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a client with an explicit key.
    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> LlmResult<Self> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        Ok(Self {
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.max_attempts.max(1),
            client: builder.build()?,
        })
    }

    /// Create a client using `OPENAI_API_KEY` from the environment.
    pub fn from_env(config: &LlmConfig) -> LlmResult<Self> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => Self::new(key, config),
            _ => Err(LlmError::NotConfigured),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send_once(&self, body: &OpenAIRequest<'_>) -> LlmResult<ModelResponse> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw: serde_json::Value = response.json().await?;
        parse_response(raw, body.model)
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<ModelResponse> {
        let body = OpenAIRequest::from_request(request);
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                // Exponential backoff: 2s, 4s, 8s
                let delay = Duration::from_secs(1 << attempt.min(5));
                tokio::time::sleep(delay).await;
            }

            debug!(
                "POST {} model={} (attempt {}/{})",
                self.endpoint(),
                request.model,
                attempt + 1,
                self.max_attempts
            );

            match self.send_once(&body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    warn!("Transient model error, retrying: {}", e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::InvalidResponse("Max attempts exceeded".to_string())))
    }
}

fn parse_response(raw: serde_json::Value, requested_model: &str) -> LlmResult<ModelResponse> {
    let parsed: OpenAIResponse = serde_json::from_value(raw.clone())?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(LlmError::Refusal(refusal));
    }

    let content = choice
        .message
        .content
        .ok_or_else(|| LlmError::InvalidResponse("Empty message content".to_string()))?;

    let (input_tokens, output_tokens) = parsed
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    Ok(ModelResponse {
        content,
        raw,
        model: parsed.model.unwrap_or_else(|| requested_model.to_string()),
        input_tokens,
        output_tokens,
    })
}

// Wire types
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat<'a>>,
}

impl<'a> OpenAIRequest<'a> {
    fn from_request(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: request.messages.iter().map(OpenAIMessage::from_message).collect(),
            response_format: request
                .response_schema
                .as_ref()
                .map(OpenAIResponseFormat::from_schema),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: OpenAIContent,
}

impl OpenAIMessage {
    fn from_message(message: &ChatMessage) -> Self {
        let content = if message.images.is_empty() {
            OpenAIContent::Text(message.content.clone())
        } else {
            let mut parts = vec![OpenAIContentPart::Text {
                text: message.content.clone(),
            }];
            parts.extend(message.images.iter().map(|image| OpenAIContentPart::ImageUrl {
                image_url: OpenAIImageUrl { url: image.to_url() },
            }));
            OpenAIContent::Parts(parts)
        };

        Self {
            role: message.role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize)]
struct OpenAIImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: OpenAIJsonSchema<'a>,
}

impl<'a> OpenAIResponseFormat<'a> {
    fn from_schema(schema: &'a ResponseSchema) -> Self {
        Self {
            kind: "json_schema",
            json_schema: OpenAIJsonSchema {
                name: &schema.name,
                schema: &schema.schema,
                strict: schema.strict,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIJsonSchema<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: Option<String>,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}
