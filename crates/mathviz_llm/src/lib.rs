//! # mathviz_llm
//!
//! Language-model client for mathviz.
//!
//! The pipeline talks to models through the [`LanguageModel`] trait. Two
//! implementations ship with the crate:
//!
//! - [`OpenAiClient`]: OpenAI-compatible chat completions over HTTP, with
//!   optional JSON-schema constrained output
//! - [`MockModel`]: scripted replies and captured requests for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use mathviz_llm::{ChatMessage, CompletionRequest, LanguageModel, LlmConfig, OpenAiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAiClient::from_env(&LlmConfig::default())?;
//!
//!     let request = CompletionRequest::new("gpt-4o-mini")
//!         .message(ChatMessage::user("Explain 1D motion in physics"));
//!
//!     let response = client.complete(&request).await?;
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod mock;
pub mod model;
pub mod openai;
pub mod types;

pub use config::LlmConfig;
pub use error::{LlmError, LlmResult};
pub use mock::{MockModel, MockReply};
pub use model::{LanguageModel, ModelResponse};
pub use openai::OpenAiClient;
pub use types::{ChatMessage, CompletionRequest, ImageInput, ResponseSchema, Role};
