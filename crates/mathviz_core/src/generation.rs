//! Free-form generation call.

use std::sync::Arc;
use std::time::Instant;

use mathviz_llm::{ChatMessage, CompletionRequest, ImageInput, LanguageModel};
use tracing::info;

use crate::context::InvocationContext;
use crate::error::{PipelineError, PipelineResult};

/// Unstructured text returned by the generation model.
#[derive(Debug, Clone)]
pub struct ModelDraft {
    pub text: String,
    pub model: String,
}

/// Sends the built prompt to the generation model.
pub struct GenerationClient {
    model: Arc<dyn LanguageModel>,
    model_name: String,
}

impl GenerationClient {
    pub fn new(model: Arc<dyn LanguageModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Run the generation call and dump the raw response into the run directory.
    ///
    /// Failures are returned as [`PipelineError::Upstream`] without retrying.
    pub async fn generate(
        &self,
        ctx: &InvocationContext,
        prompt: &str,
        image: Option<&ImageInput>,
    ) -> PipelineResult<ModelDraft> {
        let mut message = ChatMessage::user(prompt);
        if let Some(image) = image {
            message = message.with_image(image.clone());
        }
        let request = CompletionRequest::new(&self.model_name).message(message);

        info!("Querying {} model...", self.model_name);
        let started = Instant::now();
        let response = self
            .model
            .complete(&request)
            .await
            .map_err(PipelineError::Upstream)?;
        info!(
            model = %response.model,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "{} response received in {:.2} seconds",
            self.model_name,
            started.elapsed().as_secs_f64()
        );

        let log_path = ctx.generation_log_path();
        ctx.write_json(&log_path, &response.raw)?;
        info!("Generation response logged to {:?}", log_path);

        Ok(ModelDraft {
            text: response.content,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathviz_llm::{MockModel, MockReply};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_generate_returns_draft_and_dumps_response() {
        let temp = tempdir().unwrap();
        let ctx = InvocationContext::create(temp.path(), temp.path()).unwrap();
        let model = MockModel::new().reply("Here is the code: class A(Scene): ...");
        let client = GenerationClient::new(Arc::new(model.clone()), "o1-preview");

        let draft = client.generate(&ctx, "prompt text", None).await.unwrap();

        assert!(draft.text.contains("class A(Scene)"));
        assert_eq!(draft.model, "o1-preview");
        let dump = std::fs::read_to_string(ctx.generation_log_path()).unwrap();
        assert!(dump.contains("class A(Scene)"));
        assert_eq!(model.requests()[0].model, "o1-preview");
        assert_eq!(model.requests()[0].last_user_content(), Some("prompt text"));
    }

    #[tokio::test]
    async fn test_generate_attaches_image() {
        let temp = tempdir().unwrap();
        let ctx = InvocationContext::create(temp.path(), temp.path()).unwrap();
        let model = MockModel::new().reply("draft");
        let client = GenerationClient::new(Arc::new(model.clone()), "gpt-4o");
        let image = ImageInput::Url("https://example.com/triangle.png".to_string());

        client.generate(&ctx, "p", Some(&image)).await.unwrap();

        assert_eq!(model.requests()[0].messages[0].images, vec![image]);
    }

    #[tokio::test]
    async fn test_generate_failure_is_upstream_and_not_retried() {
        let temp = tempdir().unwrap();
        let ctx = InvocationContext::create(temp.path(), temp.path()).unwrap();
        let model = MockModel::new()
            .push(MockReply::failure(500, "boom"))
            .reply("never used");
        let client = GenerationClient::new(Arc::new(model.clone()), "o1-preview");

        let result = client.generate(&ctx, "p", None).await;

        assert!(matches!(result, Err(PipelineError::Upstream(_))));
        assert_eq!(model.call_count(), 1);
        assert!(!ctx.generation_log_path().exists());
    }
}
