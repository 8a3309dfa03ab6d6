//! Structured extraction of code and description from a generation draft.
//!
//! A second model call coerces the free-form draft into a fixed schema. The
//! returned JSON is validated locally against the same schema before use.

use std::sync::Arc;
use std::time::Instant;

use jsonschema::{Draft, JSONSchema};
use mathviz_llm::{ChatMessage, CompletionRequest, LanguageModel, LlmError, ResponseSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::context::InvocationContext;
use crate::error::{PipelineError, PipelineResult};
use crate::generation::ModelDraft;
use crate::prompt::build_extraction_prompt;

/// Name the schema is registered under in the request.
pub const SCHEMA_NAME: &str = "manim_visualization";

/// Validated output of the structured-parse call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResult {
    /// Scene source code
    pub code: String,
    /// Short description of the visualization
    pub description: String,
    /// Scene class the model says it declared, if it named one
    pub scene_class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisualizationPayload {
    manim_code: String,
    description: String,
    #[serde(default)]
    scene_class: Option<String>,
}

/// JSON schema of the structured-parse output.
pub fn visualization_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "manim_code": { "type": "string" },
            "description": { "type": "string" },
            "scene_class": { "type": ["string", "null"] }
        },
        "required": ["manim_code", "description", "scene_class"],
        "additionalProperties": false
    })
}

/// Coerces a draft into a [`StructuredResult`].
pub struct StructuredExtractor {
    model: Arc<dyn LanguageModel>,
    model_name: String,
    schema: Value,
    validator: JSONSchema,
}

impl StructuredExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, model_name: impl Into<String>) -> PipelineResult<Self> {
        let schema = visualization_schema();
        let validator = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema)
            .map_err(|e| PipelineError::Config(format!("Invalid visualization schema: {}", e)))?;

        Ok(Self {
            model,
            model_name: model_name.into(),
            schema,
            validator,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Run the structured-parse call and dump the raw response into the run directory.
    pub async fn extract(
        &self,
        ctx: &InvocationContext,
        draft: &ModelDraft,
    ) -> PipelineResult<StructuredResult> {
        let request = CompletionRequest::new(&self.model_name)
            .message(ChatMessage::user(build_extraction_prompt(&draft.text)))
            .schema(ResponseSchema::new(SCHEMA_NAME, self.schema.clone()));

        info!(draft_model = %draft.model, "Parsing draft with {}...", self.model_name);
        let started = Instant::now();
        let response = self.model.complete(&request).await.map_err(|e| match e {
            LlmError::Refusal(reason) => {
                PipelineError::SchemaValidation(format!("model refused to fill the schema: {}", reason))
            }
            other => PipelineError::Upstream(other),
        })?;
        info!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "{} parsing completed in {:.2} seconds",
            self.model_name,
            started.elapsed().as_secs_f64()
        );

        let log_path = ctx.parse_log_path();
        ctx.write_json(&log_path, &response.raw)?;
        info!("Parse response logged to {:?}", log_path);

        self.parse(&response.content)
    }

    /// Validate and convert the structured JSON text.
    pub fn parse(&self, content: &str) -> PipelineResult<StructuredResult> {
        let instance: Value = serde_json::from_str(content)
            .map_err(|e| PipelineError::SchemaValidation(format!("output is not JSON: {}", e)))?;

        if let Err(errors) = self.validator.validate(&instance) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(PipelineError::SchemaValidation(messages.join("; ")));
        }

        let payload: VisualizationPayload = serde_json::from_value(instance)
            .map_err(|e| PipelineError::SchemaValidation(e.to_string()))?;

        if payload.manim_code.trim().is_empty() {
            return Err(PipelineError::SchemaValidation(
                "manim_code is empty".to_string(),
            ));
        }

        Ok(StructuredResult {
            code: payload.manim_code,
            description: payload.description,
            scene_class: payload
                .scene_class
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathviz_llm::{MockModel, MockReply};
    use tempfile::tempdir;

    fn extractor(model: MockModel) -> StructuredExtractor {
        StructuredExtractor::new(Arc::new(model), "gpt-4o-mini").unwrap()
    }

    fn draft() -> ModelDraft {
        ModelDraft {
            text: "some draft".to_string(),
            model: "o1-preview".to_string(),
        }
    }

    #[test]
    fn test_parse_valid_payload() {
        let extractor = extractor(MockModel::new());
        let result = extractor
            .parse(r#"{"manim_code": "class A(Scene): pass", "description": "d", "scene_class": " A "}"#)
            .unwrap();

        assert_eq!(result.code, "class A(Scene): pass");
        assert_eq!(result.description, "d");
        assert_eq!(result.scene_class.as_deref(), Some("A"));
    }

    #[test]
    fn test_parse_null_scene_class() {
        let extractor = extractor(MockModel::new());
        let result = extractor
            .parse(r#"{"manim_code": "x", "description": "d", "scene_class": null}"#)
            .unwrap();
        assert_eq!(result.scene_class, None);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let extractor = extractor(MockModel::new());
        assert!(matches!(
            extractor.parse("```python\nclass A(Scene): pass```"),
            Err(PipelineError::SchemaValidation(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let extractor = extractor(MockModel::new());
        let result = extractor.parse(r#"{"manim_code": "x", "scene_class": null}"#);
        assert!(matches!(result, Err(PipelineError::SchemaValidation(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_type_and_extra_fields() {
        let extractor = extractor(MockModel::new());
        assert!(extractor
            .parse(r#"{"manim_code": 42, "description": "d", "scene_class": null}"#)
            .is_err());
        assert!(extractor
            .parse(r#"{"manim_code": "x", "description": "d", "scene_class": null, "extra": 1}"#)
            .is_err());
    }

    #[test]
    fn test_parse_rejects_blank_code() {
        let extractor = extractor(MockModel::new());
        let result = extractor.parse(r#"{"manim_code": "  ", "description": "d", "scene_class": null}"#);
        assert!(matches!(result, Err(PipelineError::SchemaValidation(_))));
    }

    #[tokio::test]
    async fn test_extract_sends_schema_and_dumps_response() {
        let temp = tempdir().unwrap();
        let ctx = InvocationContext::create(temp.path(), temp.path()).unwrap();
        let model = MockModel::new()
            .reply(r#"{"manim_code": "class A(Scene): pass", "description": "d", "scene_class": "A"}"#);
        let extractor = extractor(model.clone());

        let result = extractor.extract(&ctx, &draft()).await.unwrap();

        assert_eq!(result.scene_class.as_deref(), Some("A"));
        let request = &model.requests()[0];
        assert_eq!(request.model, "gpt-4o-mini");
        let schema = request.response_schema.as_ref().unwrap();
        assert_eq!(schema.name, SCHEMA_NAME);
        assert!(request.last_user_content().unwrap().ends_with("some draft"));
        assert!(ctx.parse_log_path().exists());
    }

    #[tokio::test]
    async fn test_extract_refusal_is_schema_error() {
        let temp = tempdir().unwrap();
        let ctx = InvocationContext::create(temp.path(), temp.path()).unwrap();
        let extractor = extractor(MockModel::new().push(MockReply::Refusal("no".into())));

        let result = extractor.extract(&ctx, &draft()).await;
        assert!(matches!(result, Err(PipelineError::SchemaValidation(_))));
    }

    #[tokio::test]
    async fn test_extract_transport_failure_is_upstream() {
        let temp = tempdir().unwrap();
        let ctx = InvocationContext::create(temp.path(), temp.path()).unwrap();
        let extractor = extractor(MockModel::new().push(MockReply::failure(502, "bad gateway")));

        let result = extractor.extract(&ctx, &draft()).await;
        assert!(matches!(result, Err(PipelineError::Upstream(_))));
    }
}
