//! Model client configuration.

use serde::{Deserialize, Serialize};

/// Settings for the remote model API.
///
/// The API key is never part of this struct; it is read from the process
/// environment when the client is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model used for free-form code generation
    pub generation_model: String,
    /// Model used to coerce the draft into the fixed schema
    pub extraction_model: String,
    /// Per-request timeout in seconds (0 = no timeout)
    pub request_timeout_secs: u64,
    /// Total attempts per call; values above 1 retry transient failures
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            generation_model: "o1-preview".to_string(),
            extraction_model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 300,
            max_attempts: 1,
        }
    }
}

impl LlmConfig {
    /// Apply `OPENAI_BASE_URL`, `MATHVIZ_GENERATION_MODEL` and
    /// `MATHVIZ_EXTRACTION_MODEL` overrides.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("MATHVIZ_GENERATION_MODEL") {
            if !model.is_empty() {
                self.generation_model = model;
            }
        }
        if let Ok(model) = std::env::var("MATHVIZ_EXTRACTION_MODEL") {
            if !model.is_empty() {
                self.extraction_model = model;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.generation_model, "o1-preview");
        assert_eq!(config.extraction_model, "gpt-4o-mini");
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: LlmConfig = serde_json::from_str(r#"{"generation_model": "o3"}"#).unwrap();
        assert_eq!(config.generation_model, "o3");
        assert_eq!(config.extraction_model, "gpt-4o-mini");
        assert_eq!(config.request_timeout_secs, 300);
    }
}
