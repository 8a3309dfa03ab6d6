//! # mathviz_core
//!
//! Question-to-animation generation pipeline for mathviz.
//!
//! A natural-language question becomes a rendered video in seven stages:
//!
//! 1. **Prompt Builder** ([`build_prompt`]): fixed template around the question
//! 2. **Generation Client** ([`GenerationClient`]): free-form model draft
//! 3. **Structured Extractor** ([`StructuredExtractor`]): draft to `{code, description}`
//! 4. **Code Normalizer** ([`SubstitutionTable`]): known formatting repairs
//! 5. **Render Executor**: a [`mathviz_render::Renderer`]
//! 6. **Repair-and-Retry Controller** ([`RetryController`]): one repaired retry
//! 7. **Artifact Locator** ([`ArtifactLocator`]): find and move the video
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mathviz_core::{AppConfig, VisualizationPipeline, VisualizationRequest};
//! use mathviz_llm::OpenAiClient;
//! use mathviz_render::ManimCli;
//!
//! let config = AppConfig::load(None)?;
//! let model = Arc::new(OpenAiClient::from_env(&config.llm)?);
//! let renderer = Arc::new(ManimCli::new(config.render.clone()));
//! let pipeline = VisualizationPipeline::new(&config, model, renderer)?;
//!
//! let output = pipeline
//!     .run(VisualizationRequest::new("Explain 1D motion in physics"))
//!     .await?;
//! println!("{}", output.video_path.display());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod extraction;
pub mod generation;
pub mod locator;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod retry;

pub use config::{AppConfig, PipelineSettings, RepairConfig, ServerConfig, DEFAULT_CONFIG_FILE};
pub use context::InvocationContext;
pub use error::{PipelineError, PipelineResult};
pub use extraction::{visualization_schema, StructuredExtractor, StructuredResult};
pub use generation::{GenerationClient, ModelDraft};
pub use locator::{resolve_scene_class, scene_classes, ArtifactLocator};
pub use normalize::{normalize, Substitution, SubstitutionTable};
pub use pipeline::{ImageSource, VisualizationOutput, VisualizationPipeline, VisualizationRequest};
pub use prompt::{build_prompt, REQUIREMENTS};
pub use retry::{RenderAttempt, RenderReport, RetryController};
