//! The question-to-video pipeline.
//!
//! Stages run strictly in sequence: prompt, generation, structured
//! extraction, normalization, render with one repaired retry, and artifact
//! collection. Each invocation gets its own [`InvocationContext`].

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use mathviz_llm::{ImageInput, LanguageModel};
use mathviz_render::{RenderJob, Renderer};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{AppConfig, PipelineSettings};
use crate::context::{InvocationContext, SCRIPT_FILE};
use crate::error::{PipelineError, PipelineResult};
use crate::extraction::StructuredExtractor;
use crate::generation::GenerationClient;
use crate::locator::{resolve_scene_class, ArtifactLocator};
use crate::normalize::SubstitutionTable;
use crate::prompt::build_prompt;
use crate::retry::RetryController;

/// Image accompanying a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote image the model fetches itself
    Url(String),
    /// Uploaded bytes
    Upload {
        file_name: String,
        media_type: String,
        data: Vec<u8>,
    },
}

/// One visualization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationRequest {
    pub question: String,
    pub image: Option<ImageSource>,
}

impl VisualizationRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageSource) -> Self {
        self.image = Some(image);
        self
    }
}

/// Result of a successful invocation.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizationOutput {
    pub invocation_id: Uuid,
    /// Final location of the video
    pub video_path: PathBuf,
    /// Video contents as rendered by this invocation
    #[serde(skip)]
    pub video: Vec<u8>,
    pub scene_class: String,
    pub description: String,
    /// Renderer invocations used (1 or 2)
    pub render_attempts: u32,
    /// Run directory (removed afterwards unless retained)
    pub run_dir: PathBuf,
    pub duration_ms: u64,
}

/// Question-to-video pipeline.
pub struct VisualizationPipeline {
    generation: GenerationClient,
    extractor: StructuredExtractor,
    renderer: Arc<dyn Renderer>,
    normalize: SubstitutionTable,
    retry: SubstitutionTable,
    locator: ArtifactLocator,
    settings: PipelineSettings,
}

impl VisualizationPipeline {
    /// Build a pipeline from configuration and its two external services.
    pub fn new(
        config: &AppConfig,
        model: Arc<dyn LanguageModel>,
        renderer: Arc<dyn Renderer>,
    ) -> PipelineResult<Self> {
        let (normalize, retry) = config.repair.compile()?;

        Ok(Self {
            generation: GenerationClient::new(model.clone(), &config.llm.generation_model),
            extractor: StructuredExtractor::new(model, &config.llm.extraction_model)?,
            renderer,
            normalize,
            retry,
            locator: ArtifactLocator::new(
                &config.pipeline.output_dir,
                &config.render.video_extension,
            ),
            settings: config.pipeline.clone(),
        })
    }

    pub fn output_dir(&self) -> &std::path::Path {
        self.locator.output_dir()
    }

    /// Run one invocation end to end.
    pub async fn run(&self, request: VisualizationRequest) -> PipelineResult<VisualizationOutput> {
        if request.question.trim().is_empty() {
            return Err(PipelineError::InvalidRequest("question is empty".to_string()));
        }

        let ctx = InvocationContext::create(&self.settings.runs_root(), &self.settings.output_dir)?;
        let span = info_span!("visualization", id = %ctx.id);

        let result = self.run_in(&ctx, request).instrument(span).await;

        if !self.settings.retain_run_dirs {
            if let Err(e) = ctx.cleanup() {
                warn!("Failed to remove run directory {:?}: {}", ctx.run_dir, e);
            }
        }

        if let Err(e) = &result {
            warn!(id = %ctx.id, kind = e.kind(), "Visualization failed: {}", e);
        }
        result
    }

    async fn run_in(
        &self,
        ctx: &InvocationContext,
        request: VisualizationRequest,
    ) -> PipelineResult<VisualizationOutput> {
        let started = Instant::now();
        info!("Starting visualization generation for query: {}", request.question);

        let image = match request.image {
            Some(source) => Some(self.prepare_image(ctx, source)?),
            None => None,
        };

        let prompt = build_prompt(&request.question);
        let draft = self.generation.generate(ctx, &prompt, image.as_ref()).await?;
        let structured = self.extractor.extract(ctx, &draft).await?;

        let code = self.normalize.apply(&structured.code);
        let scene_class = resolve_scene_class(&code, structured.scene_class.as_deref())?;

        fs::write(ctx.script_path(), &code)?;
        info!("Scene code saved to {:?}", ctx.script_path());
        fs::write(ctx.description_path(), &structured.description)?;
        info!("Visualization description saved to {:?}", ctx.description_path());

        let job = RenderJob::new(&ctx.run_dir, SCRIPT_FILE).scene(&scene_class);
        info!("Rendering scene {}...", scene_class);
        let report = RetryController::new(self.renderer.as_ref(), &self.retry)
            .run(&job)
            .await?;
        info!(
            "Render completed in {:.2} seconds",
            report.duration_ms as f64 / 1000.0
        );

        let source = self.locator.find(&scene_class, &job.video_root())?;
        // Other invocations of the same scene move onto the same flat path.
        let video = fs::read(&source)?;
        let video_path = self.locator.relocate(&source, &scene_class)?;

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Visualization process completed in {:.2} seconds",
            duration_ms as f64 / 1000.0
        );

        Ok(VisualizationOutput {
            invocation_id: ctx.id,
            video_path,
            video,
            scene_class,
            description: structured.description,
            render_attempts: report.attempt.number(),
            run_dir: ctx.run_dir.clone(),
            duration_ms,
        })
    }

    /// Turn the request image into model input, storing uploads in the run directory.
    fn prepare_image(&self, ctx: &InvocationContext, source: ImageSource) -> PipelineResult<ImageInput> {
        match source {
            ImageSource::Url(url) => Ok(ImageInput::Url(url)),
            ImageSource::Upload {
                file_name,
                media_type,
                data,
            } => {
                let path = ctx.upload_path(&file_name);
                fs::write(&path, &data)?;
                info!("Uploaded image saved to {:?}", path);
                Ok(ImageInput::Inline { media_type, data })
            }
        }
    }
}
