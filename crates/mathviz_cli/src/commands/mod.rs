//! CLI command definitions.
//!
//! Each subcommand maps to one way of driving the visualization pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mathviz_core::{AppConfig, VisualizationPipeline};
use mathviz_llm::OpenAiClient;
use mathviz_render::{ManimCli, Renderer};
use tracing::{info, warn};

pub mod generate;
pub mod prompt;
pub mod serve;

/// mathviz - turn math and physics questions into animations
#[derive(Parser)]
#[command(name = "mathviz")]
#[command(version, about = "mathviz - turn math and physics questions into animations")]
#[command(long_about = r#"
mathviz asks a language model for an animation script that explains a
question, renders it with Manim and hands back the video.

COMMANDS:
  serve     → Run the HTTP service
  generate  → Render one question to a video
  prompt    → Print the generation prompt for a question

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Upstream model failure
  4 - Render failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./mathviz.toml when present)
    #[arg(short, long, global = true, env = "MATHVIZ_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service
    Serve(serve::ServeArgs),

    /// Render one question to a video
    Generate(generate::GenerateArgs),

    /// Print the generation prompt for a question
    Prompt(prompt::PromptArgs),
}

/// Load configuration with environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path).context("Failed to load configuration")
}

/// Wire the OpenAI client and the Manim renderer into a pipeline.
pub async fn build_pipeline(config: &AppConfig) -> Result<VisualizationPipeline> {
    let model = OpenAiClient::from_env(&config.llm).context("Cannot create model client")?;
    info!("Model endpoint: {}", model.base_url());

    let renderer = ManimCli::new(config.render.clone());
    match renderer.version().await {
        Ok(version) => info!("Renderer: {}", version),
        Err(e) => warn!("Renderer '{}' not usable yet: {}", config.render.binary, e),
    }

    let pipeline = VisualizationPipeline::new(config, Arc::new(model), Arc::new(renderer))?;
    Ok(pipeline)
}
