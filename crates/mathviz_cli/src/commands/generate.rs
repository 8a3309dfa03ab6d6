//! Generate command - Render one question to a video.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use mathviz_core::{ImageSource, VisualizationRequest};
use mathviz_server::upload::media_type_for;

use super::{build_pipeline, load_config};

#[derive(Args)]
pub struct GenerateArgs {
    /// Question to visualize
    pub question: String,

    /// Local image to send along with the question
    #[arg(short, long, conflicts_with = "image_url")]
    pub image: Option<PathBuf>,

    /// Remote image to send along with the question
    #[arg(long)]
    pub image_url: Option<String>,

    /// Output directory, overriding `pipeline.output_dir`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub async fn execute(args: GenerateArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.output_dir {
        config.pipeline.output_dir = dir.clone();
    }

    let mut request = VisualizationRequest::new(args.question.clone());
    if let Some(path) = &args.image {
        request = request.with_image(read_image(path)?);
    } else if let Some(url) = &args.image_url {
        request = request.with_image(ImageSource::Url(url.clone()));
    }

    let pipeline = build_pipeline(&config).await?;

    println!("🎬 Generating visualization...");
    let output = pipeline
        .run(request)
        .await
        .context("Visualization failed")?;
    info!("Invocation {} finished", output.invocation_id);

    println!();
    println!("✅ Video: {}", output.video_path.display());
    println!("   Scene: {}", output.scene_class);
    println!(
        "   Render attempts: {}, total {:.2}s",
        output.render_attempts,
        output.duration_ms as f64 / 1000.0
    );
    if config.pipeline.retain_run_dirs {
        println!("   Diagnostics: {}", output.run_dir.display());
    }
    println!();
    println!("{}", output.description);

    Ok(())
}

/// Load a local image as an upload.
fn read_image(path: &Path) -> Result<ImageSource> {
    let data = fs::read(path).with_context(|| format!("Image not found: {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    Ok(ImageSource::Upload {
        media_type: media_type_for(&file_name).to_string(),
        file_name,
        data,
    })
}
