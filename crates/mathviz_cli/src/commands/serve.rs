//! Serve command - Run the HTTP service.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use mathviz_server::AppState;

use super::{build_pipeline, load_config};

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind, overriding `server.bind`
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Output directory, overriding `pipeline.output_dir`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(dir) = args.output_dir {
        config.pipeline.output_dir = dir;
    }

    info!("Videos will be written to {:?}", config.pipeline.output_dir);
    let pipeline = build_pipeline(&config).await?;

    mathviz_server::serve(AppState::new(pipeline), &config.server)
        .await
        .with_context(|| format!("Server on {} failed", config.server.bind))?;
    Ok(())
}
