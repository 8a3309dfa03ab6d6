//! mathviz CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Upstream model failure
//! - 4: Render failure

use std::process::ExitCode;

use clap::Parser;
use mathviz_core::PipelineError;
use mathviz_llm::LlmError;
use mathviz_server::ServerError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const UPSTREAM_ERROR: u8 = 3;
    pub const RENDER_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads MATHVIZ_CONFIG
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config_path).await,
        Commands::Generate(args) => commands::generate::execute(args, config_path).await,
        Commands::Prompt(args) => commands::prompt::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_directives = if verbose {
        "mathviz=debug,tower_http=debug,warn"
    } else {
        "mathviz=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(filter);
    let log_result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(pipeline) = cause.downcast_ref::<PipelineError>() {
            return pipeline_exit_code(pipeline);
        }
        if let Some(ServerError::Pipeline(pipeline)) = cause.downcast_ref::<ServerError>() {
            return pipeline_exit_code(pipeline);
        }
        if let Some(ServerError::Config(_)) = cause.downcast_ref::<ServerError>() {
            return ExitCodes::INVALID_ARGS;
        }
        if let Some(LlmError::NotConfigured) = cause.downcast_ref::<LlmError>() {
            return ExitCodes::INVALID_ARGS;
        }
    }
    ExitCodes::GENERAL_ERROR
}

fn pipeline_exit_code(e: &PipelineError) -> u8 {
    match e {
        PipelineError::Config(_) | PipelineError::InvalidRequest(_) => ExitCodes::INVALID_ARGS,
        PipelineError::Upstream(LlmError::NotConfigured) => ExitCodes::INVALID_ARGS,
        PipelineError::Upstream(_) | PipelineError::SchemaValidation(_) => {
            ExitCodes::UPSTREAM_ERROR
        }
        PipelineError::RenderFailed { .. }
        | PipelineError::NoSceneClassFound
        | PipelineError::ArtifactNotFound { .. }
        | PipelineError::Renderer(_) => ExitCodes::RENDER_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
