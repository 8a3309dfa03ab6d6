//! Prompt command - Print the generation prompt.

use anyhow::Result;
use clap::Args;

use mathviz_core::{build_prompt, PipelineError};

#[derive(Args)]
pub struct PromptArgs {
    /// Question to wrap
    pub question: String,
}

pub async fn execute(args: PromptArgs) -> Result<()> {
    if args.question.trim().is_empty() {
        return Err(PipelineError::InvalidRequest("question is empty".to_string()).into());
    }
    println!("{}", build_prompt(&args.question));
    Ok(())
}
