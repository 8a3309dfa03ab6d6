//! Bounded repair-and-retry around the renderer.
//!
//! Two states only. A failed first attempt applies the retry repair table to
//! the script on disk and renders once more; a failed retry is final. Errors
//! that keep the renderer from running at all are not retried.

use std::fs;
use std::time::Instant;

use mathviz_render::{RenderJob, RenderOutcome, Renderer};
use tracing::{error, info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::normalize::SubstitutionTable;

/// Attempt state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAttempt {
    FirstAttempt,
    RetryAttempt,
}

impl RenderAttempt {
    pub fn number(&self) -> u32 {
        match self {
            Self::FirstAttempt => 1,
            Self::RetryAttempt => 2,
        }
    }
}

/// Summary of a successful render.
#[derive(Debug, Clone)]
pub struct RenderReport {
    /// Attempt that succeeded
    pub attempt: RenderAttempt,
    /// Renderer stdout of the successful attempt
    pub stdout: String,
    /// Script contents that rendered
    pub code: String,
    /// Wall time across all attempts
    pub duration_ms: u64,
}

/// Runs a render job with at most one repaired retry.
pub struct RetryController<'a> {
    renderer: &'a dyn Renderer,
    repairs: &'a SubstitutionTable,
}

impl<'a> RetryController<'a> {
    pub fn new(renderer: &'a dyn Renderer, repairs: &'a SubstitutionTable) -> Self {
        Self { renderer, repairs }
    }

    pub async fn run(&self, job: &RenderJob) -> PipelineResult<RenderReport> {
        let started = Instant::now();
        let mut attempt = RenderAttempt::FirstAttempt;

        loop {
            let outcome = self.renderer.render(job).await?;

            match (attempt, outcome) {
                (_, RenderOutcome::Success { stdout, .. }) => {
                    info!("Renderer output:\n{}", stdout);
                    let code = fs::read_to_string(job.script_path())?;
                    return Ok(RenderReport {
                        attempt,
                        stdout,
                        code,
                        duration_ms: started.elapsed().as_millis() as u64,
                    });
                }
                (RenderAttempt::FirstAttempt, RenderOutcome::Failure { exit_code, stderr, .. }) => {
                    error!("Renderer failed with exit code {}", exit_code);
                    error!("Renderer error output:\n{}", stderr);
                    self.repair(job)?;
                    info!("Applied repair table, retrying render...");
                    attempt = RenderAttempt::RetryAttempt;
                }
                (RenderAttempt::RetryAttempt, RenderOutcome::Failure { exit_code, stderr, .. }) => {
                    error!("Renderer failed again after repair (exit code {})", exit_code);
                    error!("Renderer error output after repair:\n{}", stderr);
                    return Err(PipelineError::RenderFailed { exit_code, stderr });
                }
            }
        }
    }

    /// Rewrite the script with the repair table applied.
    fn repair(&self, job: &RenderJob) -> PipelineResult<()> {
        let path = job.script_path();
        let code = fs::read_to_string(&path)?;
        let repaired = self.repairs.apply_once(&code);

        if repaired == code {
            warn!("Repair table changed nothing in {:?}", path);
        }
        fs::write(&path, repaired)?;
        Ok(())
    }
}
