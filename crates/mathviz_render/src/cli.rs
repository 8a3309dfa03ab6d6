//! Subprocess renderer driving the `manim` command line.
//!
//! The child runs in the job's working directory with both streams piped.
//! It is killed when the configured timeout elapses or when the render
//! future is dropped, so callers cancel a render by dropping (or aborting)
//! the task awaiting it.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::renderer::{RenderJob, RenderOutcome, Renderer};

/// Renderer backed by the `manim` CLI.
pub struct ManimCli {
    config: RenderConfig,
}

impl ManimCli {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Build the command line arguments for a job.
    pub fn build_args(&self, job: &RenderJob) -> Vec<String> {
        let mut args = Vec::new();

        if self.config.preview {
            args.push("-p".to_string());
        }

        args.push("-q".to_string());
        args.push(self.config.quality.flag().to_string());

        if self.config.disable_caching {
            args.push("--disable_caching".to_string());
        }

        args.extend(self.config.extra_args.iter().cloned());

        args.push(job.script.to_string_lossy().to_string());

        if let Some(scene) = &job.scene {
            args.push(scene.clone());
        }

        args
    }

    /// Format command for logging.
    fn format_command(&self, args: &[String]) -> String {
        let mut cmd = self.config.binary.clone();
        for arg in args {
            if arg.contains(' ') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }
}

#[async_trait]
impl Renderer for ManimCli {
    async fn render(&self, job: &RenderJob) -> RenderResult<RenderOutcome> {
        let args = self.build_args(job);
        info!("Rendering {:?} in {:?}", job.script, job.working_dir);
        debug!("Command: {}", self.format_command(&args));

        let mut cmd = Command::new(&self.config.binary);
        cmd.args(&args)
            .current_dir(&job.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| {
            RenderError::SpawnFailed(format!("{}: {}", self.config.binary, e))
        })?;

        let started = Instant::now();
        let output = if self.config.timeout_seconds > 0 {
            let timeout = Duration::from_secs(self.config.timeout_seconds);
            match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    error!(
                        "Renderer exceeded {}s, killing process",
                        self.config.timeout_seconds
                    );
                    return Err(RenderError::Timeout(self.config.timeout_seconds));
                }
            }
        } else {
            child.wait_with_output().await?
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            info!("Renderer completed successfully in {}ms", duration_ms);
            Ok(RenderOutcome::Success {
                stdout,
                duration_ms,
            })
        } else {
            let exit_code = output.status.code().unwrap_or(-1);
            error!(
                "Renderer failed with exit code {} after {}ms",
                exit_code, duration_ms
            );
            Ok(RenderOutcome::Failure {
                exit_code,
                stderr,
                duration_ms,
            })
        }
    }

    async fn version(&self) -> RenderResult<String> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| RenderError::NotAvailable(format!("{}: {}", self.config.binary, e)))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(RenderError::NotAvailable(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
    }
}
