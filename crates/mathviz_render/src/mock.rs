//! Mock renderer for testing.
//!
//! Returns predefined outcomes and, for successful responses that name an
//! artifact, writes a placeholder video where the real renderer would.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::Quality;
use crate::error::{RenderError, RenderResult};
use crate::renderer::{RenderJob, RenderOutcome, Renderer};

/// Predefined outcome for one render call.
#[derive(Debug, Clone)]
pub struct MockRenderResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// File name written under `<video_root>/<quality dir>/` on success
    pub artifact: Option<String>,
    /// Bytes written to the artifact
    pub contents: Vec<u8>,
    pub duration_ms: u64,
}

impl MockRenderResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            artifact: None,
            contents: b"mock video".to_vec(),
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            artifact: None,
            contents: b"mock video".to_vec(),
            duration_ms: 100,
        }
    }

    /// Write `file_name` into the media tree when this response is used.
    pub fn with_artifact(mut self, file_name: impl Into<String>) -> Self {
        self.artifact = Some(file_name.into());
        self
    }

    /// Replace the placeholder bytes written to the artifact.
    pub fn with_contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.contents = contents.into();
        self
    }
}

/// Captured render call for verification.
#[derive(Debug, Clone)]
pub struct CapturedRender {
    pub job: RenderJob,
    /// Script contents at the moment of the call
    pub script_contents: Option<String>,
}

/// Mock renderer for testing.
#[derive(Clone)]
pub struct MockRenderer {
    responses: Arc<RwLock<Vec<MockRenderResponse>>>,
    response_index: Arc<AtomicUsize>,
    captured: Arc<RwLock<Vec<CapturedRender>>>,
    quality: Quality,
    simulate_error: Arc<RwLock<Option<String>>>,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured: Arc::new(RwLock::new(Vec::new())),
            quality: Quality::Low,
            simulate_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a response for the next render call.
    pub fn add_response(self, response: MockRenderResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Replace all responses.
    pub fn with_responses(self, responses: Vec<MockRenderResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Quality directory artifacts are written under (default `480p15`).
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// Make every call fail to spawn.
    pub fn simulate_error(self, message: impl Into<String>) -> Self {
        *self.simulate_error.write() = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<CapturedRender> {
        self.captured.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }

    /// Responses cycle once exhausted; an empty list always succeeds.
    fn next_response(&self) -> MockRenderResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockRenderResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockRenderResponse::success(""))
    }

    fn artifact_path(&self, job: &RenderJob, file_name: &str) -> PathBuf {
        job.video_root().join(self.quality.dir_name()).join(file_name)
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn render(&self, job: &RenderJob) -> RenderResult<RenderOutcome> {
        let script_contents = std::fs::read_to_string(job.script_path()).ok();
        self.captured.write().push(CapturedRender {
            job: job.clone(),
            script_contents,
        });

        if let Some(msg) = self.simulate_error.read().clone() {
            return Err(RenderError::SpawnFailed(msg));
        }

        let response = self.next_response();

        if response.exit_code != 0 {
            return Ok(RenderOutcome::Failure {
                exit_code: response.exit_code,
                stderr: response.stderr,
                duration_ms: response.duration_ms,
            });
        }

        if let Some(file_name) = &response.artifact {
            let path = self.artifact_path(job, file_name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &response.contents)?;
        }

        Ok(RenderOutcome::Success {
            stdout: response.stdout,
            duration_ms: response.duration_ms,
        })
    }

    async fn version(&self) -> RenderResult<String> {
        Ok("mock-renderer 1.0.0".to_string())
    }
}
