//! Renderer trait and types.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RenderResult;

/// One render request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJob {
    /// Directory the renderer runs in; its media tree is created here
    pub working_dir: PathBuf,
    /// Scene source file, relative to `working_dir` or absolute
    pub script: PathBuf,
    /// Scene to render; all scenes in the file when unset
    pub scene: Option<String>,
}

impl RenderJob {
    pub fn new(working_dir: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            script: script.into(),
            scene: None,
        }
    }

    pub fn scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    /// Absolute (or working-dir joined) path of the script.
    pub fn script_path(&self) -> PathBuf {
        self.working_dir.join(&self.script)
    }

    /// Root of the tree the renderer writes videos for this script into
    /// (`media/videos/<script-stem>`).
    pub fn video_root(&self) -> PathBuf {
        let stem = self
            .script
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        media_videos_dir(&self.working_dir).join(stem)
    }
}

/// `media/videos` directory under a renderer working directory.
pub fn media_videos_dir(working_dir: &Path) -> PathBuf {
    working_dir.join("media").join("videos")
}

/// Result of a completed renderer process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RenderOutcome {
    /// Exit code zero
    Success { stdout: String, duration_ms: u64 },
    /// Non-zero exit (or killed by a signal, reported as -1)
    Failure {
        exit_code: i32,
        stderr: String,
        duration_ms: u64,
    },
}

impl RenderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Success { duration_ms, .. } | Self::Failure { duration_ms, .. } => *duration_ms,
        }
    }

    /// Captured stderr for failures, empty otherwise.
    pub fn stderr(&self) -> &str {
        match self {
            Self::Success { .. } => "",
            Self::Failure { stderr, .. } => stderr,
        }
    }
}

/// An external scene renderer.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render the job to completion.
    ///
    /// A non-zero exit is returned as `Ok(RenderOutcome::Failure)`; `Err` is
    /// reserved for failures to run the renderer at all.
    async fn render(&self, job: &RenderJob) -> RenderResult<RenderOutcome>;

    /// Version string of the renderer.
    async fn version(&self) -> RenderResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_root() {
        let job = RenderJob::new("/runs/abc", "scene.py").scene("MotionDemo");
        assert_eq!(job.video_root(), PathBuf::from("/runs/abc/media/videos/scene"));
        assert_eq!(job.script_path(), PathBuf::from("/runs/abc/scene.py"));
        assert_eq!(job.scene.as_deref(), Some("MotionDemo"));
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = RenderOutcome::Success {
            stdout: "done".into(),
            duration_ms: 5,
        };
        let failed = RenderOutcome::Failure {
            exit_code: 1,
            stderr: "LaTeX Error".into(),
            duration_ms: 7,
        };

        assert!(ok.is_success());
        assert_eq!(ok.stderr(), "");
        assert!(!failed.is_success());
        assert_eq!(failed.stderr(), "LaTeX Error");
        assert_eq!(failed.duration_ms(), 7);
    }
}
