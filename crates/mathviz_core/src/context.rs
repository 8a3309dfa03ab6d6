//! Per-invocation working context.
//!
//! Every pipeline run owns a directory under the runs root, named by its
//! invocation id. Scripts, diagnostic dumps, uploads and the renderer's
//! media tree all live there, so concurrent runs never share a path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::PipelineResult;

/// File name of the generated scene script inside a run directory.
pub const SCRIPT_FILE: &str = "scene.py";
/// Dump of the raw generation response.
pub const GENERATION_LOG_FILE: &str = "generation_response.json";
/// Dump of the raw structured-parse response.
pub const PARSE_LOG_FILE: &str = "parse_response.json";
/// Plain-text visualization description.
pub const DESCRIPTION_FILE: &str = "description.txt";

/// Working context of one pipeline invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Unique invocation id
    pub id: Uuid,
    /// When the invocation started
    pub started_at: DateTime<Utc>,
    /// Private directory of this invocation
    pub run_dir: PathBuf,
    /// Flat directory final videos are moved into
    pub output_dir: PathBuf,
}

impl InvocationContext {
    /// Create a context and its directories.
    pub fn create(runs_root: &Path, output_dir: &Path) -> PipelineResult<Self> {
        let id = Uuid::new_v4();
        let run_dir = runs_root.join(id.to_string());
        fs::create_dir_all(&run_dir)?;
        fs::create_dir_all(output_dir)?;
        debug!("Created run directory {:?}", run_dir);

        Ok(Self {
            id,
            started_at: Utc::now(),
            run_dir,
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn script_path(&self) -> PathBuf {
        self.run_dir.join(SCRIPT_FILE)
    }

    pub fn generation_log_path(&self) -> PathBuf {
        self.run_dir.join(GENERATION_LOG_FILE)
    }

    pub fn parse_log_path(&self) -> PathBuf {
        self.run_dir.join(PARSE_LOG_FILE)
    }

    pub fn description_path(&self) -> PathBuf {
        self.run_dir.join(DESCRIPTION_FILE)
    }

    /// Path for an uploaded file, keeping only the final path component.
    pub fn upload_path(&self, file_name: &str) -> PathBuf {
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "image".to_string());
        self.run_dir.join(format!("upload_{}", name))
    }

    /// Write a pretty-printed JSON dump.
    pub fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> PipelineResult<()> {
        let content = serde_json::to_string_pretty(value)?;
        fs::write(path, content)?;
        debug!("Wrote {:?}", path);
        Ok(())
    }

    /// Remove the run directory and everything in it.
    pub fn cleanup(&self) -> PipelineResult<()> {
        if self.run_dir.exists() {
            fs::remove_dir_all(&self.run_dir)?;
        }
        Ok(())
    }
}
