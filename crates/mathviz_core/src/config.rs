//! Application configuration.
//!
//! Loaded from a TOML file with every field defaulted, then overridden from
//! the environment. The API key is only ever read from the environment.

use std::fs;
use std::path::{Path, PathBuf};

use mathviz_llm::LlmConfig;
use mathviz_render::RenderConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::normalize::{default_normalize_table, default_retry_table, Substitution, SubstitutionTable};

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "mathviz.toml";

/// Pipeline filesystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Flat directory final videos are moved into
    pub output_dir: PathBuf,
    /// Root of per-invocation run directories (default `<output_dir>/runs`)
    pub runs_dir: Option<PathBuf>,
    /// Keep run directories (diagnostics, partial media) after an invocation
    pub retain_run_dirs: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output_videos"),
            runs_dir: None,
            retain_run_dirs: true,
        }
    }
}

impl PipelineSettings {
    pub fn runs_root(&self) -> PathBuf {
        self.runs_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("runs"))
    }
}

/// Repair tables for generated code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Applied to every script before the first render
    pub normalize: Vec<Substitution>,
    /// Applied once after a failed first render
    pub retry: Vec<Substitution>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            normalize: default_normalize_table(),
            retry: default_retry_table(),
        }
    }
}

impl RepairConfig {
    /// Compile both tables.
    pub fn compile(&self) -> PipelineResult<(SubstitutionTable, SubstitutionTable)> {
        Ok((
            SubstitutionTable::compile(&self.normalize)?,
            SubstitutionTable::compile(&self.retry)?,
        ))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind: String,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Maximum request body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineSettings,
    pub llm: LlmConfig,
    pub render: RenderConfig,
    pub repair: RepairConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `mathviz.toml` in the current
    /// directory is used when present, defaults otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        debug!("Reading config from {:?}", path);
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("MATHVIZ_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.pipeline.output_dir = PathBuf::from(dir);
            }
        }
        self.llm.apply_env();
        self.render.apply_env();
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> PipelineResult<()> {
        self.repair.compile()?;

        if self.render.binary.trim().is_empty() {
            return Err(PipelineError::Config("render.binary is empty".to_string()));
        }
        if self.render.video_extension.trim().is_empty() {
            return Err(PipelineError::Config(
                "render.video_extension is empty".to_string(),
            ));
        }
        if self.llm.max_attempts == 0 {
            return Err(PipelineError::Config(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
