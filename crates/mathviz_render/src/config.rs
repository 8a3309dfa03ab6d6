//! Renderer configuration types.

use serde::{Deserialize, Serialize};

/// Output quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
    Production,
    #[serde(rename = "4k")]
    FourK,
}

impl Quality {
    /// Value passed to the renderer's `-q` flag.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Low => "l",
            Self::Medium => "m",
            Self::High => "h",
            Self::Production => "p",
            Self::FourK => "k",
        }
    }

    /// Directory the renderer nests videos under for this preset.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Low => "480p15",
            Self::Medium => "720p30",
            Self::High => "1080p60",
            Self::Production => "1440p60",
            Self::FourK => "2160p60",
        }
    }
}

/// Renderer invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Renderer executable
    pub binary: String,
    /// Quality preset
    pub quality: Quality,
    /// Open a preview window after rendering (never in server use)
    pub preview: bool,
    /// Skip the renderer's partial-movie cache
    pub disable_caching: bool,
    /// Timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
    /// Extra arguments appended before the script path
    pub extra_args: Vec<String>,
    /// Extension of produced videos
    pub video_extension: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            binary: "manim".to_string(),
            quality: Quality::High,
            preview: false,
            disable_caching: false,
            timeout_seconds: 600, // 10 minutes
            extra_args: Vec::new(),
            video_extension: "mp4".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn preview(mut self, enabled: bool) -> Self {
        self.preview = enabled;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Apply the `MATHVIZ_RENDERER` override.
    pub fn apply_env(&mut self) {
        if let Ok(binary) = std::env::var("MATHVIZ_RENDERER") {
            if !binary.is_empty() {
                self.binary = binary;
            }
        }
    }
}
