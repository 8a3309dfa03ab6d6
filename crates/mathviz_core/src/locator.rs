//! Scene-class resolution and artifact relocation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};

fn scene_declaration() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Match `class Name(Scene):`
    PATTERN.get_or_init(|| {
        Regex::new(r"class\s+(\w+)\s*\(\s*Scene\s*\)\s*:").expect("scene declaration regex")
    })
}

/// All classes declared as direct `Scene` subclasses, in source order.
pub fn scene_classes(code: &str) -> Vec<String> {
    scene_declaration()
        .captures_iter(code)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Pick the scene to render.
///
/// A declared name wins when the code really declares it; otherwise the first
/// declaration in the code is used.
pub fn resolve_scene_class(code: &str, declared: Option<&str>) -> PipelineResult<String> {
    let classes = scene_classes(code);

    if let Some(declared) = declared {
        if classes.iter().any(|c| c == declared) {
            return Ok(declared.to_string());
        }
        warn!(
            "Declared scene '{}' is not a Scene subclass in the code, falling back to declarations",
            declared
        );
    }

    classes
        .into_iter()
        .next()
        .ok_or(PipelineError::NoSceneClassFound)
}

/// Finds rendered videos and moves them into the flat output directory.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    output_dir: PathBuf,
    extension: String,
}

impl ArtifactLocator {
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<scene>.<ext>`
    pub fn file_name(&self, scene_class: &str) -> String {
        format!("{}.{}", scene_class, self.extension)
    }

    /// Extract the scene class from `code`, find its video under
    /// `search_root` and move it into the output directory.
    pub fn locate(&self, code: &str, search_root: &Path) -> PipelineResult<PathBuf> {
        let scene_class = resolve_scene_class(code, None)?;
        self.collect(&scene_class, search_root)
    }

    /// Find and relocate the video of an already resolved scene.
    pub fn collect(&self, scene_class: &str, search_root: &Path) -> PipelineResult<PathBuf> {
        let source = self.find(scene_class, search_root)?;
        self.relocate(&source, scene_class)
    }

    /// First file under `search_root` named `<scene>.<ext>`.
    pub fn find(&self, scene_class: &str, search_root: &Path) -> PipelineResult<PathBuf> {
        let wanted = self.file_name(scene_class);
        debug!("Searching {:?} for {}", search_root, wanted);

        WalkDir::new(search_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_file() && e.file_name().to_string_lossy() == wanted)
            .map(|e| e.into_path())
            .ok_or_else(|| PipelineError::ArtifactNotFound {
                scene_class: scene_class.to_string(),
                search_root: search_root.to_path_buf(),
            })
    }

    /// Move `source` to `<output_dir>/<scene>.<ext>`, replacing an existing file.
    pub fn relocate(&self, source: &Path, scene_class: &str) -> PipelineResult<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let target = self.output_dir.join(self.file_name(scene_class));

        if fs::rename(source, &target).is_err() {
            // Rename fails across filesystems; copy and remove instead.
            let mut options = fs_extra::file::CopyOptions::new();
            options.overwrite = true;
            fs_extra::file::move_file(source, &target, &options).map_err(|e| {
                PipelineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;
        }

        info!("Video file moved to {:?}", target);
        Ok(target)
    }
}
