//! # mathviz_render
//!
//! Animation renderer wrapper for mathviz.
//!
//! Rendering turns a scene source file into a video by invoking an external
//! command-line renderer. This crate hides the process plumbing behind the
//! [`Renderer`] trait.
//!
//! # Features
//!
//! - **Subprocess Renderer**: [`ManimCli`] runs the renderer headless with
//!   configurable quality, captures both streams and enforces a timeout
//! - **Typed Outcomes**: a non-zero exit is a [`RenderOutcome::Failure`], not an error
//! - **Mock Renderer**: scripted outcomes and fake artifacts for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use mathviz_render::{ManimCli, RenderConfig, RenderJob, Renderer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let renderer = ManimCli::new(RenderConfig::default());
//!     let job = RenderJob::new("/tmp/run", "scene.py").scene("MotionDemo");
//!
//!     let outcome = renderer.render(&job).await?;
//!     println!("Rendered: {}", outcome.is_success());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod mock;
pub mod renderer;

pub use cli::ManimCli;
pub use config::{Quality, RenderConfig};
pub use error::{RenderError, RenderResult};
pub use mock::{CapturedRender, MockRenderResponse, MockRenderer};
pub use renderer::{media_videos_dir, RenderJob, RenderOutcome, Renderer};
