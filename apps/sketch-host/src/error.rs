use thiserror::Error;

use sketch_core::SceneError;
use sketch_io::{ConfigError, LoadError};
use sketch_renderer::RenderError;

/// Errors surfaced by the scene manager and the CLI.
#[derive(Error, Debug)]
pub enum SketchError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("resource load failed: {0}")]
    Load(#[from] LoadError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid scene script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene was closed before the load finished")]
    SceneClosed,

    #[error("scene state lock poisoned")]
    StatePoisoned,

    #[error("no async runtime available to run the load")]
    NoRuntime,

    #[error("load task failed: {0}")]
    TaskFailed(String),
}

impl SketchError {
    /// True for the synchronous missing-image rejection of `add_product`.
    pub fn is_invalid_descriptor(&self) -> bool {
        matches!(self, SketchError::Scene(SceneError::InvalidDescriptor { .. }))
    }
}
