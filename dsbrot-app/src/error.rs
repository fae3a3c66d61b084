use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the `dsbrot` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read job file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse job file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Core(#[from] dsbrot_core::CoreError),

    #[error(transparent)]
    Render(#[from] dsbrot_render::RenderError),
}

pub type Result<T> = std::result::Result<T, AppError>;
