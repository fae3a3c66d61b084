use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}×{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] dsbrot_core::CoreError),
}
