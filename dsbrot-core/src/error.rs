use thiserror::Error;

/// Errors from building frame parameters on the host side.
///
/// The per-pixel kernel never fails; these only guard the constructors that
/// turn host state into a frame snapshot.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid resolution: {width}×{height} (both must be > 0)")]
    InvalidResolution { width: u32, height: u32 },

    #[error("invalid scale: {0} (must be positive and finite)")]
    InvalidScale(f64),

    #[error("invalid center: ({re}, {im}) (must be finite)")]
    InvalidCenter { re: f64, im: f64 },
}
