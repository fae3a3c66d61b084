pub mod complex;
pub mod double_single;
pub mod error;
pub mod kernel;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::{ComplexDf, DoubleComplex};
pub use double_single::{Df, DoubleDouble, DoubleSingle, Lane, MulPrecision};
pub use error::CoreError;
pub use kernel::{
    Bailout, EscapeKernel, IterationResult, IterationState, KernelOptions, PixelKernel,
};
pub use viewport::{PixelSnap, Resolution, ViewportParams, STRUCTURAL_ITERATION_CAP};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
