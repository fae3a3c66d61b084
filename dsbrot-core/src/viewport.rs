use serde::{Deserialize, Serialize};

use crate::complex::ComplexDf;
use crate::double_single::{Df, Lane, MulPrecision};
use crate::error::CoreError;

/// Hard upper bound on iterations per pixel, whatever the configured value.
///
/// Guarantees every pixel terminates even when the host hands over a huge or
/// non-finite iteration count.
pub const STRUCTURAL_ITERATION_CAP: u32 = 8192;

/// Whether the pixel displacement is floored to whole pixels before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelSnap {
    /// `floor(pixel − offset)`: pins sub-pixel jitter of the fragment
    /// position to stable integer displacements.
    #[default]
    Floor,
    /// Use the fractional displacement as is.
    Continuous,
}

impl PixelSnap {
    pub fn label(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Continuous => "continuous",
        }
    }
}

/// Output frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidResolution { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Pixel-space center of the frame, the usual viewport `offset`.
    pub fn center_offset(&self) -> [f32; 2] {
        [self.width as f32 / 2.0, self.height as f32 / 2.0]
    }

    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Read-only per-frame inputs of the kernel.
///
/// Built by the host from its live view state every time the view changes.
/// The kernel only ever sees a copy, so a frame in flight is unaffected by
/// later pans or zooms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportParams<L> {
    /// World units per pixel.
    pub scale: Df<L>,
    /// Pixel-space position that maps to `center`.
    pub offset: [f32; 2],
    /// World-space view center.
    pub center: ComplexDf<L>,
    /// Configured iteration bound. Fractional values are allowed since hosts
    /// adjust it continuously; see [`effective_iterations`](Self::effective_iterations).
    pub max_iterations: f32,
}

impl<L: Lane> ViewportParams<L> {
    pub const DEFAULT_MAX_ITERATIONS: f32 = 256.0;

    pub fn new(scale: Df<L>, offset: [f32; 2], center: ComplexDf<L>, max_iterations: f32) -> Self {
        Self {
            scale,
            offset,
            center,
            max_iterations,
        }
    }

    /// The full set in view: center `-0.5 + 0i`, `2.4` world units across the
    /// shorter side.
    pub fn standard(resolution: Resolution) -> Self {
        Self {
            scale: Df::split(2.4 / resolution.min_side() as f64),
            offset: resolution.center_offset(),
            center: ComplexDf::split(-0.5, 0.0),
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Build a snapshot from host-side `f64` view state, splitting each value
    /// into extended-precision lanes.
    pub fn from_view(
        center_re: f64,
        center_im: f64,
        scale: f64,
        resolution: Resolution,
        max_iterations: f32,
    ) -> crate::Result<Self> {
        if !center_re.is_finite() || !center_im.is_finite() {
            return Err(CoreError::InvalidCenter {
                re: center_re,
                im: center_im,
            });
        }
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidScale(scale));
        }
        Ok(Self {
            scale: Df::split(scale),
            offset: resolution.center_offset(),
            center: ComplexDf::split(center_re, center_im),
            max_iterations,
        })
    }

    /// Return a copy with a different iteration bound.
    pub fn with_max_iterations(self, max_iterations: f32) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    /// The number of iterations the kernel will actually run.
    ///
    /// Non-positive and NaN bounds give `0`; anything at or above
    /// [`STRUCTURAL_ITERATION_CAP`] (including `+∞`) gives the cap. Other
    /// values are floored.
    pub fn effective_iterations(&self) -> u32 {
        let m = self.max_iterations;
        if !(m > 0.0) {
            return 0;
        }
        if m >= STRUCTURAL_ITERATION_CAP as f32 {
            return STRUCTURAL_ITERATION_CAP;
        }
        m.floor() as u32
    }

    /// Map a fragment position to the point `c = center + f·scale`, with
    /// `f = pixel − offset` (floored per `snap`).
    ///
    /// Pure function of its inputs.
    #[inline]
    pub fn map_pixel(
        &self,
        frag_x: f32,
        frag_y: f32,
        snap: PixelSnap,
        precision: MulPrecision,
    ) -> ComplexDf<L> {
        let dx = frag_x - self.offset[0];
        let dy = frag_y - self.offset[1];
        let (dx, dy) = match snap {
            PixelSnap::Floor => (dx.floor(), dy.floor()),
            PixelSnap::Continuous => (dx, dy),
        };
        let fx = Df::from_lane(L::from_f64(dx as f64));
        let fy = Df::from_lane(L::from_f64(dy as f64));
        ComplexDf::new(
            self.center.re + fx.mul_with(self.scale, precision),
            self.center.im + fy.mul_with(self.scale, precision),
        )
    }
}
