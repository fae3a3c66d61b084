use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::complex::ComplexDf;
use crate::double_single::{Lane, MulPrecision};
use crate::viewport::{PixelSnap, ViewportParams, STRUCTURAL_ITERATION_CAP};

/// Bailout test applied after every iteration.
///
/// The two regions differ: `Square` also lets points with `|z|` up to
/// `2√2` keep iterating, which shows up as squarer level sets in the
/// escape-time bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bailout {
    /// `re² + im² ≥ 4`.
    #[default]
    Circle,
    /// `max(|re|, |im|) ≥ 2`.
    Square,
}

impl Bailout {
    /// `true` when `z` is outside the bailout region.
    ///
    /// Compares with `!(… < bound)` so NaN counts as escaped.
    #[inline]
    pub fn escaped<L: Lane>(self, z: &ComplexDf<L>) -> bool {
        match self {
            Self::Circle => !(z.hi_norm_sq().to_f64() < 4.0),
            Self::Square => !(z.max_abs_hi().to_f64() < 2.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
        }
    }
}

/// Kernel variant selection. Every combination is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelOptions {
    pub multiply: MulPrecision,
    pub bailout: Bailout,
    pub snap: PixelSnap,
}

/// The result of iterating a single point.
///
/// Holds raw iteration data only; coloring happens in `dsbrot-render`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationResult {
    /// The orbit left the bailout region on step `iterations` (1-based).
    /// `norm_sq` is `|z|²` from the leading lanes at that step; it may be
    /// infinite or NaN when the arithmetic overflowed.
    Escaped { iterations: u32, norm_sq: f64 },

    /// The orbit stayed bounded for all `iterations` steps of the budget.
    Interior { iterations: u32 },
}

impl IterationResult {
    #[inline]
    pub fn iterations(&self) -> u32 {
        match *self {
            Self::Escaped { iterations, .. } | Self::Interior { iterations } => iterations,
        }
    }

    #[inline]
    pub fn is_escaped(&self) -> bool {
        matches!(self, Self::Escaped { .. })
    }
}

/// Per-pixel loop state: `z`, steps taken, and whether `z` has escaped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationState<L> {
    pub z: ComplexDf<L>,
    pub iter: u32,
    pub escaped: bool,
}

impl<L: Lane> IterationState<L> {
    pub fn new() -> Self {
        Self {
            z: ComplexDf::ZERO,
            iter: 0,
            escaped: false,
        }
    }

    /// Apply `z ← z² + c` once and re-test the bailout.
    #[inline]
    pub fn step(&mut self, c: ComplexDf<L>, options: &KernelOptions) {
        self.z = self.z.square_with(options.multiply) + c;
        self.iter += 1;
        self.escaped = options.bailout.escaped(&self.z);
    }
}

impl<L: Lane> Default for IterationState<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything the renderer can evaluate once per fragment.
///
/// Designed for **static dispatch**: the renderer is generic over
/// `K: PixelKernel` so the iteration loop is inlined into the tile loop.
pub trait PixelKernel {
    /// Evaluate the fragment at `(frag_x, frag_y)`, y pointing up.
    fn evaluate(&self, frag_x: f32, frag_y: f32) -> IterationResult;

    /// The configured (unsanitised) iteration bound, used by coloring.
    fn max_iterations(&self) -> f32;

    /// Iterations actually run per pixel.
    fn budget(&self) -> u32;
}

/// Escape-time Mandelbrot kernel: `z₀ = 0`, `z ← z² + c`.
///
/// Holds one frame's parameter snapshot. Evaluating a pixel touches no shared
/// mutable state, so one kernel can be shared by every worker thread.
#[derive(Debug, Clone)]
pub struct EscapeKernel<L> {
    params: ViewportParams<L>,
    options: KernelOptions,
    budget: u32,
}

impl<L: Lane> EscapeKernel<L> {
    pub fn new(params: ViewportParams<L>, options: KernelOptions) -> Self {
        let budget = params.effective_iterations();
        if params.max_iterations > STRUCTURAL_ITERATION_CAP as f32 {
            warn!(
                configured = params.max_iterations,
                cap = STRUCTURAL_ITERATION_CAP,
                "Iteration bound clamped to structural cap"
            );
        }
        Self {
            params,
            options,
            budget,
        }
    }

    pub fn params(&self) -> &ViewportParams<L> {
        &self.params
    }

    pub fn options(&self) -> &KernelOptions {
        &self.options
    }

    /// Iterate the point `c` until it escapes or the budget runs out.
    pub fn iterate(&self, c: ComplexDf<L>) -> IterationResult {
        let mut state = IterationState::new();
        while state.iter < self.budget {
            state.step(c, &self.options);
            if state.escaped {
                return IterationResult::Escaped {
                    iterations: state.iter,
                    norm_sq: state.z.hi_norm_sq().to_f64(),
                };
            }
        }
        IterationResult::Interior {
            iterations: state.iter,
        }
    }

    /// Map a fragment to its point `c` for this frame.
    #[inline]
    pub fn map(&self, frag_x: f32, frag_y: f32) -> ComplexDf<L> {
        self.params
            .map_pixel(frag_x, frag_y, self.options.snap, self.options.multiply)
    }
}

impl<L: Lane> PixelKernel for EscapeKernel<L> {
    #[inline]
    fn evaluate(&self, frag_x: f32, frag_y: f32) -> IterationResult {
        self.iterate(self.map(frag_x, frag_y))
    }

    fn max_iterations(&self) -> f32 {
        self.params.max_iterations
    }

    fn budget(&self) -> u32 {
        self.budget
    }
}
