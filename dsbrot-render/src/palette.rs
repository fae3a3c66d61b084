use std::f64::consts::TAU;

use dsbrot_core::IterationResult;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::buffer::RenderBuffer;
use crate::iteration_buffer::IterationBuffer;

/// A color with float channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    /// An opaque color.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v)
    }

    /// Quantise to 8 bits per channel. NaN maps to 0.
    pub fn to_u8(self) -> [u8; 4] {
        [
            quantise(self.r),
            quantise(self.g),
            quantise(self.b),
            quantise(self.a),
        ]
    }
}

#[inline]
fn quantise(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Shape of the per-channel cosine ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosineForm {
    /// `0.5 − 0.5·cos(x)`: full range, starts at black.
    #[default]
    HalfCosine,
    /// `1 − cos(x)` clamped to `[0, 1]`: brighter, saturates for half of
    /// each period.
    Complement,
}

/// Periodic palette over the smoothed escape count.
///
/// Each channel runs `cos(x·f)` with its own frequency `f`, where
/// `x = frac / max_iterations · 2π`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosinePalette {
    /// Red, green, blue frequencies.
    pub frequencies: [f64; 3],
    pub form: CosineForm,
}

impl Default for CosinePalette {
    fn default() -> Self {
        Self {
            frequencies: [5.8, 5.5, 5.2],
            form: CosineForm::HalfCosine,
        }
    }
}

impl CosinePalette {
    /// Color for a smoothed escape count `frac` under bound `max_iterations`.
    pub fn sample(&self, frac: f64, max_iterations: f64) -> Rgba {
        let x = frac / max_iterations * TAU;
        let [fr, fg, fb] = self.frequencies;
        Rgba::new(
            self.channel(x * fr),
            self.channel(x * fg),
            self.channel(x * fb),
        )
    }

    #[inline]
    fn channel(&self, phase: f64) -> f32 {
        let v = match self.form {
            CosineForm::HalfCosine => 0.5 - 0.5 * phase.cos(),
            CosineForm::Complement => (1.0 - phase.cos()).clamp(0.0, 1.0),
        };
        v as f32
    }
}

/// How iteration results become pixel colors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Grayscale `iterations / max_iterations`; interior pixels come out
    /// near white.
    Discrete,
    /// Fractional escape count through a cosine palette; interior is black.
    Smooth(CosinePalette),
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self::Smooth(CosinePalette::default())
    }
}

impl ColorPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Discrete => "discrete",
            Self::Smooth(_) => "smooth",
        }
    }

    /// Color a single result. `max_iterations` is the bound the kernel
    /// actually iterated to, see [`IterationBuffer::color_bound`].
    pub fn color(&self, result: IterationResult, max_iterations: f32) -> Rgba {
        let max = max_iterations as f64;
        if !(max > 0.0) {
            return Rgba::BLACK;
        }
        match self {
            Self::Discrete => {
                let v = (result.iterations() as f64 / max).clamp(0.0, 1.0);
                Rgba::gray(v as f32)
            }
            Self::Smooth(palette) => match result {
                IterationResult::Interior { .. } => Rgba::BLACK,
                IterationResult::Escaped {
                    iterations,
                    norm_sq,
                } => palette.sample(smooth_iteration(iterations, norm_sq), max),
            },
        }
    }

    /// Color a whole iteration buffer.
    pub fn colorize(&self, iter_buf: &IterationBuffer) -> RenderBuffer {
        let bound = iter_buf.color_bound();
        let mut image = RenderBuffer::new(iter_buf.width, iter_buf.height);
        image
            .pixels
            .par_chunks_mut(4)
            .zip(iter_buf.data.par_iter())
            .for_each(|(pixel, &result)| {
                pixel.copy_from_slice(&self.color(result, bound).to_u8());
            });
        image
    }
}

/// Fractional escape count `n − log₂(ln |z|²)`.
///
/// `n` is 1-based (the step that escaped counts), which puts the palette
/// phase one iteration ahead of a counter bumped after the escape test.
///
/// Falls back to the integer count when `|z|²` overflowed or is otherwise
/// unusable.
pub fn smooth_iteration(iterations: u32, norm_sq: f64) -> f64 {
    let n = iterations as f64;
    if !(norm_sq > 1.0) || !norm_sq.is_finite() {
        return n;
    }
    let frac = n - norm_sq.ln().log2();
    if frac.is_finite() {
        frac
    } else {
        n
    }
}
