use std::ops::{Add, Neg};

use serde::{Deserialize, Serialize};

use crate::double_single::{Df, Lane, MulPrecision};

/// A complex number with [`Df`] components.
///
/// Used for the iterate `z` and the per-pixel constant `c` of the
/// escape-time kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexDf<L> {
    pub re: Df<L>,
    pub im: Df<L>,
}

/// A complex number with double-single components.
pub type DoubleComplex = ComplexDf<f32>;

impl<L: Lane> ComplexDf<L> {
    pub const ZERO: Self = Self {
        re: Df::ZERO,
        im: Df::ZERO,
    };

    #[inline]
    pub fn new(re: Df<L>, im: Df<L>) -> Self {
        Self { re, im }
    }

    /// Split an `f64` pair into extended-precision components.
    #[inline]
    pub fn split(re: f64, im: f64) -> Self {
        Self {
            re: Df::split(re),
            im: Df::split(im),
        }
    }

    /// `z²` in the shape the kernel uses: `re² − im²` and `2·(im·re)`.
    ///
    /// The doubling is done as a product by `2 + 0` so both parts go through
    /// the same multiply.
    #[inline]
    pub fn square_with(self, precision: MulPrecision) -> Self {
        let re2 = self.re.mul_with(self.re, precision);
        let im2 = self.im.mul_with(self.im, precision);
        let cross = self.im.mul_with(self.re, precision);
        Self {
            re: re2 + (-im2),
            im: Df::from_lane(L::TWO).mul_with(cross, precision),
        }
    }

    /// `re² + im²` from the leading lanes only.
    #[inline]
    pub fn hi_norm_sq(self) -> L {
        self.re.hi * self.re.hi + self.im.hi * self.im.hi
    }

    /// `max(|re|, |im|)` from the leading lanes only.
    #[inline]
    pub fn max_abs_hi(self) -> L {
        let re = self.re.hi.abs();
        let im = self.im.hi.abs();
        if re >= im {
            re
        } else {
            im
        }
    }

    #[inline]
    pub fn to_f64(self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }
}

impl<L: Lane> Add for ComplexDf<L> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl<L: Lane> Neg for ComplexDf<L> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl<L: Lane> std::fmt::Display for ComplexDf<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {}·i", self.re, self.im)
    }
}
