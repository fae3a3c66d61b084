use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A hardware floating-point type used as one lane of a [`Df`] pair.
///
/// Implemented for `f32` (double-single, the GPU-faithful layout) and `f64`
/// (double-double). The lane carries the Dekker splitter for its mantissa
/// width so [`two_prod`] can split factors without FMA.
pub trait Lane:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::LowerExp
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;
    const TWO: Self;

    /// `2^s + 1` with `s = ceil(p / 2)` for a `p`-bit significand.
    const SPLITTER: Self;

    /// Short name used in logs and exported metadata.
    const NAME: &'static str;

    /// Round an `f64` to the nearest lane value.
    fn from_f64(v: f64) -> Self;

    fn to_f64(self) -> f64;

    fn abs(self) -> Self;

    fn is_finite(self) -> bool;
}

impl Lane for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const TWO: Self = 2.0;
    const SPLITTER: Self = 4097.0;
    const NAME: &'static str = "double-single";

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn abs(self) -> Self {
        f32::abs(self)
    }

    #[inline]
    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }
}

impl Lane for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
    const TWO: Self = 2.0;
    const SPLITTER: Self = 134_217_729.0;
    const NAME: &'static str = "double-double";

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }

    #[inline]
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

/// Which product algorithm [`Df::mul_with`] uses.
///
/// The two forms drift apart after a few hundred iterations of `z² + c`, so
/// the choice is part of the kernel configuration rather than an internal
/// detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MulPrecision {
    /// `hi·hi` plus the two cross terms, renormalised. No error recovery on
    /// the leading product and no `lo·lo` term.
    Fast,
    /// Dekker-split `two_prod` of the leading terms plus both cross terms.
    #[default]
    Exact,
}

impl MulPrecision {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Exact => "exact",
        }
    }
}

/// An extended-precision number stored as the unevaluated sum `hi + lo` of
/// two lanes, with `|lo| ≤ ulp(hi) / 2`.
///
/// With `f32` lanes this is the double-single layout used by fragment shaders
/// (about 48 significant bits). With `f64` lanes it is double-double (about
/// 106 bits).
///
/// Reference: Thall, "Extended-Precision Floating-Point Numbers for GPU
/// Computation" (2006).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Df<L> {
    pub hi: L,
    pub lo: L,
}

/// Two `f32` lanes.
pub type DoubleSingle = Df<f32>;

/// Two `f64` lanes.
pub type DoubleDouble = Df<f64>;

// ---------------------------------------------------------------------------
// Error-free building blocks
// ---------------------------------------------------------------------------

/// Knuth's TwoSum: `(s, e)` with `s + e = a + b` exactly, for any ordering
/// of the operands.
#[inline]
pub fn two_sum<L: Lane>(a: L, b: L) -> (L, L) {
    let s = a + b;
    let v = s - a;
    let e = (a - (s - v)) + (b - v);
    (s, e)
}

/// TwoSum for `|a| >= |b|`. The ordering is not checked; when it does not
/// hold `e` is no longer the exact rounding error.
#[inline]
pub fn quick_two_sum<L: Lane>(a: L, b: L) -> (L, L) {
    let s = a + b;
    let e = b - (s - a);
    (s, e)
}

/// Dekker split of one lane into two half-width pieces with `hi + lo = a`.
#[inline]
pub fn split_lane<L: Lane>(a: L) -> (L, L) {
    let t = L::SPLITTER * a;
    let hi = t - (t - a);
    let lo = a - hi;
    (hi, lo)
}

/// Dekker TwoProd: `(p, e)` with `p + e = a * b` exactly, built from four
/// partial products of the split factors.
#[inline]
pub fn two_prod<L: Lane>(a: L, b: L) -> (L, L) {
    let p = a * b;
    let (a_hi, a_lo) = split_lane(a);
    let (b_hi, b_lo) = split_lane(b);
    let e = ((a_hi * b_hi - p) + a_hi * b_lo + a_lo * b_hi) + a_lo * b_lo;
    (p, e)
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl<L: Lane> Df<L> {
    pub const ZERO: Self = Self {
        hi: L::ZERO,
        lo: L::ZERO,
    };

    pub const ONE: Self = Self {
        hi: L::ONE,
        lo: L::ZERO,
    };

    #[inline]
    pub fn new(hi: L, lo: L) -> Self {
        Self { hi, lo }
    }

    /// A single lane value with a zero tail.
    #[inline]
    pub fn from_lane(v: L) -> Self {
        Self { hi: v, lo: L::ZERO }
    }

    /// Split an `f64` into the nearest lane value and the lane-rounded
    /// remainder.
    #[inline]
    pub fn split(v: f64) -> Self {
        let hi = L::from_f64(v);
        let lo = L::from_f64(v - hi.to_f64());
        Self { hi, lo }
    }

    /// The combined value widened to `f64`.
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.hi.to_f64() + self.lo.to_f64()
    }

    #[inline]
    pub fn abs(self) -> Self {
        if self.is_negative() {
            -self
        } else {
            self
        }
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.hi < L::ZERO || (self.hi == L::ZERO && self.lo < L::ZERO)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.hi.is_finite() && self.lo.is_finite()
    }

    /// Multiply with an explicit product algorithm.
    #[inline]
    pub fn mul_with(self, rhs: Self, precision: MulPrecision) -> Self {
        match precision {
            MulPrecision::Fast => {
                let hi = self.hi * rhs.hi;
                let lo = self.hi * rhs.lo + self.lo * rhs.hi;
                let (hi, lo) = quick_two_sum(hi, lo);
                Self { hi, lo }
            }
            MulPrecision::Exact => {
                let (p, e) = two_prod(self.hi, rhs.hi);
                let e = e + self.hi * rhs.lo + self.lo * rhs.hi;
                let (hi, lo) = quick_two_sum(p, e);
                Self { hi, lo }
            }
        }
    }
}

impl<L: Lane> From<L> for Df<L> {
    #[inline]
    fn from(v: L) -> Self {
        Self::from_lane(v)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic: Df + Df
// ---------------------------------------------------------------------------

impl<L: Lane> Add for Df<L> {
    type Output = Self;

    /// Component-wise TwoSum, then two renormalisation passes folding the
    /// low-part errors back in.
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let (s1, s2) = two_sum(self.hi, rhs.hi);
        let (t1, t2) = two_sum(self.lo, rhs.lo);
        let s2 = s2 + t1;
        let (s1, s2) = quick_two_sum(s1, s2);
        let s2 = s2 + t2;
        let (hi, lo) = quick_two_sum(s1, s2);
        Self { hi, lo }
    }
}

impl<L: Lane> AddAssign for Df<L> {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<L: Lane> Sub for Df<L> {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl<L: Lane> SubAssign for Df<L> {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

// ---------------------------------------------------------------------------
// Arithmetic: products
// ---------------------------------------------------------------------------

impl<L: Lane> Mul for Df<L> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.mul_with(rhs, MulPrecision::Exact)
    }
}

impl<L: Lane> MulAssign for Df<L> {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

/// Scalar multiplication by a single lane value.
impl<L: Lane> Mul<L> for Df<L> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: L) -> Self {
        let (p, e) = two_prod(self.hi, rhs);
        let e = e + self.lo * rhs;
        let (hi, lo) = quick_two_sum(p, e);
        Self { hi, lo }
    }
}

impl<L: Lane> Neg for Df<L> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

impl<L: Lane> PartialOrd for Df<L> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.hi.partial_cmp(&other.hi) {
            Some(Ordering::Equal) => self.lo.partial_cmp(&other.lo),
            ord => ord,
        }
    }
}

impl<L: Lane> fmt::Display for Df<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:+e} + {:+e})", self.hi, self.lo)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn ds(v: f64) -> DoubleSingle {
        DoubleSingle::split(v)
    }

    fn dd(v: f64) -> DoubleDouble {
        DoubleDouble::split(v)
    }

    // -- Split --

    #[test]
    fn split_hi_is_nearest_single() {
        for &v in &[
            std::f64::consts::PI,
            1.0 / 3.0,
            0.1,
            -123_456.789_012_345,
            1e-10,
            -0.743_643_887_037_151,
        ] {
            let s = ds(v);
            assert_eq!(s.hi, v as f32, "hi must be the nearest f32 to {v}");
            // Two 24-bit lanes hold 48 of the 53 bits of an f64.
            let err = (v - s.to_f64()).abs();
            assert!(
                err <= v.abs() * 2f64.powi(-47),
                "split({v}) lost too much: err = {err:e}"
            );
        }
    }

    #[test]
    fn split_of_single_has_zero_tail() {
        let s = ds(0.5);
        assert_eq!(s.hi, 0.5);
        assert_eq!(s.lo, 0.0);
    }

    #[test]
    fn split_double_double_is_exact() {
        let v = -0.743_643_887_037_151;
        let s = dd(v);
        assert_eq!(s.hi, v);
        assert_eq!(s.lo, 0.0);
        assert_eq!(s.to_f64(), v);
    }

    #[test]
    fn split_lane_recombines_exactly() {
        for &v in &[1.0f32, 3.141_592_7, -7.654_321e-5, 12_345.678] {
            let (hi, lo) = split_lane(v);
            assert_eq!(hi + lo, v);
            // Each piece fits in 12 bits, so their product is exact in f32.
            assert_eq!((hi * hi) as f64, hi as f64 * hi as f64);
        }
    }

    // -- Error-free transforms --

    #[test]
    fn two_sum_recovers_rounding_error() {
        let (s, e) = two_sum(1.0f32, 1e-9);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-9);
        let (s, e) = two_sum(1e-9f32, 1.0);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-9);
    }

    #[test]
    fn quick_two_sum_matches_two_sum_when_ordered() {
        let (s1, e1) = quick_two_sum(1024.0f32, 3.3e-5);
        let (s2, e2) = two_sum(1024.0f32, 3.3e-5);
        assert_eq!((s1, e1), (s2, e2));
    }

    #[test]
    fn two_prod_is_exact() {
        let a = 1.0f32 + f32::EPSILON;
        let (p, e) = two_prod(a, a);
        let exact = a as f64 * a as f64;
        assert_eq!(p as f64 + e as f64, exact);
        assert!(e != 0.0, "the square of 1+eps must not be representable in f32");
    }

    // -- Addition --

    #[test]
    fn addition_simple() {
        let c = ds(1.0) + ds(2.0);
        assert_eq!(c.to_f64(), 3.0);
    }

    #[test]
    fn subtraction_simple() {
        let c = ds(5.0) - ds(3.0);
        assert_eq!(c.to_f64(), 2.0);
    }

    #[test]
    fn add_assign_and_sub_assign() {
        let mut a = ds(1.0);
        a += ds(2.0);
        a -= ds(0.5);
        assert_eq!(a.to_f64(), 2.5);
    }

    #[test]
    fn precision_add_small_to_large() {
        // In f32: 1.0 + 1e-9 == 1.0. The pair keeps the tail.
        let sum = ds(1.0) + ds(1e-9);
        assert_eq!(sum.hi, 1.0);
        let recovered = (sum - ds(1.0)).to_f64();
        assert!(
            (recovered - 1e-9).abs() < 1e-15,
            "tail should survive: got {recovered:e}"
        );
    }

    #[test]
    fn add_is_commutative() {
        let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
        for _ in 0..1000 {
            let a = ds(rng.random_range(-10.0..10.0));
            let b = ds(rng.random_range(-10.0..10.0));
            let ab = (a + b).to_f64();
            let ba = (b + a).to_f64();
            assert!(
                (ab - ba).abs() <= 1e-29 * ab.abs().max(1.0),
                "a+b = {ab:e}, b+a = {ba:e}"
            );
        }
    }

    #[test]
    fn add_is_approximately_associative() {
        let mut rng = StdRng::seed_from_u64(0xD1B5_4A32_D192_ED03);
        for _ in 0..1000 {
            let (x, y, z): (f64, f64, f64) = (
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            );
            let scale = x.abs() + y.abs() + z.abs();

            let (a, b, c) = (ds(x), ds(y), ds(z));
            let lhs = ((a + b) + c).to_f64();
            let rhs = (a + (b + c)).to_f64();
            assert!(
                (lhs - rhs).abs() <= scale * 2f64.powi(-44),
                "double-single: {lhs:e} vs {rhs:e}"
            );

            let (a, b, c) = (dd(x), dd(y), dd(z));
            let lhs = (a + b) + c;
            let rhs = a + (b + c);
            let diff = (lhs - rhs).abs().to_f64();
            assert!(diff <= scale * 1e-29, "double-double: diff = {diff:e}");
        }
    }

    #[test]
    fn add_zero() {
        let a = ds(42.0);
        assert_eq!(a + DoubleSingle::ZERO, a);
    }

    // -- Multiplication --

    #[test]
    fn multiplication_simple() {
        assert_eq!((ds(3.0) * ds(4.0)).to_f64(), 12.0);
        assert_eq!(ds(3.0).mul_with(ds(4.0), MulPrecision::Fast).to_f64(), 12.0);
    }

    #[test]
    fn scalar_multiplication() {
        assert_eq!((ds(2.5) * 4.0f32).to_f64(), 10.0);
    }

    #[test]
    fn mul_assign() {
        let mut a = ds(3.0);
        a *= ds(4.0);
        assert_eq!(a.to_f64(), 12.0);
    }

    #[test]
    fn mul_one_is_identity() {
        let mut rng = StdRng::seed_from_u64(0x2545_F491_4F6C_DD1D);
        for _ in 0..200 {
            let a = ds(rng.random_range(-10.0..10.0));
            for precision in [MulPrecision::Fast, MulPrecision::Exact] {
                let p = a.mul_with(DoubleSingle::ONE, precision);
                let diff = (p - a).to_f64().abs();
                assert!(
                    diff <= a.to_f64().abs() * 2f64.powi(-46),
                    "{precision:?}: {p} vs {a}"
                );
            }
        }
    }

    #[test]
    fn mul_zero() {
        let b = ds(42.0) * DoubleSingle::ZERO;
        assert_eq!(b.to_f64(), 0.0);
    }

    #[test]
    fn exact_product_keeps_the_tail_fast_drops_it() {
        // (1 + 2^-20)² = 1 + 2^-19 + 2^-40. The 2^-40 term does not fit in
        // one f32 next to 1.0.
        let a = DoubleSingle::from_lane(1.0 + 2f32.powi(-20));

        let exact = a.mul_with(a, MulPrecision::Exact);
        assert_eq!(exact.hi, 1.0 + 2f32.powi(-19));
        assert_eq!(exact.lo, 2f32.powi(-40));

        let fast = a.mul_with(a, MulPrecision::Fast);
        assert_eq!(fast.hi, 1.0 + 2f32.powi(-19));
        assert_eq!(fast.lo, 0.0);
    }

    #[test]
    fn double_double_product_precision() {
        // (1 + 1e-16)² should keep the 1e-32 term.
        let a = DoubleDouble::new(1.0, 1e-16);
        let sq = a * a;
        let expected = DoubleDouble::new(1.0, 2e-16) + dd(1e-32);
        let diff = (sq - expected).abs().to_f64();
        assert!(diff < 1e-31, "got {sq}, expected {expected}");
    }

    #[test]
    fn distributive_property() {
        let (a, b, c) = (ds(3.7), ds(2.1), ds(4.3));
        let lhs = (a * (b + c)).to_f64();
        let rhs = (a * b + a * c).to_f64();
        assert!((lhs - rhs).abs() < 1e-12, "{lhs} vs {rhs}");
    }

    // -- Sign, ordering --

    #[test]
    fn negation() {
        let b = -ds(7.0);
        assert_eq!(b.hi, -7.0);
        assert_eq!(b.lo, 0.0);
    }

    #[test]
    fn abs_and_sign() {
        assert!(ds(-3.0).is_negative());
        assert!(!DoubleSingle::ZERO.is_negative());
        assert_eq!(ds(-3.0).abs(), ds(3.0));
        assert!(DoubleSingle::new(0.0, -1e-20).is_negative());
    }

    #[test]
    fn ordering_uses_tail_on_ties() {
        assert!(ds(2.0) > ds(1.0));
        assert!(DoubleSingle::new(1.0, 1e-9) > DoubleSingle::new(1.0, 0.0));
    }

    #[test]
    fn non_finite_is_reported() {
        assert!(!DoubleSingle::new(f32::NAN, 0.0).is_finite());
        assert!(!(ds(3e38) * ds(10.0)).is_finite());
        assert!(ds(1.0).is_finite());
    }

    #[test]
    fn serde_round_trip_keeps_both_lanes() {
        let a = ds(-0.743_643_887_037_151);
        let json = serde_json::to_string(&a).unwrap();
        let back: DoubleSingle = serde_json::from_str(&json).unwrap();
        assert_eq!(a, back);
    }
}
