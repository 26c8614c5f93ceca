use std::fmt::Debug;
use std::ops::{AddAssign, DivAssign, MulAssign};

use ndarray::ScalarOperand;
use num_traits::{Float, FromPrimitive};

/// Floating point type used to compute and store features.
///
/// Geometry (positions, cells, distances) is always computed in `f64`, the
/// symmetry functions are evaluated in `Real` precision, so that a `f32`
/// calculator gives the same values as a `f64` one within single precision.
pub trait Real: Float + FromPrimitive + ScalarOperand + AddAssign + MulAssign + DivAssign
    + Debug + Default + Send + Sync + 'static
{
    /// Convert a `f64` to this type, rounding if needed
    fn from_f64_lossy(value: f64) -> Self;

    /// Convert this value to `f64`
    fn to_f64_lossy(self) -> f64;
}

impl Real for f64 {
    #[inline]
    fn from_f64_lossy(value: f64) -> f64 {
        value
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self
    }
}

impl Real for f32 {
    #[inline]
    fn from_f64_lossy(value: f64) -> f32 {
        value as f32
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self as f64
    }
}
