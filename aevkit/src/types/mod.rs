//! Small fixed-size 3D vector and matrix types used for the geometry of
//! atomic systems. Batched data lives in `ndarray` arrays, these types are
//! for per-atom and per-cell arithmetic.

/// Implement `$Lhs $op $Rhs` for all combinations of by value and by
/// reference operands.
macro_rules! impl_arithmetic {
    ($Lhs:ty, $Rhs:ty, $Op:ident, $op:ident, $Output:ty, $sel:ident, $other:ident, $res:expr) => (
        impl $Op<$Rhs> for $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: $Rhs) -> $Output {
                $res
            }
        }

        impl<'a> $Op<$Rhs> for &'a $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: $Rhs) -> $Output {
                $res
            }
        }

        impl<'a> $Op<&'a $Rhs> for $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: &'a $Rhs) -> $Output {
                $res
            }
        }

        impl<'a, 'b> $Op<&'a $Rhs> for &'b $Lhs {
            type Output = $Output;
            #[inline] fn $op($sel, $other: &'a $Rhs) -> $Output {
                $res
            }
        }
    );
}

/// Implement `$Lhs $op= $Rhs` for by value and by reference right-hand side.
macro_rules! impl_inplace_arithmetic {
    ($Lhs:ty, $Rhs:ty, $Op:ident, $op:ident, $sel:ident, $other:ident, $res:expr) => (
        impl $Op<$Rhs> for $Lhs {
            #[inline] fn $op(&mut $sel, $other: $Rhs) {
                $res
            }
        }

        impl<'a> $Op<&'a $Rhs> for $Lhs {
            #[inline] fn $op(&mut $sel, $other: &'a $Rhs) {
                $res
            }
        }
    )
}

/// Implement `$Lhs $op f64` and `f64 $op $Lhs` (when `commute` is given) for
/// by value and by reference `$Lhs`.
macro_rules! impl_scalar_arithmetic {
    ($Lhs:ty, $Op:ident, $op:ident, $sel:ident, $other:ident, $res:expr) => (
        impl $Op<f64> for $Lhs {
            type Output = $Lhs;
            #[inline] fn $op($sel, $other: f64) -> $Lhs {
                $res
            }
        }

        impl<'a> $Op<f64> for &'a $Lhs {
            type Output = $Lhs;
            #[inline] fn $op($sel, $other: f64) -> $Lhs {
                $res
            }
        }
    );
    ($Lhs:ty, $Op:ident, $op:ident, $sel:ident, $other:ident, $res:expr, commute) => (
        impl_scalar_arithmetic!($Lhs, $Op, $op, $sel, $other, $res);

        impl $Op<$Lhs> for f64 {
            type Output = $Lhs;
            #[inline] fn $op(self, rhs: $Lhs) -> $Lhs {
                $Op::$op(rhs, self)
            }
        }

        impl<'a> $Op<&'a $Lhs> for f64 {
            type Output = $Lhs;
            #[inline] fn $op(self, rhs: &'a $Lhs) -> $Lhs {
                $Op::$op(rhs, self)
            }
        }
    );
}

mod vectors;
pub use self::vectors::Vector3D;

mod matrix;
pub use self::matrix::Matrix3;
