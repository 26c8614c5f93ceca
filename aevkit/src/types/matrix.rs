use std::ops::{Add, Sub, Mul, Index, IndexMut};

use super::Vector3D;

/// A 3x3 matrix of `f64`, stored in row-major order. Unit cells store their
/// lattice vectors as the rows of a `Matrix3`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Matrix3([[f64; 3]; 3]);

impl Matrix3 {
    /// Create a new `Matrix3` from the given rows
    pub const fn new(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }

    /// Create a matrix with all components set to 0
    pub const fn zero() -> Matrix3 {
        Matrix3([[0.0; 3]; 3])
    }

    /// Create the identity matrix
    pub const fn one() -> Matrix3 {
        Matrix3([
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Are all components of this matrix exactly zero?
    pub fn is_zero(&self) -> bool {
        self.0.iter().flatten().all(|&v| v == 0.0)
    }

    /// Are all components of this matrix finite?
    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }

    /// Get the transpose of this matrix
    pub fn transposed(&self) -> Matrix3 {
        let m = &self.0;
        Matrix3([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    /// Compute the determinant of this matrix
    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0][0] * (m[1][1] * m[2][2] - m[2][1] * m[1][2]) -
        m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
        m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Compute the inverse of this matrix. The result is full of infinities
    /// or NaN if the matrix is not invertible, callers should check the
    /// determinant first.
    pub fn inverse(&self) -> Matrix3 {
        let m = &self.0;
        let inv_det = 1.0 / self.determinant();

        let mut inverse = Matrix3::zero();
        inverse[0][0] = (m[1][1] * m[2][2] - m[2][1] * m[1][2]) * inv_det;
        inverse[0][1] = (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det;
        inverse[0][2] = (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det;
        inverse[1][0] = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det;
        inverse[1][1] = (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det;
        inverse[1][2] = (m[1][0] * m[0][2] - m[0][0] * m[1][2]) * inv_det;
        inverse[2][0] = (m[1][0] * m[2][1] - m[2][0] * m[1][1]) * inv_det;
        inverse[2][1] = (m[2][0] * m[0][1] - m[0][0] * m[2][1]) * inv_det;
        inverse[2][2] = (m[0][0] * m[1][1] - m[1][0] * m[0][1]) * inv_det;
        return inverse;
    }
}

impl From<[[f64; 3]; 3]> for Matrix3 {
    fn from(data: [[f64; 3]; 3]) -> Matrix3 {
        Matrix3(data)
    }
}

impl From<Matrix3> for [[f64; 3]; 3] {
    fn from(matrix: Matrix3) -> [[f64; 3]; 3] {
        matrix.0
    }
}

impl Index<usize> for Matrix3 {
    type Output = [f64; 3];
    #[inline]
    fn index(&self, index: usize) -> &[f64; 3] {
        &self.0[index]
    }
}

impl IndexMut<usize> for Matrix3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut [f64; 3] {
        &mut self.0[index]
    }
}

impl_arithmetic!(
    Matrix3, Matrix3, Add, add, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] + other[i][j];
            }
        }
        result
    }
);

impl_arithmetic!(
    Matrix3, Matrix3, Sub, sub, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                result[i][j] = self[i][j] - other[i][j];
            }
        }
        result
    }
);

// matrix-matrix product
impl_arithmetic!(
    Matrix3, Matrix3, Mul, mul, Matrix3, self, other,
    {
        let mut result = Matrix3::zero();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..3 {
                    result[i][j] += self[i][k] * other[k][j];
                }
            }
        }
        result
    }
);

// matrix-vector product, with `other` as a column vector
impl_arithmetic!(
    Matrix3, Vector3D, Mul, mul, Vector3D, self, other,
    Vector3D::new(
        self[0][0] * other[0] + self[0][1] * other[1] + self[0][2] * other[2],
        self[1][0] * other[0] + self[1][1] * other[1] + self[1][2] * other[2],
        self[2][0] * other[0] + self[2][1] * other[1] + self[2][2] * other[2],
    )
);

impl_scalar_arithmetic!(
    Matrix3, Mul, mul, self, other,
    {
        let mut result = Matrix3::new(self.0);
        for row in &mut result.0 {
            for value in row {
                *value *= other;
            }
        }
        result
    },
    commute
);

impl approx::AbsDiffEq for Matrix3 {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        <f64 as approx::AbsDiffEq>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Matrix3, epsilon: f64) -> bool {
        self.0.iter().flatten().zip(other.0.iter().flatten()).all(|(a, b)| {
            <f64 as approx::AbsDiffEq>::abs_diff_eq(a, b, epsilon)
        })
    }
}

impl approx::RelativeEq for Matrix3 {
    fn default_max_relative() -> f64 {
        <f64 as approx::RelativeEq>::default_max_relative()
    }

    fn relative_eq(&self, other: &Matrix3, epsilon: f64, max_relative: f64) -> bool {
        self.0.iter().flatten().zip(other.0.iter().flatten()).all(|(a, b)| {
            <f64 as approx::RelativeEq>::relative_eq(a, b, epsilon, max_relative)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn determinant_inverse() {
        let a = Matrix3::new([
            [2.0, 3.0, 0.0],
            [0.0, 1.0, 0.5],
            [1.0, 0.0, 4.0],
        ]);
        assert_relative_eq!(a.determinant(), 9.5);
        assert_relative_eq!(a * a.inverse(), Matrix3::one(), epsilon = 1e-12);
        assert_relative_eq!(a.inverse() * a, Matrix3::one(), epsilon = 1e-12);
    }

    #[test]
    fn transpose_and_products() {
        let a = Matrix3::new([
            [1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0],
            [7.0, 8.0, 9.0],
        ]);
        assert_eq!(a.transposed()[0], [1.0, 4.0, 7.0]);
        assert_eq!(a.transposed().transposed(), a);

        let v = Vector3D::new(1.0, 0.0, -1.0);
        assert_eq!(a * v, Vector3D::new(-2.0, -2.0, -2.0));
        assert_eq!(2.0 * a, a + a);
        assert_eq!(a - a, Matrix3::zero());
        assert!(Matrix3::zero().is_zero());
        assert!(!a.is_zero());
    }
}
