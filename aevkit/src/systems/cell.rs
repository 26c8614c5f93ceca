//! The `UnitCell` type represents the enclosing box of a system, with or
//! without periodic boundary conditions.
use crate::{Error, Matrix3, Vector3D};

/// The shape of a cell determines how periodic boundary conditions are
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellShape {
    /// Infinite unit cell, with no boundaries
    Infinite,
    /// Orthorhombic unit cell, with cuboid shape
    Orthorhombic,
    /// Triclinic unit cell, with arbitrary parallelepiped shape
    Triclinic,
}

/// An `UnitCell` defines the system physical boundaries. Lattice vectors are
/// stored as the rows of the cell matrix, so that the Cartesian position of
/// fractional coordinates `f` is `f @ matrix`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCell {
    /// Unit cell matrix
    matrix: Matrix3,
    /// Transpose of the unit cell matrix, cached from matrix
    transpose: Matrix3,
    /// Inverse of the transpose of the unit cell matrix, cached from matrix
    inverse: Matrix3,
    /// Unit cell shape
    shape: CellShape,
}

impl TryFrom<Matrix3> for UnitCell {
    type Error = Error;

    /// Create a cell from a matrix containing the lattice vectors as rows. An
    /// all-zero matrix creates an infinite cell (no periodic boundary
    /// conditions), any other matrix must be invertible.
    fn try_from(matrix: Matrix3) -> Result<UnitCell, Error> {
        if matrix.is_zero() {
            return Ok(UnitCell::infinite());
        }

        if !matrix.is_finite() {
            return Err(Error::InvalidParameter(
                "unit cell matrix contains non finite values".into()
            ));
        }

        if f64::abs(matrix.determinant()) < 1e-6 {
            return Err(Error::InvalidParameter(format!(
                "unit cell matrix is not invertible (determinant is {})",
                matrix.determinant()
            )));
        }

        let is_close_0 = |value| f64::abs(value) < 1e-6;
        let is_diagonal = |matrix: Matrix3| {
            is_close_0(matrix[0][1]) && is_close_0(matrix[0][2]) &&
            is_close_0(matrix[1][0]) && is_close_0(matrix[1][2]) &&
            is_close_0(matrix[2][0]) && is_close_0(matrix[2][1])
        };

        let shape = if is_diagonal(matrix) {
            CellShape::Orthorhombic
        } else {
            CellShape::Triclinic
        };

        return Ok(UnitCell {
            matrix: matrix,
            transpose: matrix.transposed(),
            inverse: matrix.transposed().inverse(),
            shape: shape
        });
    }
}

impl UnitCell {
    /// Create an infinite unit cell
    pub fn infinite() -> UnitCell {
        UnitCell {
            matrix: Matrix3::zero(),
            transpose: Matrix3::zero(),
            inverse: Matrix3::zero(),
            shape: CellShape::Infinite,
        }
    }

    /// Create an orthorhombic unit cell, with side lengths `a, b, c`.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<UnitCell, Error> {
        if !(a > 0.0 && b > 0.0 && c > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "cell lengths must be positive, got {}, {} and {}", a, b, c
            )));
        }

        return UnitCell::try_from(Matrix3::new([
            [a, 0.0, 0.0],
            [0.0, b, 0.0],
            [0.0, 0.0, c]
        ]));
    }

    /// Create a cubic unit cell, with side lengths `length, length, length`.
    pub fn cubic(length: f64) -> Result<UnitCell, Error> {
        UnitCell::orthorhombic(length, length, length)
    }

    /// Get the cell shape
    pub fn shape(&self) -> CellShape {
        self.shape
    }

    /// Check if this unit cell is infinite, *i.e.* if it does not have
    /// periodic boundary conditions.
    pub fn is_infinite(&self) -> bool {
        self.shape() == CellShape::Infinite
    }

    /// Get the matricial representation of the unit cell
    pub fn matrix(&self) -> Matrix3 {
        self.matrix
    }

    /// Get the distances between opposite faces of the unit cell
    pub fn distances_between_faces(&self) -> Vector3D {
        if self.shape == CellShape::Infinite {
            return Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        }

        let a: Vector3D = self.matrix[0].into();
        let b: Vector3D = self.matrix[1].into();
        let c: Vector3D = self.matrix[2].into();

        // normal vectors to the faces
        let na = (b ^ c).normalized();
        let nb = (c ^ a).normalized();
        let nc = (a ^ b).normalized();

        Vector3D::new(f64::abs(na * a), f64::abs(nb * b), f64::abs(nc * c))
    }

    /// Get the volume of the cell
    pub fn volume(&self) -> f64 {
        match self.shape {
            CellShape::Infinite => 0.0,
            CellShape::Orthorhombic | CellShape::Triclinic => f64::abs(self.matrix.determinant()),
        }
    }

    /// Get the fractional representation of the `vector` in this cell
    pub fn fractional(&self, vector: Vector3D) -> Vector3D {
        // we only have code to multiply a vector by a matrix on the left,
        // hence the inverse of the transpose
        return self.inverse * vector;
    }

    /// Get the Cartesian representation of the `fractional` vector in this
    /// cell
    pub fn cartesian(&self, fractional: Vector3D) -> Vector3D {
        return self.transpose * fractional;
    }
}
