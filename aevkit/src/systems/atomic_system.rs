use crate::{Error, Matrix3, Vector3D};
use super::UnitCell;

/// A single atomic configuration: a unit cell, and the positions and species
/// of all atoms in it.
///
/// Species are 0-based codes into an element table (see
/// [`ElementTable`](super::ElementTable)), they are validated against the
/// number of elements when the system is used in a calculation.
#[derive(Clone, Debug, PartialEq)]
pub struct AtomicSystem {
    cell: UnitCell,
    species: Vec<usize>,
    positions: Vec<Vector3D>,
}

impl AtomicSystem {
    /// Create a new empty system with the given unit cell
    pub fn new(cell: UnitCell) -> AtomicSystem {
        AtomicSystem {
            cell: cell,
            species: Vec::new(),
            positions: Vec::new(),
        }
    }

    /// Create a system from fractional coordinates in the given cell. The
    /// Cartesian positions are `fractional @ cell`.
    pub fn from_fractional(
        cell: UnitCell,
        species: &[usize],
        fractional: &[Vector3D],
    ) -> Result<AtomicSystem, Error> {
        if cell.is_infinite() {
            return Err(Error::InvalidParameter(
                "can not use fractional coordinates with an infinite cell".into()
            ));
        }

        if species.len() != fractional.len() {
            return Err(Error::InvalidParameter(format!(
                "got {} species but {} positions", species.len(), fractional.len()
            )));
        }

        let mut system = AtomicSystem::new(cell);
        for (&species, &fractional) in species.iter().zip(fractional) {
            system.add_atom(species, cell.cartesian(fractional));
        }

        return Ok(system);
    }

    /// Add an atom with the given species and Cartesian position to this
    /// system
    pub fn add_atom(&mut self, species: usize, position: Vector3D) {
        self.species.push(species);
        self.positions.push(position);
    }

    /// Number of atoms in this system
    pub fn size(&self) -> usize {
        self.species.len()
    }

    /// Get the unit cell of this system
    pub fn cell(&self) -> UnitCell {
        self.cell
    }

    /// Get the species of all atoms in this system
    pub fn species(&self) -> &[usize] {
        &self.species
    }

    /// Get the Cartesian positions of all atoms in this system
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Get mutable access to the positions of all atoms in this system
    pub fn positions_mut(&mut self) -> &mut [Vector3D] {
        &mut self.positions
    }

    /// Translate all atoms in this system by `vector`
    pub fn translate(&mut self, vector: Vector3D) {
        for position in &mut self.positions {
            *position += vector;
        }
    }

    /// Apply a rigid transformation `x -> rotation * x` to the positions and
    /// the lattice vectors of this system.
    pub fn rotate(&mut self, rotation: Matrix3) -> Result<(), Error> {
        for position in &mut self.positions {
            *position = rotation * *position;
        }

        if !self.cell.is_infinite() {
            // lattice vectors are rows, so `rows @ rotation^T`
            let matrix = self.cell.matrix() * rotation.transposed();
            self.cell = UnitCell::try_from(matrix)?;
        }

        return Ok(());
    }
}
