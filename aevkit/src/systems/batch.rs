use std::ops::Range;

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};

use crate::{Error, Matrix3, Vector3D};
use crate::batch::{affiliation_from_counts, counts_from_affiliation};

use super::{AtomicSystem, UnitCell};

/// The series form of a set of [`AtomicSystem`]: all atoms are concatenated,
/// and the `affiliation` array gives the system each atom belongs to.
///
/// This is the input of the descriptor pipeline. Construction checks the
/// consistency of all arrays, including the invertibility of the cells.
#[derive(Clone, Debug)]
pub struct Batch {
    cells: Array3<f64>,
    positions: Array2<f64>,
    species: Array1<usize>,
    affiliation: Array1<usize>,
    /// cached from `cells`
    unit_cells: Vec<UnitCell>,
    /// cached from `affiliation`
    ranges: Vec<Range<usize>>,
}

impl Batch {
    /// Create a new batch from its series form: `cells` with shape
    /// `(n_systems, 3, 3)` (lattice vectors as rows, all zeros for non
    /// periodic systems), `positions` with shape `(n_atoms, 3)`, `species`
    /// and `affiliation` with shape `(n_atoms)`.
    pub fn new(
        cells: Array3<f64>,
        positions: Array2<f64>,
        species: Array1<usize>,
        affiliation: Array1<usize>,
    ) -> Result<Batch, Error> {
        let n_atoms = positions.nrows();
        if positions.ncols() != 3 {
            return Err(Error::InvalidParameter(format!(
                "positions must have shape (n_atoms, 3), got {:?}", positions.shape()
            )));
        }

        if species.len() != n_atoms || affiliation.len() != n_atoms {
            return Err(Error::InvalidParameter(format!(
                "got {} positions, {} species and {} affiliation entries",
                n_atoms, species.len(), affiliation.len()
            )));
        }

        if cells.shape()[1..] != [3, 3] {
            return Err(Error::InvalidParameter(format!(
                "cells must have shape (n_systems, 3, 3), got {:?}", cells.shape()
            )));
        }

        if !positions.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidParameter(
                "positions contain non finite values".into()
            ));
        }

        let counts = counts_from_affiliation(affiliation.view())?;
        if counts.len() != cells.shape()[0] {
            return Err(Error::InvalidParameter(format!(
                "affiliation refers to {} systems, but got {} cells",
                counts.len(), cells.shape()[0]
            )));
        }

        let mut unit_cells = Vec::with_capacity(counts.len());
        for (system, cell) in cells.outer_iter().enumerate() {
            let matrix = Matrix3::new([
                [cell[[0, 0]], cell[[0, 1]], cell[[0, 2]]],
                [cell[[1, 0]], cell[[1, 1]], cell[[1, 2]]],
                [cell[[2, 0]], cell[[2, 1]], cell[[2, 2]]],
            ]);

            let unit_cell = UnitCell::try_from(matrix).map_err(|e| Error::InvalidParameter(
                format!("invalid cell for system {}: {}", system, e)
            ))?;
            unit_cells.push(unit_cell);
        }

        let mut ranges = Vec::with_capacity(counts.len());
        let mut start = 0;
        for count in counts {
            ranges.push(start..start + count);
            start += count;
        }

        return Ok(Batch {
            cells: cells,
            positions: positions,
            species: species,
            affiliation: affiliation,
            unit_cells: unit_cells,
            ranges: ranges,
        });
    }

    /// Create a batch containing all the given `systems`. Every system must
    /// contain at least one atom.
    pub fn from_systems(systems: &[AtomicSystem]) -> Result<Batch, Error> {
        let mut counts = Vec::with_capacity(systems.len());
        for (i, system) in systems.iter().enumerate() {
            if system.size() == 0 {
                return Err(Error::InvalidParameter(format!(
                    "system {} does not contain any atom", i
                )));
            }
            counts.push(system.size());
        }

        let n_atoms: usize = counts.iter().sum();
        let mut cells = Array3::zeros((systems.len(), 3, 3));
        let mut positions = Array2::zeros((n_atoms, 3));
        let mut species = Array1::zeros(n_atoms);

        let mut atom = 0;
        for (i, system) in systems.iter().enumerate() {
            let matrix = system.cell().matrix();
            for a in 0..3 {
                for b in 0..3 {
                    cells[[i, a, b]] = matrix[a][b];
                }
            }

            for (&s, position) in system.species().iter().zip(system.positions()) {
                species[atom] = s;
                positions[[atom, 0]] = position[0];
                positions[[atom, 1]] = position[1];
                positions[[atom, 2]] = position[2];
                atom += 1;
            }
        }

        return Batch::new(cells, positions, species, affiliation_from_counts(&counts));
    }

    /// Check that all species in this batch are below `num_elements`
    pub fn validate(&self, num_elements: usize) -> Result<(), Error> {
        if let Some((atom, &species)) = self.species.iter().enumerate().find(|(_, &s)| s >= num_elements) {
            return Err(Error::InvalidParameter(format!(
                "species {} of atom {} is out of range for {} elements",
                species, atom, num_elements
            )));
        }
        return Ok(());
    }

    /// Number of systems in this batch
    pub fn n_systems(&self) -> usize {
        self.unit_cells.len()
    }

    /// Total number of atoms in this batch
    pub fn n_atoms(&self) -> usize {
        self.species.len()
    }

    /// Get the cells of all systems, with shape `(n_systems, 3, 3)`
    pub fn cells(&self) -> &Array3<f64> {
        &self.cells
    }

    /// Get the positions of all atoms, with shape `(n_atoms, 3)`
    pub fn positions(&self) -> ArrayView2<'_, f64> {
        self.positions.view()
    }

    /// Get the species of all atoms
    pub fn species(&self) -> ArrayView1<'_, usize> {
        self.species.view()
    }

    /// Get the system affiliation of all atoms
    pub fn affiliation(&self) -> ArrayView1<'_, usize> {
        self.affiliation.view()
    }

    /// Get the unit cell of the given `system`
    pub fn unit_cell(&self, system: usize) -> UnitCell {
        self.unit_cells[system]
    }

    /// Get the range of atoms belonging to the given `system`
    pub fn atoms_range(&self, system: usize) -> Range<usize> {
        self.ranges[system].clone()
    }

    /// Get the position of a single atom
    #[inline]
    pub fn position(&self, atom: usize) -> Vector3D {
        let row = self.positions.row(atom);
        Vector3D::new(row[0], row[1], row[2])
    }
}
