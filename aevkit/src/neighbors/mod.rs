//! Neighbor pairs ("duos") and neighbor triplets ("trios") inside each system
//! of a batch.

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

use crate::{Backend, Error, Vector3D};
use crate::systems::Batch;

mod cell_list;
pub use self::cell_list::{CellList, CellPair, CellShift};

/// Directed pairs of atoms within a cutoff, with the periodic shift applied
/// to the neighbor.
///
/// Atom indexes refer to the atoms of a [`Batch`], both atoms of a pair
/// always belong to the same system. The vector of the pair `k` is
/// `positions[neighbors[k]] + shifts[k] @ cell - positions[centers[k]]`.
/// Both `(i, j, s)` and `(j, i, -s)` are part of the list, and rows are
/// sorted by center, then neighbor, then shift.
#[derive(Debug, Clone, PartialEq)]
pub struct DuoIndex {
    /// index of the central atom of each pair
    pub centers: Array1<usize>,
    /// index of the neighbor atom of each pair
    pub neighbors: Array1<usize>,
    /// periodic cell shift of each pair, with shape `(n_duos, 3)`
    pub shifts: Array2<i32>,
}

impl DuoIndex {
    /// Create an empty list of pairs
    pub fn empty() -> DuoIndex {
        DuoIndex {
            centers: Array1::zeros(0),
            neighbors: Array1::zeros(0),
            shifts: Array2::zeros((0, 3)),
        }
    }

    /// Number of pairs in this list
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Is this list empty?
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Get the cell shift of a single pair
    pub fn shift(&self, duo: usize) -> CellShift {
        let shift = self.shifts.row(duo);
        CellShift([shift[0], shift[1], shift[2]])
    }

    /// Get the subset of pairs for which `mask` is true, in the same order
    pub fn select(&self, mask: ArrayView1<'_, bool>) -> Result<DuoIndex, Error> {
        if mask.len() != self.len() {
            return Err(Error::InvalidParameter(format!(
                "mask has {} entries but there are {} pairs", mask.len(), self.len()
            )));
        }

        let rows = mask.iter().enumerate()
            .filter(|(_, &keep)| keep)
            .map(|(row, _)| row)
            .collect::<Vec<_>>();

        return Ok(DuoIndex {
            centers: rows.iter().map(|&row| self.centers[row]).collect(),
            neighbors: rows.iter().map(|&row| self.neighbors[row]).collect(),
            shifts: Array2::from_shape_fn((rows.len(), 3), |(row, xyz)| self.shifts[[rows[row], xyz]]),
        });
    }

    fn from_rows(rows: &[(usize, usize, CellShift)]) -> DuoIndex {
        let mut shifts = Array2::zeros((rows.len(), 3));
        for (mut shift, (_, _, s)) in shifts.rows_mut().into_iter().zip(rows) {
            shift[0] = s.0[0];
            shift[1] = s.0[1];
            shift[2] = s.0[2];
        }

        DuoIndex {
            centers: rows.iter().map(|r| r.0).collect(),
            neighbors: rows.iter().map(|r| r.1).collect(),
            shifts: shifts,
        }
    }
}

/// Pairs of rows in a [`DuoIndex`] sharing the same center, defining the
/// triplets `(center, neighbors[first], neighbors[second])`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrioIndex {
    pub first: Array1<usize>,
    pub second: Array1<usize>,
}

impl TrioIndex {
    /// Number of triplets in this list
    pub fn len(&self) -> usize {
        self.first.len()
    }

    /// Is this list empty?
    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }
}

/// Find all pairs of atoms closer than `cutoff` in each system of the
/// `batch`, including pairs with periodic images.
///
/// The list is exhaustive for any ratio of cutoff to cell size: an atom can
/// be paired with multiple images of the same neighbor, and with its own
/// images. Atoms at exactly the same position are not paired.
#[time_graph::instrument(name = "neighbor_duos")]
pub fn neighbor_duos(batch: &Batch, cutoff: f64, backend: Backend) -> Result<DuoIndex, Error> {
    if !(cutoff > 0.0 && cutoff.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "cutoff must be a positive finite number, got {}", cutoff
        )));
    }

    let per_system = if backend.is_parallel() {
        (0..batch.n_systems()).into_par_iter()
            .map(|system| system_duos(batch, system, cutoff))
            .collect::<Vec<_>>()
    } else {
        (0..batch.n_systems())
            .map(|system| system_duos(batch, system, cutoff))
            .collect::<Vec<_>>()
    };

    let rows = per_system.concat();
    debug!("found {} pairs below {} A in {} systems", rows.len(), cutoff, batch.n_systems());

    return Ok(DuoIndex::from_rows(&rows));
}

/// Directed pairs inside a single system, using global atom indexes and
/// sorted by center/neighbor/shift.
fn system_duos(batch: &Batch, system: usize, cutoff: f64) -> Vec<(usize, usize, CellShift)> {
    let atoms = batch.atoms_range(system);
    let unit_cell = batch.unit_cell(system);
    let cell_matrix = unit_cell.matrix();

    let positions = atoms.clone().map(|atom| batch.position(atom)).collect::<Vec<Vector3D>>();
    let cell_list = CellList::new(unit_cell, cutoff, &positions);

    let cutoff2 = cutoff * cutoff;
    let mut duos = Vec::new();
    for pair in cell_list.pairs() {
        let vector = positions[pair.second] + pair.shift.cartesian(&cell_matrix) - positions[pair.first];
        let distance2 = vector.norm2();
        if distance2 >= cutoff2 {
            continue;
        }

        let first = atoms.start + pair.first;
        let second = atoms.start + pair.second;
        if distance2 == 0.0 {
            warn!(
                "atoms {} and {} are at the same position in system {}, ignoring this pair",
                first, second, system
            );
            continue;
        } else if distance2 < 1e-3 {
            warn!(
                "atoms {} and {} are very close to one another ({} A)",
                first, second, distance2.sqrt()
            );
        }

        duos.push((first, second, pair.shift));
        duos.push((second, first, -pair.shift));
    }

    duos.sort_unstable_by_key(|&(center, neighbor, shift)| (center, neighbor, shift));
    return duos;
}

/// Create all ordered pairs of distinct rows of `duos` sharing the same
/// center. A center with `k` neighbors creates `k (k - 1)` triplets.
///
/// `duos` must be sorted by center, as created by [`neighbor_duos`].
#[time_graph::instrument(name = "neighbor_trios")]
pub fn neighbor_trios(duos: &DuoIndex) -> TrioIndex {
    let mut first = Vec::new();
    let mut second = Vec::new();

    let mut start = 0;
    while start < duos.len() {
        let center = duos.centers[start];
        let mut end = start + 1;
        while end < duos.len() && duos.centers[end] == center {
            end += 1;
        }

        for a in start..end {
            for b in start..end {
                if a != b {
                    first.push(a);
                    second.push(b);
                }
            }
        }

        start = end;
    }

    return TrioIndex {
        first: Array1::from(first),
        second: Array1::from(second),
    };
}
