use ndarray::Array3;

use crate::{Matrix3, Vector3D};
use crate::systems::UnitCell;

/// Maximal number of bins, this prevents having too many bins with a large
/// system and a small cutoff
const MAX_NUMBER_OF_BINS: f64 = 1e5;

/// Number of periodic images crossed along each lattice vector to go from the
/// position of an atom to one of its images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellShift(pub [i32; 3]);

impl std::ops::Add<CellShift> for CellShift {
    type Output = CellShift;

    fn add(mut self, rhs: CellShift) -> CellShift {
        self.0[0] += rhs.0[0];
        self.0[1] += rhs.0[1];
        self.0[2] += rhs.0[2];
        return self;
    }
}

impl std::ops::Sub<CellShift> for CellShift {
    type Output = CellShift;

    fn sub(mut self, rhs: CellShift) -> CellShift {
        self.0[0] -= rhs.0[0];
        self.0[1] -= rhs.0[1];
        self.0[2] -= rhs.0[2];
        return self;
    }
}

impl std::ops::Neg for CellShift {
    type Output = CellShift;

    fn neg(self) -> CellShift {
        CellShift([-self.0[0], -self.0[1], -self.0[2]])
    }
}

impl CellShift {
    /// Is this the zero shift?
    pub fn is_zero(&self) -> bool {
        self.0 == [0, 0, 0]
    }

    /// Compute the shift vector in Cartesian coordinates, `shift @ cell` with
    /// lattice vectors as the rows of `cell`.
    pub fn cartesian(&self, cell: &Matrix3) -> Vector3D {
        let [a, b, c] = self.0.map(|s| s as f64);
        Vector3D::new(
            a * cell[0][0] + b * cell[1][0] + c * cell[2][0],
            a * cell[0][1] + b * cell[1][1] + c * cell[2][1],
            a * cell[0][2] + b * cell[1][2] + c * cell[2][2],
        )
    }
}

/// Candidate pair produced by the cell list. The vector between the atoms is
/// `position[second] + shift @ cell - position[first]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPair {
    pub first: usize,
    pub second: usize,
    pub shift: CellShift,
}

/// An atom stored in one of the bins
#[derive(Debug, Clone)]
struct BinnedAtom {
    /// index of the atom in the system
    index: usize,
    /// shift from the atom position to its image inside the unit cell
    shift: CellShift,
}

/// The bounding box used to bin atoms in non periodic systems
#[derive(Debug, Clone, Copy)]
struct BoundingBox {
    origin: Vector3D,
    size: Vector3D,
}

/// The cell list sorts atoms into bins. Candidate pairs are created by
/// looking through all neighboring bins of each bin, the number of bins to
/// search in each direction depends on the cutoff and the size of the bins.
///
/// Periodic systems are binned using fractional coordinates, wrapping atoms
/// outside of the cell back inside and keeping track of the corresponding
/// cell shift. Non periodic systems are binned inside the bounding box of
/// their atoms.
#[derive(Debug, Clone)]
pub struct CellList {
    /// number of bins to search in each direction
    n_search: [i32; 3],
    bins: Array3<Vec<BinnedAtom>>,
    unit_cell: UnitCell,
    /// only set for infinite cells
    bounding_box: Option<BoundingBox>,
}

impl CellList {
    /// Create a new `CellList` for atoms at the given `positions` in
    /// `unit_cell`, to find all pairs closer than `cutoff`.
    pub fn new(unit_cell: UnitCell, cutoff: f64, positions: &[Vector3D]) -> CellList {
        debug_assert!(cutoff > 0.0 && cutoff.is_finite());

        let (bounding_box, lengths) = if unit_cell.is_infinite() {
            let mut min = Vector3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
            let mut max = Vector3D::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
            for position in positions {
                for xyz in 0..3 {
                    min[xyz] = f64::min(min[xyz], position[xyz]);
                    max[xyz] = f64::max(max[xyz], position[xyz]);
                }
            }

            let mut size = max - min;
            for xyz in 0..3 {
                // flat (or empty) systems along this direction use a single bin
                if !(size[xyz] > 0.0) {
                    size[xyz] = cutoff;
                }
            }
            if positions.is_empty() {
                min = Vector3D::zero();
            }

            (Some(BoundingBox { origin: min, size: size }), size)
        } else {
            (None, unit_cell.distances_between_faces())
        };

        let mut n_bins = [
            f64::clamp(f64::trunc(lengths[0] / cutoff), 1.0, MAX_NUMBER_OF_BINS),
            f64::clamp(f64::trunc(lengths[1] / cutoff), 1.0, MAX_NUMBER_OF_BINS),
            f64::clamp(f64::trunc(lengths[2] / cutoff), 1.0, MAX_NUMBER_OF_BINS),
        ];

        let n_bins_total = n_bins[0] * n_bins[1] * n_bins[2];
        if n_bins_total > MAX_NUMBER_OF_BINS {
            // keep roughly the ratio of bins in each direction
            let ratio_x_y = n_bins[0] / n_bins[1];
            let ratio_y_z = n_bins[1] / n_bins[2];

            n_bins[2] = f64::max(1.0, f64::trunc(f64::cbrt(MAX_NUMBER_OF_BINS / (ratio_x_y * ratio_y_z * ratio_y_z))));
            n_bins[1] = f64::max(1.0, f64::trunc(ratio_y_z * n_bins[2]));
            n_bins[0] = f64::max(1.0, f64::trunc(ratio_x_y * n_bins[1]));
        }

        // the rebalancing above overshoots when most bins are along a single
        // direction, shrink the largest direction until we are under the cap
        while n_bins[0] * n_bins[1] * n_bins[2] > MAX_NUMBER_OF_BINS {
            let largest = if n_bins[0] >= n_bins[1] && n_bins[0] >= n_bins[2] {
                0
            } else if n_bins[1] >= n_bins[2] {
                1
            } else {
                2
            };
            let others = n_bins[0] * n_bins[1] * n_bins[2] / n_bins[largest];
            n_bins[largest] = f64::max(1.0, f64::min(
                n_bins[largest] - 1.0,
                f64::trunc(MAX_NUMBER_OF_BINS / others),
            ));
        }

        let mut n_search = [0; 3];
        for xyz in 0..3 {
            n_search[xyz] = i32::max(1, f64::ceil(cutoff * n_bins[xyz] / lengths[xyz]) as i32);

            // there is nothing to search around a single bin without
            // periodic boundary conditions
            if n_bins[xyz] == 1.0 && unit_cell.is_infinite() {
                n_search[xyz] = 0;
            }
        }

        let n_bins = [n_bins[0] as usize, n_bins[1] as usize, n_bins[2] as usize];
        let mut cell_list = CellList {
            n_search: n_search,
            bins: Array3::from_elem(n_bins, Vec::new()),
            unit_cell: unit_cell,
            bounding_box: bounding_box,
        };

        for (index, &position) in positions.iter().enumerate() {
            cell_list.add_atom(index, position);
        }

        return cell_list;
    }

    fn add_atom(&mut self, index: usize, position: Vector3D) {
        let fractional = match self.bounding_box {
            Some(bounding_box) => {
                let relative = position - bounding_box.origin;
                Vector3D::new(
                    relative[0] / bounding_box.size[0],
                    relative[1] / bounding_box.size[1],
                    relative[2] / bounding_box.size[2],
                )
            }
            None => self.unit_cell.fractional(position),
        };

        let n_bins = self.bins.dim();
        let n_bins = [n_bins.0, n_bins.1, n_bins.2];

        let bin = [
            f64::floor(fractional[0] * n_bins[0] as f64) as i32,
            f64::floor(fractional[1] * n_bins[1] as f64) as i32,
            f64::floor(fractional[2] * n_bins[2] as f64) as i32,
        ];

        let (shift, bin) = if self.bounding_box.is_some() {
            // atoms on the upper faces of the bounding box go in the last bin
            let bin = [
                i32::clamp(bin[0], 0, n_bins[0] as i32 - 1) as usize,
                i32::clamp(bin[1], 0, n_bins[1] as i32 - 1) as usize,
                i32::clamp(bin[2], 0, n_bins[2] as i32 - 1) as usize,
            ];
            ([0, 0, 0], bin)
        } else {
            divmod_vec(bin, n_bins)
        };

        self.bins[bin].push(BinnedAtom {
            index: index,
            shift: CellShift(shift),
        });
    }

    /// Get the list of candidate pairs, some of which might be further apart
    /// than the cutoff.
    ///
    /// This is a "half" list: each pair of atoms `i < j` appears once, as
    /// `(i, j)`. Pairs between an atom and its own periodic images appear once
    /// for each couple of opposite shifts. The same two atoms can be paired
    /// multiple times with different shifts when the cutoff is larger than
    /// half the cell.
    pub fn pairs(&self) -> Vec<CellPair> {
        let mut pairs = Vec::new();

        let n_bins = self.bins.dim();
        let n_bins = [n_bins.0, n_bins.1, n_bins.2];
        let periodic = self.bounding_box.is_none();

        let search_x = -self.n_search[0]..=self.n_search[0];
        let search_y = -self.n_search[1]..=self.n_search[1];
        let search_z = -self.n_search[2]..=self.n_search[2];

        for ((bin_x, bin_y, bin_z), current) in self.bins.indexed_iter() {
            for delta_x in search_x.clone() {
                for delta_y in search_y.clone() {
                    for delta_z in search_z.clone() {
                        let neighbor = [
                            bin_x as i32 + delta_x,
                            bin_y as i32 + delta_y,
                            bin_z as i32 + delta_z,
                        ];

                        let (bin_shift, neighbor) = divmod_vec(neighbor, n_bins);
                        let bin_shift = CellShift(bin_shift);
                        if !periodic && !bin_shift.is_zero() {
                            // no wrapping around the bounding box
                            continue;
                        }

                        for atom_i in current {
                            for atom_j in &self.bins[neighbor] {
                                if atom_i.index > atom_j.index {
                                    continue;
                                }

                                let shift = bin_shift + atom_i.shift - atom_j.shift;
                                if atom_i.index == atom_j.index && !keep_self_image(shift) {
                                    continue;
                                }

                                pairs.push(CellPair {
                                    first: atom_i.index,
                                    second: atom_j.index,
                                    shift: shift,
                                });
                            }
                        }
                    }
                }
            }
        }

        return pairs;
    }
}

/// Should we keep the pair between an atom and its image with the given
/// `shift`? The atom itself (zero shift) is never kept, and only one of
/// `shift` and `-shift` is kept.
fn keep_self_image(shift: CellShift) -> bool {
    let [a, b, c] = shift.0;
    if a + b + c != 0 {
        return a + b + c > 0;
    }

    // in the plane a + b + c = 0, keep the half plane c > 0, and the half
    // line b > 0 when c = 0. This also drops the zero shift.
    return c > 0 || (c == 0 && b > 0);
}

/// Compute both quotient and remainder of the division of a by b, with the
/// remainder always positive.
fn divmod(a: i32, b: usize) -> (i32, usize) {
    debug_assert!(b < (i32::MAX as usize));
    let b = b as i32;
    let quotient = a.div_euclid(b);
    let remainder = a.rem_euclid(b);
    return (quotient, remainder as usize);
}

fn divmod_vec(a: [i32; 3], b: [usize; 3]) -> ([i32; 3], [usize; 3]) {
    let (qx, rx) = divmod(a[0], b[0]);
    let (qy, ry) = divmod(a[1], b[1]);
    let (qz, rz) = divmod(a[2], b[2]);
    return ([qx, qy, qz], [rx, ry, rz]);
}
