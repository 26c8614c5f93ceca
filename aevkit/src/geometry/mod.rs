//! Distances and angles for the pairs and triplets found by the
//! [`neighbors`](crate::neighbors) module.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};

use crate::{Backend, Error, Vector3D};
use crate::neighbors::{DuoIndex, TrioIndex};
use crate::systems::Batch;

/// Distances and angle cosine of a set of triplets `(i, j, k)` centered on
/// `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrioGeometry {
    /// distance between `i` and `j`
    pub r_ij: Array1<f64>,
    /// distance between `i` and `k`
    pub r_ik: Array1<f64>,
    /// cosine of the angle between `r_ij` and `r_ik`, clamped to `[-1, 1]`
    pub cos: Array1<f64>,
}

/// Compute the vector `positions[j] + shift @ cell - positions[i]` of each
/// pair in `duos`, using the cell of the system containing the pair. The
/// output has shape `(n_duos, 3)`.
#[time_graph::instrument(name = "pair_vectors")]
pub fn pair_vectors(batch: &Batch, duos: &DuoIndex, backend: Backend) -> Array2<f64> {
    let affiliation = batch.affiliation();

    let compute = |duo: usize| {
        let center = duos.centers[duo];
        let cell = batch.unit_cell(affiliation[center]).matrix();
        batch.position(duos.neighbors[duo]) + duos.shift(duo).cartesian(&cell) - batch.position(center)
    };

    let mut vectors = Array2::zeros((duos.len(), 3));
    let zip = Zip::indexed(vectors.rows_mut());
    let assign = |duo: usize, mut row: ndarray::ArrayViewMut1<f64>| {
        let vector: Vector3D = compute(duo);
        row[0] = vector[0];
        row[1] = vector[1];
        row[2] = vector[2];
    };

    if backend.is_parallel() {
        zip.par_for_each(assign);
    } else {
        zip.for_each(assign);
    }

    return vectors;
}

/// Compute the norm of each row of `vectors`
pub fn pair_distances(vectors: ArrayView2<'_, f64>, backend: Backend) -> Array1<f64> {
    let mut distances = Array1::zeros(vectors.nrows());
    let zip = Zip::from(&mut distances).and(vectors.rows());
    let norm = |distance: &mut f64, vector: ArrayView1<f64>| {
        *distance = f64::sqrt(vector[0] * vector[0] + vector[1] * vector[1] + vector[2] * vector[2]);
    };

    if backend.is_parallel() {
        zip.par_for_each(norm);
    } else {
        zip.for_each(norm);
    }

    return distances;
}

/// Compute the distances and angles of the `trios`, from the `vectors` and
/// `distances` of the pairs they are built from.
#[time_graph::instrument(name = "trio_geometry")]
pub fn trio_geometry(
    vectors: ArrayView2<'_, f64>,
    distances: ArrayView1<'_, f64>,
    trios: &TrioIndex,
    backend: Backend,
) -> Result<TrioGeometry, Error> {
    if vectors.nrows() != distances.len() {
        return Err(Error::InvalidParameter(format!(
            "got {} pair vectors but {} pair distances", vectors.nrows(), distances.len()
        )));
    }

    let n_duos = distances.len();
    if trios.first.iter().chain(&trios.second).any(|&duo| duo >= n_duos) {
        return Err(Error::InvalidParameter(
            "triplets refer to pairs outside of the pair list".into()
        ));
    }

    let n_trios = trios.len();
    let mut geometry = TrioGeometry {
        r_ij: Array1::zeros(n_trios),
        r_ik: Array1::zeros(n_trios),
        cos: Array1::zeros(n_trios),
    };

    let zip = Zip::from(&mut geometry.r_ij)
        .and(&mut geometry.r_ik)
        .and(&mut geometry.cos)
        .and(&trios.first)
        .and(&trios.second);

    let compute = |r_ij: &mut f64, r_ik: &mut f64, cos: &mut f64, &j: &usize, &k: &usize| {
        *r_ij = distances[j];
        *r_ik = distances[k];

        let dot = vectors[[j, 0]] * vectors[[k, 0]]
            + vectors[[j, 1]] * vectors[[k, 1]]
            + vectors[[j, 2]] * vectors[[k, 2]];

        *cos = f64::clamp(dot / (*r_ij * *r_ik), -1.0, 1.0);
    };

    if backend.is_parallel() {
        zip.par_for_each(compute);
    } else {
        zip.for_each(compute);
    }

    return Ok(geometry);
}

#[cfg(test)]
mod tests {
    use approx::{assert_relative_eq, assert_ulps_eq};

    use crate::{AtomicSystem, UnitCell};
    use crate::neighbors::{neighbor_duos, neighbor_trios};
    use super::*;

    fn right_angle() -> Batch {
        let mut system = AtomicSystem::new(UnitCell::infinite());
        system.add_atom(0, Vector3D::new(0.0, 0.0, 0.0));
        system.add_atom(0, Vector3D::new(1.0, 0.0, 0.0));
        system.add_atom(0, Vector3D::new(0.0, 1.0, 0.0));
        Batch::from_systems(&[system]).unwrap()
    }

    #[test]
    fn right_angle_triangle() {
        let batch = right_angle();
        let duos = neighbor_duos(&batch, 5.0, Backend::Serial).unwrap();
        assert_eq!(duos.len(), 6);

        let vectors = pair_vectors(&batch, &duos, Backend::Serial);
        let distances = pair_distances(vectors.view(), Backend::Serial);
        assert_eq!(vectors.row(0).to_vec(), [1.0, 0.0, 0.0]);
        assert_eq!(distances[0], 1.0);
        assert_eq!(distances[1], 1.0);
        // between atoms 1 and 2
        assert_ulps_eq!(distances[3], f64::sqrt(2.0));

        let trios = neighbor_trios(&duos);
        let geometry = trio_geometry(vectors.view(), distances.view(), &trios, Backend::Serial).unwrap();
        assert_eq!(geometry.cos.len(), 6);

        // centered on atom 0, between atoms 1 and 2
        assert_eq!(geometry.cos[0], 0.0);
        assert_eq!(geometry.r_ij[0], 1.0);
        assert_eq!(geometry.r_ik[0], 1.0);

        // centered on atom 1, the angle is 45°
        assert_relative_eq!(geometry.cos[2], f64::sqrt(0.5), epsilon = 1e-12);
    }

    #[test]
    fn periodic_vectors() {
        let mut system = AtomicSystem::new(UnitCell::cubic(4.0).unwrap());
        system.add_atom(0, Vector3D::new(0.5, 0.0, 0.0));
        system.add_atom(0, Vector3D::new(3.5, 0.0, 0.0));
        let batch = Batch::from_systems(&[system]).unwrap();

        let duos = neighbor_duos(&batch, 1.5, Backend::Serial).unwrap();
        assert_eq!(duos.len(), 2);

        let vectors = pair_vectors(&batch, &duos, Backend::Parallel);
        // from atom 0 to the image of atom 1 at -0.5
        assert_ulps_eq!(vectors[[0, 0]], -1.0);
        assert_ulps_eq!(vectors[[1, 0]], 1.0);
    }

    #[test]
    fn clamped_cosine() {
        // collinear atoms, rounding errors could push the cosine outside of
        // [-1, 1]
        let mut system = AtomicSystem::new(UnitCell::infinite());
        system.add_atom(0, Vector3D::new(0.1, 0.2, 0.3));
        system.add_atom(0, Vector3D::new(0.1 + 0.7, 0.2 + 1.1, 0.3 + 1.3));
        system.add_atom(0, Vector3D::new(0.1 - 0.7, 0.2 - 1.1, 0.3 - 1.3));
        let batch = Batch::from_systems(&[system]).unwrap();

        let duos = neighbor_duos(&batch, 2.0, Backend::Serial).unwrap();
        let vectors = pair_vectors(&batch, &duos, Backend::Serial);
        let distances = pair_distances(vectors.view(), Backend::Serial);
        let trios = neighbor_trios(&duos);
        let geometry = trio_geometry(vectors.view(), distances.view(), &trios, Backend::Serial).unwrap();

        assert_eq!(geometry.cos.len(), 2);
        assert!(geometry.cos.iter().all(|&c| (-1.0..=1.0).contains(&c)));
        assert_relative_eq!(geometry.cos[0], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_trios() {
        let trios = TrioIndex {
            first: ndarray::arr1(&[0]),
            second: ndarray::arr1(&[3]),
        };
        let vectors = Array2::zeros((2, 3));
        let distances = Array1::ones(2);
        assert!(trio_geometry(vectors.view(), distances.view(), &trios, Backend::Serial).is_err());
    }
}
