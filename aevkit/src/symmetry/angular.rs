use ndarray::{Array1, Array2, ArrayView1, Zip};

use crate::{Backend, Error, Real};
use crate::geometry::TrioGeometry;
use crate::math::{arange, scatter_add, CosineCutoff};
use crate::neighbors::{DuoIndex, TrioIndex};

use super::ElementPairs;
use super::radial::{validate_positive, validate_shifts};

/// Parameters of the angular symmetry functions
/// `G = 2 ((1 + cos(θ - θs)) / 2)^ζ exp(-η ((r_ij + r_ik) / 2 - Rs)²) fc(r_ij) fc(r_ik)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AngularParameters {
    /// Cutoff radius `Rca` (in Å)
    pub cutoff: f64,
    /// First radial shift `Rs`
    pub head: f64,
    /// Upper bound (excluded) of the radial shifts
    pub tail: f64,
    /// Spacing between radial shifts
    pub step: f64,
    /// Width of the radial gaussians, `η = 1 / σ²`
    pub sigma: f64,
    /// Angular exponent `ζ`
    pub zeta: f64,
    /// Number of angular shifts `θs`, evenly spaced in `[0, π)`
    pub ndiv: usize,
}

impl AngularParameters {
    pub fn validate(&self) -> Result<(), Error> {
        validate_shifts("angular", self.head, self.tail, self.step)?;
        validate_positive("angular sigma", self.sigma)?;
        validate_positive("angular zeta", self.zeta)?;
        if self.ndiv == 0 {
            return Err(Error::InvalidParameter(
                "angular ndiv must be at least 1".into()
            ));
        }
        CosineCutoff::new(self.cutoff)?;
        return Ok(());
    }

    /// Radial shifts `Rs`, as `arange(head, tail, step)`
    pub fn shifts(&self) -> Vec<f64> {
        arange(self.head, self.tail, self.step)
    }

    /// Angular shifts `θs_k = k π / ndiv` for `k` in `0..ndiv`
    pub fn angle_shifts(&self) -> Vec<f64> {
        (0..self.ndiv)
            .map(|k| k as f64 * std::f64::consts::PI / self.ndiv as f64)
            .collect()
    }
}

/// Angular part of the atomic environment vectors.
///
/// For each atom `i`, the features are indexed by the unordered pair of
/// species of the two neighbors (through [`ElementPairs`]), then by the
/// radial shift and finally by the angular shift.
#[derive(Debug, Clone)]
pub struct AngularSymmetryFunction<T> {
    pairs: ElementPairs,
    parameters: AngularParameters,
    cutoff: CosineCutoff,
    eta: T,
    zeta: T,
    shifts: Vec<T>,
    angle_shifts: Vec<T>,
}

impl<T: Real> AngularSymmetryFunction<T> {
    pub fn new(num_elements: usize, parameters: AngularParameters) -> Result<Self, Error> {
        if num_elements == 0 {
            return Err(Error::InvalidParameter(
                "the number of elements must be at least 1".into()
            ));
        }
        return AngularSymmetryFunction::with_pairs(ElementPairs::new(num_elements)?, parameters);
    }

    /// Create an angular function using a custom table of species pairs
    pub fn with_pairs(pairs: ElementPairs, parameters: AngularParameters) -> Result<Self, Error> {
        parameters.validate()?;

        return Ok(AngularSymmetryFunction {
            pairs: pairs,
            parameters: parameters,
            cutoff: CosineCutoff::new(parameters.cutoff)?,
            eta: T::from_f64_lossy(1.0 / (parameters.sigma * parameters.sigma)),
            zeta: T::from_f64_lossy(parameters.zeta),
            shifts: parameters.shifts().into_iter().map(T::from_f64_lossy).collect(),
            angle_shifts: parameters.angle_shifts().into_iter().map(T::from_f64_lossy).collect(),
        });
    }

    /// Get the parameters used to create this function
    pub fn parameters(&self) -> &AngularParameters {
        &self.parameters
    }

    /// Get the table of species pairs used by this function
    pub fn pairs(&self) -> &ElementPairs {
        &self.pairs
    }

    /// Cutoff radius of this function
    pub fn cutoff(&self) -> f64 {
        self.parameters.cutoff
    }

    /// Number of features for each pair of species
    fn pair_size(&self) -> usize {
        self.shifts.len() * self.angle_shifts.len()
    }

    /// Number of features per atom: `n_pairs * n_shifts * ndiv`
    pub fn size(&self) -> usize {
        self.pairs.len() * self.pair_size()
    }

    /// Compute the angular features of all atoms from the `trios` built on
    /// `duos` (which should only contain pairs inside the angular cutoff),
    /// their `geometry`, and the `species` of all atoms.
    ///
    /// Each unordered triplet appears twice in `trios`, the reduced sum is
    /// divided by two to count it only once.
    #[time_graph::instrument(name = "AngularSymmetryFunction::compute")]
    pub fn compute(
        &self,
        duos: &DuoIndex,
        trios: &TrioIndex,
        geometry: &TrioGeometry,
        species: ArrayView1<'_, usize>,
        backend: Backend,
    ) -> Result<Array2<T>, Error> {
        let n_trios = trios.len();
        if geometry.r_ij.len() != n_trios || geometry.r_ik.len() != n_trios || geometry.cos.len() != n_trios {
            return Err(Error::InvalidParameter(format!(
                "got geometry for {} triplets, but there are {} triplets",
                geometry.cos.len(), n_trios
            )));
        }

        let n_atoms = species.len();
        let num_elements = self.pairs.num_elements();

        let mut targets = Vec::with_capacity(n_trios);
        for (&first, &second) in trios.first.iter().zip(&trios.second) {
            if first >= duos.len() || second >= duos.len() {
                return Err(Error::InvalidParameter(
                    "triplets refer to pairs outside of the pair list".into()
                ));
            }

            let center = duos.centers[first];
            let j = duos.neighbors[first];
            let k = duos.neighbors[second];
            if center >= n_atoms || j >= n_atoms || k >= n_atoms {
                return Err(Error::InvalidParameter(format!(
                    "triplet ({}, {}, {}) refers to atoms outside of the {} atoms",
                    center, j, k, n_atoms
                )));
            }

            let (species_j, species_k) = (species[j], species[k]);
            if species_j >= num_elements || species_k >= num_elements {
                return Err(Error::InvalidParameter(format!(
                    "species {} or {} is out of range for {} elements",
                    species_j, species_k, num_elements
                )));
            }

            targets.push(center * self.pairs.len() + self.pairs.index(species_j, species_k));
        }
        let targets = Array1::from(targets);

        let mut peaks = Array2::from_elem((n_trios, self.pair_size()), T::zero());
        let zip = Zip::from(peaks.rows_mut())
            .and(&geometry.r_ij)
            .and(&geometry.r_ik)
            .and(&geometry.cos);

        let compute_peaks = |mut peaks: ndarray::ArrayViewMut1<T>, &r_ij: &f64, &r_ik: &f64, &cos: &f64| {
            let theta = T::from_f64_lossy(f64::acos(cos));
            let r_ij = T::from_f64_lossy(r_ij);
            let r_ik = T::from_f64_lossy(r_ik);

            let one = T::one();
            let two = one + one;
            let half = T::from_f64_lossy(0.5);

            let fc = self.cutoff.value(r_ij) * self.cutoff.value(r_ik);
            let mean_distance = half * (r_ij + r_ik);

            let mut peaks = peaks.iter_mut();
            for &shift in &self.shifts {
                let delta = mean_distance - shift;
                let radial = T::exp(-self.eta * delta * delta);
                for &angle_shift in &self.angle_shifts {
                    let angular = T::powf(half * (one + T::cos(theta - angle_shift)), self.zeta);
                    if let Some(peak) = peaks.next() {
                        *peak = two * angular * radial * fc;
                    }
                }
            }
        };

        if backend.is_parallel() {
            zip.par_for_each(compute_peaks);
        } else {
            zip.for_each(compute_peaks);
        }

        let mut features = scatter_add(peaks.view(), targets.view(), n_atoms * self.pairs.len(), backend)?
            .into_shape_with_order((n_atoms, self.size()))?;
        features /= T::from_f64_lossy(2.0);

        return Ok(features);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::{AtomicSystem, Batch, UnitCell, Vector3D};
    use crate::geometry::{pair_distances, pair_vectors, trio_geometry};
    use crate::neighbors::{neighbor_duos, neighbor_trios};
    use super::*;

    fn parameters() -> AngularParameters {
        AngularParameters {
            cutoff: 3.5, head: 0.9, tail: 3.5, step: 0.65, sigma: 0.5, zeta: 8.0, ndiv: 4,
        }
    }

    fn compute(system: AtomicSystem, num_elements: usize, backend: Backend) -> Array2<f64> {
        let batch = Batch::from_systems(&[system]).unwrap();
        let duos = neighbor_duos(&batch, parameters().cutoff, backend).unwrap();
        let vectors = pair_vectors(&batch, &duos, backend);
        let distances = pair_distances(vectors.view(), backend);
        let trios = neighbor_trios(&duos);
        let geometry = trio_geometry(vectors.view(), distances.view(), &trios, backend).unwrap();

        let angular = AngularSymmetryFunction::new(num_elements, parameters()).unwrap();
        return angular.compute(&duos, &trios, &geometry, batch.species(), backend).unwrap();
    }

    /// Contribution of a single unordered triplet, as computed by hand
    fn reference(r_ij: f64, r_ik: f64, theta: f64) -> Vec<f64> {
        let parameters = parameters();
        let cutoff = CosineCutoff::new(parameters.cutoff).unwrap();
        let eta = 1.0 / (parameters.sigma * parameters.sigma);

        let mut values = Vec::new();
        for rs in parameters.shifts() {
            for theta_s in parameters.angle_shifts() {
                let angular = f64::powf(0.5 * (1.0 + f64::cos(theta - theta_s)), parameters.zeta);
                let mean = 0.5 * (r_ij + r_ik) - rs;
                let radial = f64::exp(-eta * mean * mean);
                values.push(2.0 * angular * radial * cutoff.value(r_ij) * cutoff.value(r_ik));
            }
        }
        return values;
    }

    #[test]
    fn parameters_validation() {
        parameters().validate().unwrap();

        let shifts = parameters().angle_shifts();
        assert_eq!(shifts.len(), 4);
        assert_eq!(shifts[0], 0.0);
        assert_relative_eq!(shifts[2], std::f64::consts::FRAC_PI_2);

        let mut invalid = parameters();
        invalid.ndiv = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = parameters();
        invalid.zeta = -1.0;
        assert!(invalid.validate().is_err());

        let mut invalid = parameters();
        invalid.tail = invalid.head;
        assert!(invalid.validate().is_err());

        let json = r#"{"cutoff": 3.5, "head": 0.9, "tail": 3.5, "step": 0.65, "sigma": 0.5, "zeta": 8, "ndiv": 4, "other": 1}"#;
        assert!(serde_json::from_str::<AngularParameters>(json).is_err());
    }

    #[test]
    fn size() {
        let angular = AngularSymmetryFunction::<f64>::new(3, parameters()).unwrap();
        // 6 pairs of species, 4 radial shifts, 4 angular shifts
        assert_eq!(angular.pairs().len(), 6);
        assert_eq!(angular.size(), 6 * 4 * 4);
    }

    #[test]
    fn right_angle() {
        let mut system = AtomicSystem::new(UnitCell::infinite());
        system.add_atom(0, Vector3D::new(0.0, 0.0, 0.0));
        system.add_atom(0, Vector3D::new(1.0, 0.0, 0.0));
        system.add_atom(0, Vector3D::new(0.0, 1.0, 0.0));

        let features = compute(system, 1, Backend::Serial);
        assert_eq!(features.shape(), [3, 16]);

        let expected = reference(1.0, 1.0, std::f64::consts::FRAC_PI_2);
        for (value, expected) in features.row(0).iter().zip(&expected) {
            assert_relative_eq!(*value, *expected, max_relative = 1e-10);
        }

        let expected = reference(1.0, f64::sqrt(2.0), std::f64::consts::FRAC_PI_4);
        for (value, expected) in features.row(1).iter().zip(&expected) {
            assert_relative_eq!(*value, *expected, max_relative = 1e-10);
        }
    }

    #[test]
    fn three_neighbors() {
        let mut system = AtomicSystem::new(UnitCell::infinite());
        system.add_atom(0, Vector3D::new(0.0, 0.0, 0.0));
        system.add_atom(1, Vector3D::new(1.1, 0.0, 0.0));
        system.add_atom(1, Vector3D::new(0.0, 1.3, 0.0));
        system.add_atom(0, Vector3D::new(0.0, 0.0, 0.9));

        let features = compute(system.clone(), 2, Backend::Serial);

        // unordered pairs of neighbors around the first atom
        let positions = system.positions();
        let contribution = |j: usize, k: usize| {
            let v_ij = positions[j] - positions[0];
            let v_ik = positions[k] - positions[0];
            let cos = v_ij * v_ik / (v_ij.norm() * v_ik.norm());
            reference(v_ij.norm(), v_ik.norm(), f64::acos(cos))
        };

        let pairs = ElementPairs::new(2).unwrap();
        let n = 16;
        let mut expected = vec![0.0; 3 * n];
        for (j, k) in [(1, 2), (1, 3), (2, 3)] {
            let species = system.species();
            let offset = pairs.index(species[j], species[k]) * n;
            for (i, value) in contribution(j, k).into_iter().enumerate() {
                expected[offset + i] += value;
            }
        }

        for (value, expected) in features.row(0).iter().zip(&expected) {
            assert_relative_eq!(*value, *expected, max_relative = 1e-10);
        }
    }

    #[test]
    fn backends() {
        let mut system = AtomicSystem::new(UnitCell::cubic(4.0).unwrap());
        system.add_atom(0, Vector3D::new(0.0, 0.0, 0.0));
        system.add_atom(1, Vector3D::new(1.1, 0.3, 0.0));
        system.add_atom(1, Vector3D::new(0.2, 1.3, 2.0));

        let serial = compute(system.clone(), 2, Backend::Serial);
        let parallel = compute(system, 2, Backend::Parallel);
        assert_eq!(serial, parallel);
        assert!(serial.iter().any(|&v| v > 0.0));
    }

    #[test]
    fn isolated_atoms() {
        let mut system = AtomicSystem::new(UnitCell::infinite());
        system.add_atom(0, Vector3D::new(0.0, 0.0, 0.0));
        system.add_atom(0, Vector3D::new(1.0, 0.0, 0.0));

        // only one neighbor for each atom, no triplets
        let features = compute(system, 1, Backend::Serial);
        assert!(features.iter().all(|&v| v == 0.0));
    }
}
