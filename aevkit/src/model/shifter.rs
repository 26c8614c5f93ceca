use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{Batch, Error};

/// Linear baseline of the energy as a function of the composition:
/// `E = Σ_e n_e w_e + b`, where `n_e` is the number of atoms of species `e`
/// in the system.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyShifter {
    weights: Array1<f64>,
    intercept: f64,
}

/// Number of atoms of each species in each system, with shape `(n_systems,
/// num_elements)`
pub fn composition(batch: &Batch, num_elements: usize) -> Result<Array2<f64>, Error> {
    batch.validate(num_elements)?;

    let mut counts = Array2::zeros((batch.n_systems(), num_elements));
    for (&species, &system) in batch.species().iter().zip(batch.affiliation()) {
        counts[[system, species]] += 1.0;
    }
    return Ok(counts);
}

impl EnergyShifter {
    pub fn new(weights: Array1<f64>, intercept: f64) -> Result<EnergyShifter, Error> {
        if weights.is_empty() {
            return Err(Error::InvalidParameter(
                "energy shifter needs at least one element".into()
            ));
        }

        if !weights.iter().all(|w| w.is_finite()) || !intercept.is_finite() {
            return Err(Error::InvalidParameter(
                "energy shifter weights and intercept must be finite".into()
            ));
        }

        return Ok(EnergyShifter {
            weights: weights,
            intercept: intercept,
        });
    }

    /// Fit the baseline on the `energies` of systems with the given
    /// `composition` (as computed by [`composition`]) with ordinary least
    /// squares. When the compositions do not determine the weights uniquely,
    /// the minimal norm solution is used.
    #[time_graph::instrument(name = "EnergyShifter::fit")]
    pub fn fit(composition: ArrayView2<'_, f64>, energies: ArrayView1<'_, f64>) -> Result<EnergyShifter, Error> {
        let (n_systems, num_elements) = composition.dim();
        if n_systems != energies.len() {
            return Err(Error::InvalidParameter(format!(
                "got {} compositions but {} energies", n_systems, energies.len()
            )));
        }

        if n_systems == 0 || num_elements == 0 {
            return Err(Error::InvalidParameter(
                "can not fit the energy shifter without data".into()
            ));
        }

        // the last column fits the intercept
        let design = DMatrix::from_fn(n_systems, num_elements + 1, |i, j| {
            if j == num_elements { 1.0 } else { composition[[i, j]] }
        });
        let target = DVector::from_iterator(n_systems, energies.iter().copied());

        let solution = design.svd(true, true)
            .solve(&target, 1e-10)
            .map_err(|e| Error::Internal(format!("least squares failed: {}", e)))?;

        let weights = (0..num_elements).map(|e| solution[e]).collect::<Array1<f64>>();
        let intercept = solution[num_elements];
        log::debug!("fitted energy shifter with weights {} and intercept {}", weights, intercept);

        return EnergyShifter::new(weights, intercept);
    }

    pub fn num_elements(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Baseline energy of all systems in the `batch`
    pub fn energies(&self, batch: &Batch) -> Result<Array1<f64>, Error> {
        let counts = composition(batch, self.num_elements())?;
        return Ok(counts.dot(&self.weights) + self.intercept);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2};

    use crate::systems::test_utils::test_systems;
    use super::*;

    #[test]
    fn composition_counts() {
        let batch = Batch::from_systems(&test_systems(&["water", "methane", "CH"])).unwrap();
        let counts = composition(&batch, 3).unwrap();
        assert_eq!(counts, arr2(&[[2.0, 0.0, 1.0], [4.0, 1.0, 0.0], [1.0, 1.0, 0.0]]));

        assert!(composition(&batch, 2).is_err());
    }

    #[test]
    fn exact_fit() {
        let composition = arr2(&[
            [2.0, 0.0, 1.0],
            [4.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 2.0, 2.0],
            [3.0, 1.0, 1.0],
        ]);
        let weights = arr1(&[-0.5, -37.8, -75.0]);
        let energies = composition.dot(&weights) + 1.5;

        let shifter = EnergyShifter::fit(composition.view(), energies.view()).unwrap();
        assert_relative_eq!(shifter.weights(), weights.view(), epsilon = 1e-8);
        assert_relative_eq!(shifter.intercept(), 1.5, epsilon = 1e-8);
    }

    #[test]
    fn baseline_energies() {
        let shifter = EnergyShifter::new(arr1(&[-0.5, -37.8, -75.0]), 2.0).unwrap();
        let batch = Batch::from_systems(&test_systems(&["water", "CH"])).unwrap();
        let energies = shifter.energies(&batch).unwrap();
        assert_relative_eq!(energies, arr1(&[-1.0 - 75.0 + 2.0, -0.5 - 37.8 + 2.0]), epsilon = 1e-12);
    }

    #[test]
    fn invalid() {
        assert!(EnergyShifter::new(arr1(&[]), 0.0).is_err());
        assert!(EnergyShifter::new(arr1(&[1.0]), f64::NAN).is_err());

        let composition = arr2(&[[1.0, 2.0]]);
        assert!(EnergyShifter::fit(composition.view(), arr1(&[1.0, 2.0]).view()).is_err());
    }
}
