use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, Axis, Ix1, Ix2};

use crate::{AtomicSystem, Backend, Batch, Error, FlattenedForm, Real, SeriesForm};
use crate::geometry::{pair_distances, pair_vectors, trio_geometry};
use crate::neighbors::{neighbor_duos, neighbor_trios, DuoIndex};
use crate::symmetry::{AngularParameters, AngularSymmetryFunction};
use crate::symmetry::{RadialParameters, RadialSymmetryFunction};

/// Hyper-parameters of the atomic environment vectors
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AevParameters {
    /// Parameters of the radial block
    pub radial: RadialParameters,
    /// Parameters of the angular block
    pub angular: AngularParameters,
}

impl AevParameters {
    pub fn validate(&self) -> Result<(), Error> {
        self.radial.validate()?;
        self.angular.validate()?;
        return Ok(());
    }
}

/// Calculator for ANI-style atomic environment vectors (AEV).
///
/// The AEV of each atom is the concatenation of the radial block (of size
/// [`AevCalculator::radial_size`]) and the angular block (of size
/// [`AevCalculator::angular_size`]). Features are computed with the
/// precision `T`, which is usually `f32` or `f64`.
pub struct AevCalculator<T> {
    num_elements: usize,
    parameters: String,
    radial: RadialSymmetryFunction<T>,
    angular: AngularSymmetryFunction<T>,
}

impl<T> std::fmt::Debug for AevCalculator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AevCalculator")
            .field("num_elements", &self.num_elements)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Pairs selected inside a cutoff, with their vectors and distances
struct SelectedPairs {
    duos: DuoIndex,
    vectors: Array2<f64>,
    distances: Array1<f64>,
}

impl SelectedPairs {
    fn new(duos: &DuoIndex, vectors: ArrayView2<'_, f64>, distances: ArrayView1<'_, f64>, cutoff: f64) -> Result<SelectedPairs, Error> {
        let mask = distances.mapv(|distance| distance < cutoff);
        let selected = mask.iter().enumerate()
            .filter_map(|(duo, &keep)| if keep { Some(duo) } else { None })
            .collect::<Vec<_>>();

        return Ok(SelectedPairs {
            duos: duos.select(mask.view())?,
            vectors: Array2::from_shape_fn((selected.len(), 3), |(i, a)| vectors[[selected[i], a]]),
            distances: selected.iter().map(|&duo| distances[duo]).collect(),
        });
    }
}

impl<T: Real> AevCalculator<T> {
    /// Create a new calculator for systems containing `num_elements`
    /// different species
    pub fn new(num_elements: usize, parameters: AevParameters) -> Result<AevCalculator<T>, Error> {
        parameters.validate()?;

        return Ok(AevCalculator {
            num_elements: num_elements,
            parameters: serde_json::to_string(&parameters)?,
            radial: RadialSymmetryFunction::new(num_elements, parameters.radial)?,
            angular: AngularSymmetryFunction::new(num_elements, parameters.angular)?,
        });
    }

    /// Create a new calculator with parameters given as a JSON string
    pub fn from_json(num_elements: usize, parameters: &str) -> Result<AevCalculator<T>, Error> {
        let parameters = serde_json::from_str::<AevParameters>(parameters)?;
        return AevCalculator::new(num_elements, parameters);
    }

    /// Get the parameters used to create this calculator in a string,
    /// formatted as JSON.
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    /// Number of species this calculator was created for
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Total number of features per atom
    pub fn size(&self) -> usize {
        self.radial_size() + self.angular_size()
    }

    /// Number of features in the radial block
    pub fn radial_size(&self) -> usize {
        self.radial.size()
    }

    /// Number of features in the angular block
    pub fn angular_size(&self) -> usize {
        self.angular.size()
    }

    /// Compute the AEV of all atoms in the `batch`. The output contains one
    /// row per atom, in the same order as the atoms in the batch.
    #[time_graph::instrument(name = "AevCalculator::compute")]
    pub fn compute(&self, batch: &Batch, backend: Backend) -> Result<Array2<T>, Error> {
        batch.validate(self.num_elements)?;

        let cutoff = f64::max(self.radial.cutoff(), self.angular.cutoff());
        let duos = neighbor_duos(batch, cutoff, backend)?;
        let vectors = pair_vectors(batch, &duos, backend);
        let distances = pair_distances(vectors.view(), backend);

        let radial_pairs = SelectedPairs::new(&duos, vectors.view(), distances.view(), self.radial.cutoff())?;
        let angular_pairs = SelectedPairs::new(&duos, vectors.view(), distances.view(), self.angular.cutoff())?;

        let trios = neighbor_trios(&angular_pairs.duos);
        let geometry = trio_geometry(
            angular_pairs.vectors.view(),
            angular_pairs.distances.view(),
            &trios,
            backend,
        )?;

        log::debug!(
            "computing AEV for {} atoms in {} systems: {} radial pairs, {} angular pairs, {} triplets",
            batch.n_atoms(), batch.n_systems(), radial_pairs.duos.len(), angular_pairs.duos.len(), trios.len()
        );

        let radial = self.radial.compute(
            &radial_pairs.duos,
            radial_pairs.distances.view(),
            batch.species(),
            backend,
        )?;

        let angular = self.angular.compute(
            &angular_pairs.duos,
            &trios,
            &geometry,
            batch.species(),
            backend,
        )?;

        return Ok(ndarray::concatenate(Axis(1), &[radial.view(), angular.view()])?);
    }

    /// Compute the AEV of all atoms in a list of `systems`. The output
    /// contains the atoms of all systems one after the other.
    pub fn compute_systems(&self, systems: &[AtomicSystem], backend: Backend) -> Result<Array2<T>, Error> {
        let batch = Batch::from_systems(systems)?;
        return self.compute(&batch, backend);
    }

    /// Compute the AEV of systems given in flattened form: `cells` has shape
    /// `(n_systems, 3, 3)`, `positions` contains `(n_rows, 3)` positions and
    /// `species` `(n_rows)` species, with the same validity mask.
    ///
    /// The output uses the same flattened layout, and invalid rows are set
    /// to zero.
    pub fn compute_flattened(
        &self,
        cells: &Array3<f64>,
        positions: &FlattenedForm<f64>,
        species: &FlattenedForm<usize>,
        backend: Backend,
    ) -> Result<FlattenedForm<T>, Error> {
        if positions.valid() != species.valid() || positions.affiliation() != species.affiliation() {
            return Err(Error::InvalidParameter(
                "positions and species must share the same validity and affiliation".into()
            ));
        }

        let (positions_data, affiliation) = SeriesForm::from_flattened(positions)?.into_parts();
        let (species_data, _) = SeriesForm::from_flattened(species)?.into_parts();

        let batch = Batch::new(
            cells.clone(),
            positions_data.into_dimensionality::<Ix2>()?,
            species_data.into_dimensionality::<Ix1>()?,
            affiliation,
        )?;
        let aev = self.compute(&batch, backend)?;

        let valid = positions.valid();
        let mut output = Array2::zeros((valid.len(), self.size()));
        let mut atoms = aev.rows().into_iter();
        for (mut row, _) in output.rows_mut().into_iter().zip(valid).filter(|(_, &valid)| valid) {
            let atom = atoms.next().ok_or_else(|| Error::Internal(
                "fewer AEV rows than valid entries in the flattened form".into()
            ))?;
            row.assign(&atom);
        }

        return FlattenedForm::new(output.into_dyn(), valid.clone(), positions.affiliation().clone());
    }
}
