use ndarray::{Array2, ArrayView1, Zip};

use crate::{Backend, Error, Real};
use crate::math::{arange, scatter_add, CosineCutoff};
use crate::neighbors::DuoIndex;

/// Parameters of the radial symmetry functions
/// `G = 1/4 exp(-η (r - Rs)²) fc(r)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RadialParameters {
    /// Cutoff radius `Rc` (in Å)
    pub cutoff: f64,
    /// First radial shift `Rs`
    pub head: f64,
    /// Upper bound (excluded) of the radial shifts
    pub tail: f64,
    /// Spacing between radial shifts
    pub step: f64,
    /// Width of the gaussians, `η = 1 / σ²`
    pub sigma: f64,
}

impl RadialParameters {
    pub fn validate(&self) -> Result<(), Error> {
        validate_shifts("radial", self.head, self.tail, self.step)?;
        validate_positive("radial sigma", self.sigma)?;
        CosineCutoff::new(self.cutoff)?;
        return Ok(());
    }

    /// Radial shifts `Rs`, as `arange(head, tail, step)`
    pub fn shifts(&self) -> Vec<f64> {
        arange(self.head, self.tail, self.step)
    }
}

pub(super) fn validate_positive(name: &str, value: f64) -> Result<(), Error> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "{} must be a positive finite number, got {}", name, value
        )));
    }
    return Ok(());
}

pub(super) fn validate_shifts(kind: &str, head: f64, tail: f64, step: f64) -> Result<(), Error> {
    if !(head.is_finite() && tail.is_finite()) {
        return Err(Error::InvalidParameter(format!(
            "{} shifts head and tail must be finite, got {} and {}", kind, head, tail
        )));
    }
    validate_positive(&format!("{} shifts step", kind), step)?;

    if arange(head, tail, step).is_empty() {
        return Err(Error::InvalidParameter(format!(
            "{} shifts are empty: head ({}) must be smaller than tail ({})", kind, head, tail
        )));
    }
    return Ok(());
}

/// Radial part of the atomic environment vectors.
///
/// For each atom `i`, the features are indexed by the species of the
/// neighbor and by the radial shift: the block for species `e` starts at
/// `e * n_shifts`.
#[derive(Debug, Clone)]
pub struct RadialSymmetryFunction<T> {
    num_elements: usize,
    parameters: RadialParameters,
    cutoff: CosineCutoff,
    eta: T,
    shifts: Vec<T>,
}

impl<T: Real> RadialSymmetryFunction<T> {
    pub fn new(num_elements: usize, parameters: RadialParameters) -> Result<Self, Error> {
        if num_elements == 0 {
            return Err(Error::InvalidParameter(
                "the number of elements must be at least 1".into()
            ));
        }
        parameters.validate()?;

        return Ok(RadialSymmetryFunction {
            num_elements: num_elements,
            parameters: parameters,
            cutoff: CosineCutoff::new(parameters.cutoff)?,
            eta: T::from_f64_lossy(1.0 / (parameters.sigma * parameters.sigma)),
            shifts: parameters.shifts().into_iter().map(T::from_f64_lossy).collect(),
        });
    }

    /// Get the parameters used to create this function
    pub fn parameters(&self) -> &RadialParameters {
        &self.parameters
    }

    /// Cutoff radius of this function
    pub fn cutoff(&self) -> f64 {
        self.parameters.cutoff
    }

    /// Number of features per atom: `num_elements * n_shifts`
    pub fn size(&self) -> usize {
        self.num_elements * self.shifts.len()
    }

    /// Compute the radial features of all atoms, given the pairs `duos`
    /// (which should only contain pairs inside the cutoff), their
    /// `distances`, and the `species` of all atoms.
    ///
    /// The output has one row per atom, and atoms without neighbors get a
    /// row of zeros.
    #[time_graph::instrument(name = "RadialSymmetryFunction::compute")]
    pub fn compute(
        &self,
        duos: &DuoIndex,
        distances: ArrayView1<'_, f64>,
        species: ArrayView1<'_, usize>,
        backend: Backend,
    ) -> Result<Array2<T>, Error> {
        if distances.len() != duos.len() {
            return Err(Error::InvalidParameter(format!(
                "got {} distances for {} pairs", distances.len(), duos.len()
            )));
        }

        let n_atoms = species.len();
        let n_shifts = self.shifts.len();

        let mut peaks = Array2::from_elem((duos.len(), n_shifts), T::zero());
        let zip = Zip::from(peaks.rows_mut()).and(&distances);
        let compute_peaks = |mut peaks: ndarray::ArrayViewMut1<T>, &distance: &f64| {
            let r = T::from_f64_lossy(distance);
            let fc = self.cutoff.value(r);
            let quarter = T::from_f64_lossy(0.25);
            for (peak, &shift) in peaks.iter_mut().zip(&self.shifts) {
                let delta = r - shift;
                *peak = quarter * T::exp(-self.eta * delta * delta) * fc;
            }
        };

        if backend.is_parallel() {
            zip.par_for_each(compute_peaks);
        } else {
            zip.for_each(compute_peaks);
        }

        let mut targets = Vec::with_capacity(duos.len());
        for (&center, &neighbor) in duos.centers.iter().zip(&duos.neighbors) {
            if center >= n_atoms || neighbor >= n_atoms {
                return Err(Error::InvalidParameter(format!(
                    "pair ({}, {}) refers to atoms outside of the {} atoms",
                    center, neighbor, n_atoms
                )));
            }
            targets.push(center * self.num_elements + species[neighbor]);
        }
        let targets = ndarray::Array1::from(targets);

        let scattered = scatter_add(peaks.view(), targets.view(), n_atoms * self.num_elements, backend)?;
        let features = scattered.into_shape_with_order((n_atoms, self.size()))?;

        return Ok(features);
    }
}
