//! Conversions between the different memory layouts of ragged per-system
//! data.
//!
//! A batch of systems with `N_i` atoms each can be stored in four forms:
//!
//! - the **list** form is a `Vec<ArrayD<T>>`, one array per system, each with
//!   `N_i` entries along the first axis;
//! - the **series** form ([`SeriesForm`]) concatenates all systems along the
//!   first axis, and keeps track of the system of each entry with an
//!   *affiliation* array;
//! - the **parallel** form ([`ParallelForm`]) pads all systems to the same
//!   number of entries `max(N_i)`, with a boolean *validity* mask of shape
//!   `(n_systems, max(N_i))`;
//! - the **flattened** form ([`FlattenedForm`]) is the parallel form with the
//!   first two axes merged, keeping both validity and affiliation.
//!
//! The per-atom computations in this crate run on the series form, the other
//! forms are conversions at the boundary.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::Error;

mod forms;
pub use self::forms::{SeriesForm, ParallelForm, FlattenedForm};

/// Create the affiliation array of a series made of systems with `counts[i]`
/// entries each.
pub fn affiliation_from_counts(counts: &[usize]) -> Array1<usize> {
    let total = counts.iter().sum();
    let mut affiliation = Vec::with_capacity(total);
    for (system, &count) in counts.iter().enumerate() {
        affiliation.extend(std::iter::repeat(system).take(count));
    }
    return Array1::from(affiliation);
}

/// Get the number of entries of each system from an `affiliation` array.
///
/// The affiliation must be non-decreasing, start at 0, and use all values in
/// `0..n_systems`.
pub fn counts_from_affiliation(affiliation: ArrayView1<'_, usize>) -> Result<Vec<usize>, Error> {
    let mut counts: Vec<usize> = Vec::new();
    for (entry, &system) in affiliation.iter().enumerate() {
        if system == counts.len() {
            counts.push(1);
        } else if system + 1 == counts.len() {
            counts[system] += 1;
        } else {
            return Err(Error::InvalidParameter(format!(
                "affiliation must be a sorted and contiguous range starting at 0, \
                got system {} for entry {} after system {}",
                system, entry, counts.len() as isize - 1
            )));
        }
    }
    return Ok(counts);
}

/// Create the validity mask of a parallel form made of systems with
/// `counts[i]` entries each. The mask has shape `(n_systems, max(counts))`.
pub fn valid_from_counts(counts: &[usize]) -> Array2<bool> {
    let max_count = counts.iter().copied().max().unwrap_or(0);
    return Array2::from_shape_fn((counts.len(), max_count), |(system, entry)| {
        entry < counts[system]
    });
}

/// Create the validity mask corresponding to an `affiliation` array
pub fn valid_from_affiliation(affiliation: ArrayView1<'_, usize>) -> Result<Array2<bool>, Error> {
    let counts = counts_from_affiliation(affiliation)?;
    return Ok(valid_from_counts(&counts));
}

/// Create the affiliation of the valid entries in a validity mask, in
/// row-major order.
pub fn affiliation_from_valid(valid: ArrayView2<'_, bool>) -> Array1<usize> {
    let counts = counts_from_valid(valid);
    return affiliation_from_counts(&counts);
}

/// Number of valid entries in each row of a validity mask
pub(crate) fn counts_from_valid(valid: ArrayView2<'_, bool>) -> Vec<usize> {
    valid.rows().into_iter()
        .map(|row| row.iter().filter(|&&v| v).count())
        .collect()
}
