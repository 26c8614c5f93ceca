use ndarray::{Array1, Array2, ArrayD, ArrayViewD, Axis, IxDyn, Slice};

use crate::Error;
use super::{affiliation_from_counts, counts_from_affiliation, counts_from_valid, valid_from_counts};

/// Per-system data concatenated along the first axis, with the affiliation of
/// each entry to its system.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesForm<T> {
    data: ArrayD<T>,
    affiliation: Array1<usize>,
}

/// Per-system data padded to the same number of entries, with shape
/// `(n_systems, max_entries, ...)` and a validity mask of shape `(n_systems,
/// max_entries)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelForm<T> {
    data: ArrayD<T>,
    valid: Array2<bool>,
}

/// The parallel form with the first two axes merged into one, of size
/// `n_systems * max_entries`. Validity and affiliation are flattened the same
/// way.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedForm<T> {
    data: ArrayD<T>,
    valid: Array1<bool>,
    affiliation: Array1<usize>,
}

/// Check that all arrays in `list` have at least one axis and the same shape
/// after the first axis, and return this trailing shape.
fn trailing_shape<T>(list: &[ArrayD<T>]) -> Result<Vec<usize>, Error> {
    let first = list.first().ok_or_else(|| Error::InvalidParameter(
        "can not create a batch from an empty list of arrays".into()
    ))?;

    if first.ndim() == 0 {
        return Err(Error::InvalidParameter(
            "arrays in a batch must have at least one dimension".into()
        ));
    }

    let trailing = first.shape()[1..].to_vec();
    for (system, array) in list.iter().enumerate() {
        if array.ndim() == 0 || array.shape()[1..] != trailing[..] {
            return Err(Error::InvalidParameter(format!(
                "array for system {} has shape {:?}, expected [_, {}]",
                system, array.shape(),
                trailing.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
            )));
        }
    }

    return Ok(trailing);
}

/// Stack `rows` along a new first axis, handling the empty case where the
/// shape can not be inferred from the rows.
fn stack_rows<T: Clone>(rows: &[ArrayViewD<'_, T>], trailing: &[usize]) -> Result<ArrayD<T>, Error> {
    if rows.is_empty() {
        let mut shape = vec![0];
        shape.extend_from_slice(trailing);
        return Ok(ArrayD::from_shape_vec(IxDyn(&shape), Vec::new())?);
    }
    return Ok(ndarray::stack(Axis(0), rows)?);
}

impl<T: Clone> SeriesForm<T> {
    /// Create a series form from existing `data` and `affiliation`
    pub fn new(data: ArrayD<T>, affiliation: Array1<usize>) -> Result<SeriesForm<T>, Error> {
        if data.ndim() == 0 || data.shape()[0] != affiliation.len() {
            return Err(Error::InvalidParameter(format!(
                "series data has shape {:?} but affiliation has {} entries",
                data.shape(), affiliation.len()
            )));
        }
        counts_from_affiliation(affiliation.view())?;

        return Ok(SeriesForm {
            data: data,
            affiliation: affiliation,
        });
    }

    /// Concatenate the arrays in `list` along their first axis. All systems
    /// must contain at least one entry.
    pub fn from_list(list: &[ArrayD<T>]) -> Result<SeriesForm<T>, Error> {
        trailing_shape(list)?;

        let mut counts = Vec::with_capacity(list.len());
        for (system, array) in list.iter().enumerate() {
            if array.shape()[0] == 0 {
                return Err(Error::InvalidParameter(format!(
                    "system {} has no entries, it can not be represented in a series", system
                )));
            }
            counts.push(array.shape()[0]);
        }

        let views = list.iter().map(|a| a.view()).collect::<Vec<_>>();
        let data = ndarray::concatenate(Axis(0), &views)?;

        return Ok(SeriesForm {
            data: data,
            affiliation: affiliation_from_counts(&counts),
        });
    }

    /// Gather the valid entries of a parallel form, in row-major order
    pub fn from_parallel(parallel: &ParallelForm<T>) -> Result<SeriesForm<T>, Error> {
        SeriesForm::from_list(&parallel.to_list()?)
    }

    /// Gather the valid entries of a flattened form
    pub fn from_flattened(flattened: &FlattenedForm<T>) -> Result<SeriesForm<T>, Error> {
        SeriesForm::from_list(&flattened.to_list()?)
    }

    /// Split this series back into one array per system
    pub fn to_list(&self) -> Result<Vec<ArrayD<T>>, Error> {
        let counts = counts_from_affiliation(self.affiliation.view())?;

        let mut list = Vec::with_capacity(counts.len());
        let mut start = 0;
        for count in counts {
            let system = self.data.slice_axis(Axis(0), Slice::from(start..start + count));
            list.push(system.to_owned());
            start += count;
        }

        return Ok(list);
    }
}

impl<T> SeriesForm<T> {
    /// Get the concatenated data
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Get the system affiliation of each entry
    pub fn affiliation(&self) -> &Array1<usize> {
        &self.affiliation
    }

    /// Number of systems in this series
    pub fn n_systems(&self) -> usize {
        self.affiliation.last().map_or(0, |&last| last + 1)
    }

    /// Split the series into its data and affiliation
    pub fn into_parts(self) -> (ArrayD<T>, Array1<usize>) {
        (self.data, self.affiliation)
    }
}

impl<T: Clone> ParallelForm<T> {
    /// Create a parallel form from existing `data` and `valid` mask
    pub fn new(data: ArrayD<T>, valid: Array2<bool>) -> Result<ParallelForm<T>, Error> {
        if data.ndim() < 2 || data.shape()[..2] != valid.shape()[..] {
            return Err(Error::InvalidParameter(format!(
                "parallel data has shape {:?} but validity mask has shape {:?}",
                data.shape(), valid.shape()
            )));
        }

        return Ok(ParallelForm {
            data: data,
            valid: valid,
        });
    }

    /// Pad all arrays in `list` to the same number of entries with `padding`
    pub fn from_list(list: &[ArrayD<T>], padding: T) -> Result<ParallelForm<T>, Error> {
        trailing_shape(list)?;
        let counts = list.iter().map(|a| a.shape()[0]).collect::<Vec<_>>();
        return ParallelForm::from_list_with_valid(list, valid_from_counts(&counts), padding);
    }

    /// Place the entries of each array in `list` at the valid positions of
    /// the corresponding row of `valid`, and fill the other positions with
    /// `padding`.
    ///
    /// This allows multiple arrays to share the same validity mask.
    pub fn from_list_with_valid(
        list: &[ArrayD<T>],
        valid: Array2<bool>,
        padding: T,
    ) -> Result<ParallelForm<T>, Error> {
        let trailing = trailing_shape(list)?;

        if valid.nrows() != list.len() {
            return Err(Error::InvalidParameter(format!(
                "validity mask contains {} systems, but got {} arrays",
                valid.nrows(), list.len()
            )));
        }

        let counts = counts_from_valid(valid.view());
        for (system, (array, &count)) in list.iter().zip(&counts).enumerate() {
            if array.shape()[0] != count {
                return Err(Error::InvalidParameter(format!(
                    "system {} has {} entries, but the validity mask contains {} valid entries",
                    system, array.shape()[0], count
                )));
            }
        }

        let mut shape = vec![valid.nrows(), valid.ncols()];
        shape.extend_from_slice(&trailing);
        let mut data = ArrayD::from_elem(IxDyn(&shape), padding);

        for (system, array) in list.iter().enumerate() {
            let mut system_data = data.index_axis_mut(Axis(0), system);
            let positions = valid.row(system).iter()
                .enumerate()
                .filter(|(_, &v)| v)
                .map(|(entry, _)| entry)
                .collect::<Vec<_>>();

            for (entry, value) in positions.into_iter().zip(array.outer_iter()) {
                system_data.index_axis_mut(Axis(0), entry).assign(&value);
            }
        }

        return Ok(ParallelForm {
            data: data,
            valid: valid,
        });
    }

    /// Pad the systems of a series form with `padding`
    pub fn from_series(series: &SeriesForm<T>, padding: T) -> Result<ParallelForm<T>, Error> {
        ParallelForm::from_list(&series.to_list()?, padding)
    }

    /// Split the first axis of a flattened form back into `(n_systems,
    /// max_entries)`
    pub fn from_flattened(flattened: &FlattenedForm<T>) -> Result<ParallelForm<T>, Error> {
        let counts = counts_from_affiliation(flattened.affiliation.view())?;
        let n_systems = counts.len();
        let max_entries = counts.first().copied().unwrap_or(0);

        let mut data_shape = vec![n_systems, max_entries];
        data_shape.extend_from_slice(&flattened.data.shape()[1..]);

        let data = flattened.data.as_standard_layout().into_owned();
        let data = data.into_shape_with_order(IxDyn(&data_shape))?;
        let valid = flattened.valid.clone().into_shape_with_order((n_systems, max_entries))?;

        return Ok(ParallelForm {
            data: data,
            valid: valid,
        });
    }

    /// Get the valid entries of each system as separate arrays
    pub fn to_list(&self) -> Result<Vec<ArrayD<T>>, Error> {
        let trailing = &self.data.shape()[2..];

        let mut list = Vec::with_capacity(self.valid.nrows());
        for (system_data, valid) in self.data.outer_iter().zip(self.valid.rows()) {
            let rows = system_data.outer_iter()
                .zip(valid)
                .filter(|(_, &v)| v)
                .map(|(row, _)| row)
                .collect::<Vec<_>>();
            list.push(stack_rows(&rows, trailing)?);
        }

        return Ok(list);
    }
}

impl<T> ParallelForm<T> {
    /// Get the padded data
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Get the validity mask
    pub fn valid(&self) -> &Array2<bool> {
        &self.valid
    }

    /// Number of systems in this parallel form
    pub fn n_systems(&self) -> usize {
        self.valid.nrows()
    }
}

impl<T: Clone> FlattenedForm<T> {
    /// Create a flattened form from existing data, validity and affiliation.
    ///
    /// The affiliation of a flattened form covers all entries (valid or not)
    /// and must correspond to `n_systems` systems with the same number of
    /// entries each.
    pub fn new(data: ArrayD<T>, valid: Array1<bool>, affiliation: Array1<usize>) -> Result<FlattenedForm<T>, Error> {
        if data.ndim() == 0 || data.shape()[0] != valid.len() || valid.len() != affiliation.len() {
            return Err(Error::InvalidParameter(format!(
                "flattened data has shape {:?}, validity has {} entries and affiliation has {} entries",
                data.shape(), valid.len(), affiliation.len()
            )));
        }

        let counts = counts_from_affiliation(affiliation.view())?;
        if let Some(&first) = counts.first() {
            if counts.iter().any(|&c| c != first) {
                return Err(Error::InvalidParameter(
                    "all systems in a flattened form must have the same number of entries".into()
                ));
            }
        }

        return Ok(FlattenedForm {
            data: data,
            valid: valid,
            affiliation: affiliation,
        });
    }

    /// Merge the first two axes of a parallel form
    pub fn from_parallel(parallel: &ParallelForm<T>) -> Result<FlattenedForm<T>, Error> {
        let shape = parallel.data.shape();
        let (n_systems, max_entries) = (shape[0], shape[1]);

        let mut data_shape = vec![n_systems * max_entries];
        data_shape.extend_from_slice(&shape[2..]);

        let data = parallel.data.as_standard_layout().into_owned();
        let data = data.into_shape_with_order(IxDyn(&data_shape))?;

        let valid = parallel.valid.iter().copied().collect::<Array1<bool>>();
        let affiliation = affiliation_from_counts(&vec![max_entries; n_systems]);

        return Ok(FlattenedForm {
            data: data,
            valid: valid,
            affiliation: affiliation,
        });
    }

    /// Pad and flatten the systems of a series form
    pub fn from_series(series: &SeriesForm<T>, padding: T) -> Result<FlattenedForm<T>, Error> {
        FlattenedForm::from_parallel(&ParallelForm::from_series(series, padding)?)
    }

    /// Get the valid entries of each system as separate arrays
    pub fn to_list(&self) -> Result<Vec<ArrayD<T>>, Error> {
        ParallelForm::from_flattened(self)?.to_list()
    }
}

impl<T> FlattenedForm<T> {
    /// Get the flattened data
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Get the validity of each entry
    pub fn valid(&self) -> &Array1<bool> {
        &self.valid
    }

    /// Get the system affiliation of each entry, valid or not
    pub fn affiliation(&self) -> &Array1<usize> {
        &self.affiliation
    }
}
