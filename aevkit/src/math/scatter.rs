use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use rayon::prelude::*;

use crate::{Backend, Error, Real};

fn check_targets(targets: ArrayView1<'_, usize>, n_targets: usize) -> Result<(), Error> {
    if let Some((row, &target)) = targets.iter().enumerate().find(|(_, &t)| t >= n_targets) {
        return Err(Error::InvalidParameter(format!(
            "target {} for row {} is out of bounds for {} output rows",
            target, row, n_targets
        )));
    }
    return Ok(());
}

/// Sum the rows of `values` into `n_targets` output rows: output row `t` is
/// the sum of all `values[i]` with `targets[i] == t`.
///
/// Rows are always summed in their order in `values`, so the serial and
/// parallel backends give bit-identical results. The parallel backend sorts
/// rows by target (stable sort) and reduces each segment independently.
#[time_graph::instrument(name = "scatter_add")]
pub fn scatter_add<T: Real>(
    values: ArrayView2<'_, T>,
    targets: ArrayView1<'_, usize>,
    n_targets: usize,
    backend: Backend,
) -> Result<Array2<T>, Error> {
    if values.nrows() != targets.len() {
        return Err(Error::InvalidParameter(format!(
            "got {} rows of values but {} targets", values.nrows(), targets.len()
        )));
    }
    check_targets(targets, n_targets)?;

    let mut output = Array2::zeros((n_targets, values.ncols()));

    if backend.is_parallel() {
        let mut order = (0..targets.len()).collect::<Vec<_>>();
        order.par_sort_by_key(|&row| targets[row]);

        // start of the segment of each target in `order`
        let mut starts = vec![0; n_targets + 1];
        for &target in &targets {
            starts[target + 1] += 1;
        }
        for target in 0..n_targets {
            starts[target + 1] += starts[target];
        }

        Zip::indexed(output.rows_mut()).par_for_each(|target, mut output| {
            for &row in &order[starts[target]..starts[target + 1]] {
                output += &values.row(row);
            }
        });
    } else {
        for (row, &target) in targets.iter().enumerate() {
            let mut output = output.row_mut(target);
            output += &values.row(row);
        }
    }

    return Ok(output);
}

/// Gradient rule of [`scatter_add`]: given the gradient of some quantity with
/// respect to the output of `scatter_add`, compute the gradient with respect
/// to its `values`. Row `i` of the result is `output_gradient[targets[i]]`.
pub fn scatter_add_gradient<T: Real>(
    output_gradient: ArrayView2<'_, T>,
    targets: ArrayView1<'_, usize>,
    backend: Backend,
) -> Result<Array2<T>, Error> {
    check_targets(targets, output_gradient.nrows())?;

    let mut gradient = Array2::zeros((targets.len(), output_gradient.ncols()));
    let zip = Zip::from(gradient.rows_mut()).and(&targets);
    let gather = |mut gradient: ndarray::ArrayViewMut1<T>, &target: &usize| {
        gradient.assign(&output_gradient.row(target));
    };

    if backend.is_parallel() {
        zip.par_for_each(gather);
    } else {
        zip.for_each(gather);
    }

    return Ok(gradient);
}
