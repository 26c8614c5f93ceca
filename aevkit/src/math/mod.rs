//! Numerical building blocks shared by the symmetry functions and the energy
//! model.

mod cutoff;
pub use self::cutoff::CosineCutoff;

mod scatter;
pub use self::scatter::{scatter_add, scatter_add_gradient};

/// Evenly spaced values in `[start, stop)` with the given `step`, following
/// the semantic of `numpy.arange`: the number of values is `ceil((stop -
/// start) / step)`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let count = f64::ceil((stop - start) / step);
    if !(count > 0.0) {
        return Vec::new();
    }

    return (0..count as usize).map(|i| start + i as f64 * step).collect();
}
