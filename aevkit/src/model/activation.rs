use ndarray::Array2;

use crate::{Error, Real};

/// Activation function applied between the layers of an [`AtomicNetwork`].
///
/// [`AtomicNetwork`]: super::AtomicNetwork
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    /// `f(x) = exp(-x²)`
    Gaussian,
    /// Continuously differentiable exponential linear unit,
    /// `f(x) = max(0, x) + min(0, α (exp(x / α) - 1))`
    Celu {
        alpha: f64,
    },
}

impl Activation {
    /// Create a CELU activation, checking that `alpha` is strictly positive
    pub fn celu(alpha: f64) -> Result<Activation, Error> {
        if !(alpha > 0.0 && alpha.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "CELU alpha must be a positive finite number, got {}", alpha
            )));
        }
        return Ok(Activation::Celu { alpha: alpha });
    }

    /// Evaluate the activation function at `x`
    #[inline]
    pub fn value<T: Real>(&self, x: T) -> T {
        match *self {
            Activation::Gaussian => T::exp(-x * x),
            Activation::Celu { alpha } => {
                if x > T::zero() {
                    x
                } else {
                    let alpha = T::from_f64_lossy(alpha);
                    alpha * T::exp_m1(x / alpha)
                }
            }
        }
    }

    /// Apply the activation function to all entries of `values`
    pub fn apply<T: Real>(&self, values: &mut Array2<T>) {
        values.mapv_inplace(|x| self.value(x));
    }
}
