use crate::{Error, Real};

/// Cosine cutoff function `fc(r) = 1/2 (cos(π r / Rc) + 1)` for `r < Rc`,
/// and 0 after the cutoff radius `Rc`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineCutoff {
    /// cutoff radius
    pub radius: f64,
}

impl CosineCutoff {
    /// Create a new cutoff function with the given `radius`
    pub fn new(radius: f64) -> Result<CosineCutoff, Error> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "cutoff radius must be a positive finite number, got {}", radius
            )));
        }
        return Ok(CosineCutoff { radius: radius });
    }

    /// Evaluate the cutoff function at the distance `r`
    #[inline]
    pub fn value<T: Real>(&self, r: T) -> T {
        let radius = T::from_f64_lossy(self.radius);
        if r >= radius {
            return T::zero();
        }

        let half = T::from_f64_lossy(0.5);
        let s = T::from_f64_lossy(std::f64::consts::PI) * r / radius;
        return half * (T::cos(s) + T::one());
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn values() {
        let cutoff = CosineCutoff::new(4.0).unwrap();

        assert_eq!(cutoff.value(0.0), 1.0);
        assert_relative_eq!(cutoff.value(2.0), 0.5, epsilon = 1e-15);
        assert_eq!(cutoff.value(4.0), 0.0);
        assert_eq!(cutoff.value(5.0), 0.0);
        assert!(cutoff.value(4.0 - 1e-6) > 0.0);

        // continuous at the cutoff radius
        let mut previous = cutoff.value(4.0 - 1e-2);
        for epsilon in [1e-3, 1e-4, 1e-5, 1e-6] {
            let current = cutoff.value(4.0 - epsilon);
            assert!(current > 0.0 && current < previous);
            previous = current;
        }
        assert!(previous < 1e-11);

        assert_relative_eq!(cutoff.value(1.0_f32), cutoff.value(1.0_f64) as f32, epsilon = 1e-6);
    }

    #[test]
    fn invalid() {
        assert!(CosineCutoff::new(0.0).is_err());
        assert!(CosineCutoff::new(-3.0).is_err());
        assert!(CosineCutoff::new(f64::INFINITY).is_err());
    }
}
