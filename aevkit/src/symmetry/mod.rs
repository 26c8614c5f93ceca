//! ANI-style symmetry functions: the radial and angular blocks of the atomic
//! environment vectors.

mod pairs;
pub use self::pairs::ElementPairs;

mod radial;
pub use self::radial::{RadialParameters, RadialSymmetryFunction};

mod angular;
pub use self::angular::{AngularParameters, AngularSymmetryFunction};
