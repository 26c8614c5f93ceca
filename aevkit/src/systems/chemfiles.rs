use std::path::Path;

use super::{AtomicSystem, ElementTable};
use crate::Error;

#[cfg(feature = "chemfiles")]
impl From<chemfiles::Error> for Error {
    fn from(error: chemfiles::Error) -> Error {
        Error::Chemfiles(error.message)
    }
}

/// Read all structures in the file at the given `path` using
/// [chemfiles](https://chemfiles.org/), and convert them to `AtomicSystem`s.
/// The atomic type of each atom (usually the element symbol) is converted to
/// a species with `elements`.
///
/// This function can read all [formats supported by
/// chemfiles](https://chemfiles.org/chemfiles/latest/formats.html).
#[cfg(feature = "chemfiles")]
#[allow(clippy::needless_range_loop)]
pub fn read_from_file(path: impl AsRef<Path>, elements: &ElementTable) -> Result<Vec<AtomicSystem>, Error> {
    use crate::Matrix3;
    use crate::systems::UnitCell;

    let mut systems = Vec::new();

    let mut trajectory = chemfiles::Trajectory::open(path, 'r')?;
    let mut frame = chemfiles::Frame::new();

    for _ in 0..trajectory.nsteps() {
        trajectory.read(&mut frame)?;

        let positions = frame.positions();

        let cell = if frame.cell().shape() == chemfiles::CellShape::Infinite {
            UnitCell::infinite()
        } else {
            // transpose since chemfiles is using columns for the cell vectors and
            // we want rows as cell vectors
            UnitCell::try_from(Matrix3::from(frame.cell().matrix()).transposed())?
        };

        let mut system = AtomicSystem::new(cell);
        for i in 0..frame.size() {
            let species = elements.species(&frame.atom(i).atomic_type())?;
            system.add_atom(species, positions[i].into());
        }

        systems.push(system);
    }

    return Ok(systems);
}

/// Read all structures in the file at the given `path` using
/// [chemfiles](https://chemfiles.org/), and convert them to `AtomicSystem`s.
///
/// This function can read all [formats supported by
/// chemfiles](https://chemfiles.org/chemfiles/latest/formats.html).
#[cfg(not(feature = "chemfiles"))]
pub fn read_from_file(_: impl AsRef<Path>, _: &ElementTable) -> Result<Vec<AtomicSystem>, Error> {
    Err(Error::Chemfiles(
        "read_from_file is only available with the chemfiles feature enabled".into()
    ))
}
