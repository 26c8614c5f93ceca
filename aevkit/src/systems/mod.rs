//! Atomic systems, and their batched representation.

mod cell;
pub use self::cell::{UnitCell, CellShape};

mod atomic_system;
pub use self::atomic_system::AtomicSystem;

mod elements;
pub use self::elements::ElementTable;

mod batch;
pub use self::batch::Batch;

mod vasprun;
pub use self::vasprun::{read_vasprun, parse_vasprun, TrainingRecord};

mod chemfiles;
pub use self::chemfiles::read_from_file;

#[cfg(test)]
pub(crate) mod test_utils;
