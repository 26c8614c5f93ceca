//! Atom-wise regression model predicting the energy of a system from the AEV
//! of its atoms. Only the forward evaluation is implemented; parameters come
//! from elsewhere.

mod activation;
pub use self::activation::Activation;

mod network;
pub use self::network::{AtomicNetwork, DenseLayer, ElementNetworks};

mod shifter;
pub use self::shifter::{composition, EnergyShifter};

mod energy;
pub use self::energy::EnergyModel;
