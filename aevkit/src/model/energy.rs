use ndarray::{Array1, Axis};

use crate::{AevCalculator, Backend, Batch, Error, Real};
use crate::math::scatter_add;
use super::{ElementNetworks, EnergyShifter};

/// Total energy model: per-atom energies predicted by [`ElementNetworks`]
/// from the AEV of each atom, summed over each system, plus the
/// composition baseline of an [`EnergyShifter`].
#[derive(Debug)]
pub struct EnergyModel<T> {
    calculator: AevCalculator<T>,
    networks: ElementNetworks<T>,
    shifter: EnergyShifter,
}

impl<T: Real> EnergyModel<T> {
    pub fn new(calculator: AevCalculator<T>, networks: ElementNetworks<T>, shifter: EnergyShifter) -> Result<EnergyModel<T>, Error> {
        let num_elements = calculator.num_elements();
        if networks.num_elements() != num_elements || shifter.num_elements() != num_elements {
            return Err(Error::InvalidParameter(format!(
                "the calculator uses {} elements, but there are {} networks and {} shifter weights",
                num_elements, networks.num_elements(), shifter.num_elements()
            )));
        }

        if networks.n_inputs() != calculator.size() {
            return Err(Error::InvalidParameter(format!(
                "the networks expect {} inputs, but the AEV contains {} features",
                networks.n_inputs(), calculator.size()
            )));
        }

        if networks.n_outputs() != 1 {
            return Err(Error::InvalidParameter(format!(
                "the networks must predict a single atomic energy, got {} outputs",
                networks.n_outputs()
            )));
        }

        return Ok(EnergyModel {
            calculator: calculator,
            networks: networks,
            shifter: shifter,
        });
    }

    pub fn calculator(&self) -> &AevCalculator<T> {
        &self.calculator
    }

    pub fn networks(&self) -> &ElementNetworks<T> {
        &self.networks
    }

    pub fn shifter(&self) -> &EnergyShifter {
        &self.shifter
    }

    /// Atomic energies predicted by the networks, without the baseline
    pub fn atomic_energies(&self, batch: &Batch, backend: Backend) -> Result<Array1<T>, Error> {
        let aev = self.calculator.compute(batch, backend)?;
        let atomic = self.networks.forward(aev.view(), batch.species(), backend)?;
        return Ok(atomic.index_axis_move(Axis(1), 0));
    }

    /// Energy of all systems in the `batch`
    #[time_graph::instrument(name = "EnergyModel::energies")]
    pub fn energies(&self, batch: &Batch, backend: Backend) -> Result<Array1<f64>, Error> {
        let atomic = self.atomic_energies(batch, backend)?.insert_axis(Axis(1));
        let per_system = scatter_add(atomic.view(), batch.affiliation(), batch.n_systems(), backend)?;

        let mut energies = self.shifter.energies(batch)?;
        for (energy, network) in energies.iter_mut().zip(per_system.column(0)) {
            *energy += network.to_f64_lossy();
        }

        return Ok(energies);
    }
}
