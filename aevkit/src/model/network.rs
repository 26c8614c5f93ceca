use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

use crate::{Backend, Error, Real};
use super::Activation;

/// Fully connected layer `y = x W^T + b`
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer<T> {
    /// weights, with shape `(n_outputs, n_inputs)`
    weights: Array2<T>,
    /// bias, with shape `(n_outputs)`
    bias: Array1<T>,
}

impl<T: Real> DenseLayer<T> {
    pub fn new(weights: Array2<T>, bias: Array1<T>) -> Result<DenseLayer<T>, Error> {
        if weights.nrows() != bias.len() {
            return Err(Error::InvalidParameter(format!(
                "dense layer has {} outputs in the weights but {} in the bias",
                weights.nrows(), bias.len()
            )));
        }

        if weights.is_empty() {
            return Err(Error::InvalidParameter(
                "dense layer must have at least one input and one output".into()
            ));
        }

        return Ok(DenseLayer {
            weights: weights,
            bias: bias,
        });
    }

    pub fn n_inputs(&self) -> usize {
        self.weights.ncols()
    }

    pub fn n_outputs(&self) -> usize {
        self.weights.nrows()
    }

    /// Apply this layer to all the rows of `input`
    pub fn forward(&self, input: ArrayView2<'_, T>) -> Result<Array2<T>, Error> {
        if input.ncols() != self.n_inputs() {
            return Err(Error::InvalidParameter(format!(
                "got input with {} features, but the layer expects {} inputs",
                input.ncols(), self.n_inputs()
            )));
        }

        let mut output = input.dot(&self.weights.t());
        output += &self.bias;
        return Ok(output);
    }
}

/// Stack of dense layers for the atoms of a single element. The activation is
/// applied before every layer except the first one: `h = L0(x)`, then `h =
/// Lk(act(h))`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicNetwork<T> {
    layers: Vec<DenseLayer<T>>,
    activation: Activation,
}

impl<T: Real> AtomicNetwork<T> {
    pub fn new(layers: Vec<DenseLayer<T>>, activation: Activation) -> Result<AtomicNetwork<T>, Error> {
        if layers.is_empty() {
            return Err(Error::InvalidParameter(
                "atomic network must contain at least one layer".into()
            ));
        }

        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].n_outputs() != pair[1].n_inputs() {
                return Err(Error::InvalidParameter(format!(
                    "layer {} has {} outputs, but layer {} expects {} inputs",
                    i, pair[0].n_outputs(), i + 1, pair[1].n_inputs()
                )));
            }
        }

        return Ok(AtomicNetwork {
            layers: layers,
            activation: activation,
        });
    }

    pub fn n_inputs(&self) -> usize {
        self.layers[0].n_inputs()
    }

    pub fn n_outputs(&self) -> usize {
        self.layers[self.layers.len() - 1].n_outputs()
    }

    pub fn layers(&self) -> &[DenseLayer<T>] {
        &self.layers
    }

    pub fn forward(&self, input: ArrayView2<'_, T>) -> Result<Array2<T>, Error> {
        let mut hidden = self.layers[0].forward(input)?;
        for layer in &self.layers[1..] {
            self.activation.apply(&mut hidden);
            hidden = layer.forward(hidden.view())?;
        }
        return Ok(hidden);
    }
}

/// One [`AtomicNetwork`] per element, applied to the AEV of the atoms of the
/// corresponding species.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNetworks<T> {
    networks: Vec<AtomicNetwork<T>>,
}

impl<T: Real> ElementNetworks<T> {
    /// Create a new set of networks, where `networks[e]` is used for atoms
    /// with species `e`. All networks must have the same number of inputs and
    /// outputs.
    pub fn new(networks: Vec<AtomicNetwork<T>>) -> Result<ElementNetworks<T>, Error> {
        let first = networks.first().ok_or_else(|| Error::InvalidParameter(
            "need at least one atomic network".into()
        ))?;

        let (n_inputs, n_outputs) = (first.n_inputs(), first.n_outputs());
        for (species, network) in networks.iter().enumerate() {
            if network.n_inputs() != n_inputs || network.n_outputs() != n_outputs {
                return Err(Error::InvalidParameter(format!(
                    "network for species {} has shape {} -> {}, expected {} -> {}",
                    species, network.n_inputs(), network.n_outputs(), n_inputs, n_outputs
                )));
            }
        }

        return Ok(ElementNetworks { networks: networks });
    }

    pub fn num_elements(&self) -> usize {
        self.networks.len()
    }

    pub fn n_inputs(&self) -> usize {
        self.networks[0].n_inputs()
    }

    pub fn n_outputs(&self) -> usize {
        self.networks[0].n_outputs()
    }

    /// Evaluate the network of each atom's species on its row of `aev`. The
    /// output has one row per atom, in the same order as the input.
    #[time_graph::instrument(name = "ElementNetworks::forward")]
    pub fn forward(&self, aev: ArrayView2<'_, T>, species: ArrayView1<'_, usize>, backend: Backend) -> Result<Array2<T>, Error> {
        if aev.nrows() != species.len() {
            return Err(Error::InvalidParameter(format!(
                "got {} AEV rows but {} species", aev.nrows(), species.len()
            )));
        }

        if aev.ncols() != self.n_inputs() {
            return Err(Error::InvalidParameter(format!(
                "got AEV with {} features, but the networks expect {} inputs",
                aev.ncols(), self.n_inputs()
            )));
        }

        if let Some((atom, &s)) = species.iter().enumerate().find(|(_, &s)| s >= self.networks.len()) {
            return Err(Error::InvalidParameter(format!(
                "species {} of atom {} does not have a network", s, atom
            )));
        }

        let run = |(element, network): (usize, &AtomicNetwork<T>)| -> Result<(Vec<usize>, Array2<T>), Error> {
            let atoms = species.iter().enumerate()
                .filter_map(|(atom, &s)| if s == element { Some(atom) } else { None })
                .collect::<Vec<_>>();

            let input = Array2::from_shape_fn((atoms.len(), aev.ncols()), |(i, f)| aev[[atoms[i], f]]);
            let output = if atoms.is_empty() {
                Array2::zeros((0, network.n_outputs()))
            } else {
                network.forward(input.view())?
            };
            Ok((atoms, output))
        };

        let per_element: Vec<(Vec<usize>, Array2<T>)> = if backend.is_parallel() {
            self.networks.par_iter().enumerate().map(run).collect::<Result<_, Error>>()?
        } else {
            self.networks.iter().enumerate().map(run).collect::<Result<_, Error>>()?
        };

        let mut output = Array2::zeros((aev.nrows(), self.n_outputs()));
        for (atoms, values) in per_element {
            for (&atom, row) in atoms.iter().zip(values.rows()) {
                output.row_mut(atom).assign(&row);
            }
        }

        return Ok(output);
    }
}
