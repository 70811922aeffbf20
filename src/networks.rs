//! Executable neural networks, decoded one-shot from genomes.
//!
//! A [`Network`] is the interface between the evolutionary core and
//! the user's fitness evaluator: the driver decodes each genome and
//! hands the resulting network to the evaluator. Networks support
//! recurrent links; activation is a synchronous sweep repeated until
//! the values settle.

mod nodes;

pub use nodes::{identity, steepened_sigmoid, Activation, NeuronKind, DEFAULT_ACTIVATION};

use std::fmt;

/// Reserved network id of the bias neuron.
pub const BIAS_ID: usize = 0;

/// Upper bound on activation sweeps per evaluation; recurrent
/// networks that have not settled by then are read as-is.
const MAX_ACTIVATION_PASSES: usize = 16;

const SETTLE_EPSILON: f64 = 1e-9;

/// A directed, weighted connection between two network neurons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({:.3})", self.from, self.to, self.weight)
    }
}

#[derive(Clone)]
struct Neuron {
    kind: NeuronKind,
    activation: Activation,
    incoming: Vec<Link>,
}

/// A neural network with fixed topology and weights.
///
/// The bias neuron is pre-allocated at [`BIAS_ID`] and always reads
/// 1.0; further neurons are appended through [`add_neuron`] and wired
/// up with [`add_link`].
///
/// [`add_neuron`]: Network::add_neuron
/// [`add_link`]: Network::add_link
#[derive(Clone)]
pub struct Network {
    neurons: Vec<Neuron>,
    values: Vec<f64>,
}

impl Network {
    /// Creates a network holding only the bias neuron.
    pub fn new() -> Network {
        Network {
            neurons: vec![Neuron {
                kind: NeuronKind::Bias,
                activation: identity,
                incoming: Vec::new(),
            }],
            values: vec![1.0],
        }
    }

    /// Appends a neuron and returns its id.
    pub fn add_neuron(&mut self, kind: NeuronKind, activation: Activation) -> usize {
        self.neurons.push(Neuron {
            kind,
            activation,
            incoming: Vec::new(),
        });
        self.values.push(0.0);
        self.neurons.len() - 1
    }

    /// Adds a weighted link between two existing neurons.
    /// Self-loops and cycles are allowed.
    pub fn add_link(&mut self, from: usize, to: usize, weight: f64) {
        self.neurons[to].incoming.push(Link { from, to, weight });
    }

    /// Loads the input values, in input-neuron order.
    ///
    /// # Panics
    /// Panics if the slice length does not match the number of input
    /// neurons.
    pub fn set_inputs(&mut self, inputs: &[f64]) {
        let input_ids: Vec<usize> = self
            .neurons
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NeuronKind::Input)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(
            inputs.len(),
            input_ids.len(),
            "expected {} input values, got {}",
            input_ids.len(),
            inputs.len()
        );
        for (id, value) in input_ids.into_iter().zip(inputs) {
            self.values[id] = *value;
        }
    }

    /// Returns the current output values, in output-neuron order.
    pub fn outputs(&self) -> Vec<f64> {
        self.neurons
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NeuronKind::Output)
            .map(|(id, _)| self.values[id])
            .collect()
    }

    /// Resets all neuron values. The bias stays at 1.0.
    pub fn clear_state(&mut self) {
        for value in &mut self.values {
            *value = 0.0;
        }
        self.values[BIAS_ID] = 1.0;
    }

    /// Performs one synchronous activation sweep: every non-input
    /// neuron recomputes its value from the previous values of its
    /// sources.
    pub fn activate(&mut self) {
        let mut next = self.values.clone();
        for (id, neuron) in self.neurons.iter().enumerate() {
            if matches!(neuron.kind, NeuronKind::Bias | NeuronKind::Input) {
                continue;
            }
            let sum: f64 = neuron
                .incoming
                .iter()
                .map(|link| self.values[link.from] * link.weight)
                .sum();
            next[id] = (neuron.activation)(sum);
        }
        self.values = next;
    }

    /// Clears the network, loads `inputs` and activates until the
    /// values settle (or the pass bound is hit), then returns the
    /// outputs.
    pub fn evaluate(&mut self, inputs: &[f64]) -> Vec<f64> {
        self.clear_state();
        self.set_inputs(inputs);

        let mut previous = self.values.clone();
        for _ in 0..MAX_ACTIVATION_PASSES {
            self.activate();
            let settled = self
                .values
                .iter()
                .zip(&previous)
                .all(|(a, b)| (a - b).abs() < SETTLE_EPSILON);
            if settled {
                break;
            }
            previous.clone_from(&self.values);
        }
        self.outputs()
    }

    /// Returns the total neuron count, bias included.
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Returns the total link count.
    pub fn link_count(&self) -> usize {
        self.neurons.iter().map(|n| n.incoming.len()).sum()
    }
}

impl Default for Network {
    fn default() -> Network {
        Network::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn chained_sigmoids() {
        let mut network = Network::new();
        let input = network.add_neuron(NeuronKind::Input, DEFAULT_ACTIVATION);
        let output = network.add_neuron(NeuronKind::Output, DEFAULT_ACTIVATION);
        let hidden = network.add_neuron(NeuronKind::Hidden, DEFAULT_ACTIVATION);
        network.add_link(input, hidden, 1.0);
        network.add_link(hidden, output, 1.0);

        for i in -20..=20 {
            let x = i as f64 / 10.0;
            let expected = steepened_sigmoid(steepened_sigmoid(x));
            assert_abs_diff_eq!(network.evaluate(&[x])[0], expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn bias_is_always_on() {
        let mut network = Network::new();
        let output = network.add_neuron(NeuronKind::Output, DEFAULT_ACTIVATION);
        network.add_link(BIAS_ID, output, 10.0);

        assert!(network.evaluate(&[])[0] > 0.999);
    }

    #[test]
    fn recurrent_link_settles_or_stops() {
        let mut network = Network::new();
        let input = network.add_neuron(NeuronKind::Input, DEFAULT_ACTIVATION);
        let output = network.add_neuron(NeuronKind::Output, DEFAULT_ACTIVATION);
        network.add_link(input, output, 0.5);
        network.add_link(output, output, 0.5);

        let value = network.evaluate(&[1.0])[0];
        assert!(value.is_finite());
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn unconnected_hidden_neuron_is_harmless() {
        let mut network = Network::new();
        let input = network.add_neuron(NeuronKind::Input, DEFAULT_ACTIVATION);
        let output = network.add_neuron(NeuronKind::Output, DEFAULT_ACTIVATION);
        network.add_neuron(NeuronKind::Hidden, DEFAULT_ACTIVATION);
        network.add_link(input, output, 2.0);

        let outputs = network.evaluate(&[1.0]);
        assert_eq!(outputs.len(), 1);
        assert!(outputs[0] > 0.999);
    }
}
