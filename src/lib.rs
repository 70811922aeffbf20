//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Both the weights and the topology of a population of neural networks
//! are evolved under an external fitness signal. Structural changes are
//! tracked through a process-wide innovation pool, so that genomes which
//! independently discover the same structure stay aligned at crossover
//! time, and the population is partitioned into species by genetic
//! distance so that new topologies are protected until optimised.
//!
//! The caller supplies a fitness evaluator over decoded networks and a
//! parameter record; the [`Neat`] driver runs the generational loop and
//! keeps the best genome found so far.
//!
//! # Example usage: Evolution of an XOR function approximator
//! ```
//! use neatkit::genomics::GeneticConfig;
//! use neatkit::networks::Network;
//! use neatkit::populations::{Neat, PopulationConfig};
//! use std::num::NonZeroUsize;
//!
//! fn evaluate_xor(network: &mut Network) -> f64 {
//!     let rows = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut fitness = 4.0;
//!     for (inputs, target) in rows {
//!         let output = network.evaluate(&inputs)[0];
//!         fitness -= (target - output) * (target - output);
//!     }
//!     fitness
//! }
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     ..GeneticConfig::default()
//! };
//!
//! let mut neat = Neat::with_seed(genetic_config, PopulationConfig::default(), 42);
//! for _ in 0..10 {
//!     neat.evaluate_fitness(evaluate_xor);
//!     neat.epoch().unwrap();
//! }
//! println!("best fitness so far: {}", neat.best_ever().unwrap().fitness());
//! ```

pub mod genomics;
pub mod networks;
pub mod populations;
pub mod serialization;

pub use populations::Neat;

/// Identifier of a genome neuron.
///
/// Id 0 is reserved for the bias neuron, ids `1..=I` designate the
/// inputs, `I+1..=I+O` the outputs, and everything past that hidden
/// neurons allocated by the innovation pool.
pub type NeuronId = usize;

/// Identifier stamped on every structural gene. Two genes share an
/// innovation number iff they originate from the same structural
/// event across a run.
pub type Innovation = usize;

/// Index of a genome within the current generation's population.
/// Stable for the duration of one generation only.
pub type GenomeId = usize;
