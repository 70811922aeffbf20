use crate::genomics::GeneticConfig;
use crate::{Innovation, NeuronId};

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Genes are the atomic structural elements of genomes.
/// Each one denotes a directed, weighted synapse between two
/// neurons, stamped with the innovation number of the structural
/// event that introduced it. Self-loops (`from == to`) are legal;
/// a gene's destination is never an input or the bias neuron.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Gene {
    innovation: Innovation,
    from: NeuronId,
    to: NeuronId,
    weight: f64,
    enabled: bool,
}

impl Gene {
    /// Returns a new _enabled_ gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neatkit::genomics::Gene;
    ///
    /// let gene = Gene::new(42, 3, 9, 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(innovation: Innovation, from: NeuronId, to: NeuronId, weight: f64) -> Gene {
        Gene {
            innovation,
            from,
            to,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight, drawn uniformly from the range
    /// ±`config.initial_weight_perturbation`.
    pub(crate) fn random_weight(config: &GeneticConfig, rng: &mut impl Rng) -> f64 {
        rng.gen_range(-config.initial_weight_perturbation..=config.initial_weight_perturbation)
    }

    /// Replaces the gene's weight with a uniform draw from
    /// ±`config.initial_weight_perturbation`.
    pub fn randomize_weight(&mut self, config: &GeneticConfig, rng: &mut impl Rng) {
        self.weight = Self::random_weight(config, rng);
    }

    /// Adds noise to the gene's weight, drawn uniformly from
    /// ±`config.weight_mutation_power`.
    pub fn nudge_weight(&mut self, config: &GeneticConfig, rng: &mut impl Rng) {
        self.weight += rng.gen_range(-config.weight_mutation_power..=config.weight_mutation_power);
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the neuron the synapse originates from.
    pub fn from(&self) -> NeuronId {
        self.from
    }

    /// Returns the id of the neuron the synapse leads to.
    pub fn to(&self) -> NeuronId {
        self.to
    }

    /// Returns the gene's source and destination neuron ids.
    pub fn endpoints(&self) -> (NeuronId, NeuronId) {
        (self.from, self.to)
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the gene's weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns whether the gene is expressed during network decoding.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's enable flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}[{}->{}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.from,
            self.to,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
