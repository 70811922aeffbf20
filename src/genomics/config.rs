use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Relative selection weights for the eight mutation operators.
///
/// A single mutation is picked by weighted sampling over these; a
/// weight of zero disables the corresponding operator.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MutationWeights {
    pub add_link: u32,
    pub add_neuron: u32,
    pub one_weight: u32,
    pub all_weights: u32,
    pub reset_weights: u32,
    pub remove_gene: u32,
    pub reenable_gene: u32,
    pub toggle_enable: u32,
}

impl MutationWeights {
    pub fn total(&self) -> u32 {
        self.add_link
            + self.add_neuron
            + self.one_weight
            + self.all_weights
            + self.reset_weights
            + self.remove_gene
            + self.reenable_gene
            + self.toggle_enable
    }

    pub const fn zero() -> MutationWeights {
        MutationWeights {
            add_link: 0,
            add_neuron: 0,
            one_weight: 0,
            all_weights: 0,
            reset_weights: 0,
            remove_gene: 0,
            reenable_gene: 0,
            toggle_enable: 0,
        }
    }
}

/// Relative selection weights for the three crossover variants.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CrossoverWeights {
    pub multipoint_best: u32,
    pub multipoint_rnd: u32,
    pub multipoint_avg: u32,
}

impl CrossoverWeights {
    pub fn total(&self) -> u32 {
        self.multipoint_best + self.multipoint_rnd + self.multipoint_avg
    }

    pub const fn zero() -> CrossoverWeights {
        CrossoverWeights {
            multipoint_best: 0,
            multipoint_rnd: 0,
            multipoint_avg: 0,
        }
    }
}

/// Configuration data for genome generation and inter-genome
/// operations.
///
/// # Note
/// All quantities expressing probabilities should be in the range
/// [0.0, 1.0]. Using values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Weight of excess genes in genetic distance.
    pub excess_coefficient: f64,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_coefficient: f64,
    /// Weight of the average matching-gene weight difference in
    /// genetic distance.
    pub weight_coefficient: f64,
    /// Selection weights for the mutation operators.
    pub mutation_weights: MutationWeights,
    /// Selection weights for the crossover variants.
    pub crossover_weights: CrossoverWeights,
    /// Magnitude of the bound on freshly drawn gene weights.
    pub initial_weight_perturbation: f64,
    /// Magnitude of the bound on weight-nudge noise.
    pub weight_mutation_power: f64,
    /// Chance that a gene disabled in either parent is inherited
    /// disabled during crossover.
    pub p_inherit_disabled: f64,
    /// Chance that a disabled inherited gene is flipped back to
    /// enabled during crossover.
    pub p_reenable: f64,
}

impl GeneticConfig {
    /// Returns a "zero-valued" configuration: all weights and
    /// probabilities are 0, I/O counts are 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments. It is
    /// meant as a way to fill in unused values during configuration
    /// instantiation in tests.
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            excess_coefficient: 0.0,
            disjoint_coefficient: 0.0,
            weight_coefficient: 0.0,
            mutation_weights: MutationWeights::zero(),
            crossover_weights: CrossoverWeights::zero(),
            initial_weight_perturbation: 0.0,
            weight_mutation_power: 0.0,
            p_inherit_disabled: 0.0,
            p_reenable: 0.0,
        }
    }
}

impl Default for GeneticConfig {
    /// A workable starting point for function-approximation tasks;
    /// weight mutations dominate, structure grows slowly.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.4,
            mutation_weights: MutationWeights {
                add_link: 8,
                add_neuron: 3,
                one_weight: 25,
                all_weights: 40,
                reset_weights: 2,
                remove_gene: 2,
                reenable_gene: 3,
                toggle_enable: 1,
            },
            crossover_weights: CrossoverWeights {
                multipoint_best: 10,
                multipoint_rnd: 5,
                multipoint_avg: 5,
            },
            initial_weight_perturbation: 2.0,
            weight_mutation_power: 0.5,
            p_inherit_disabled: 0.75,
            p_reenable: 0.25,
        }
    }
}
