use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// How a species picks its representant for the next generation's
/// compatibility probing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepresentantPolicy {
    /// A uniformly random current member.
    Random,
    /// The species champion.
    Champion,
}

/// Configuration data for population generation and evolution.
///
/// # Note
/// All quantities expressing probabilities should be in the range
/// [0.0, 1.0]. Using values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes seeded into generation zero.
    pub initial_population_size: NonZeroUsize,
    /// Number of genomes each following generation is rebuilt to.
    pub target_population_size: NonZeroUsize,
    /// Genetic distance below which a genome joins a species.
    pub compatibility_threshold: f64,
    /// When set, the threshold is evolved run state and survives
    /// serialisation; otherwise it is a fixed tuning parameter.
    pub dynamic_compatibility_threshold: bool,
    /// Chance that a child is produced by crossover of two distinct
    /// parents rather than by cloning one.
    pub p_crossover: f64,
    /// Generations without improvement before a species is culled.
    pub species_stagnation_cap: usize,
    /// Minimum species size (exclusive) for the species champion to
    /// be copied unmodified into the next generation.
    pub elite_threshold: usize,
    /// Bound on the library of historically best genomes.
    pub best_genomes_library_max_size: usize,
    /// Representant rotation policy.
    pub representant_policy: RepresentantPolicy,
}

impl PopulationConfig {
    /// Returns a "zero-valued" configuration: all values are 0,
    /// `false`, or in the case of sizes, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments. It is
    /// meant as a way to fill in unused values during configuration
    /// instantiation in tests.
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            initial_population_size: NonZeroUsize::MIN,
            target_population_size: NonZeroUsize::MIN,
            compatibility_threshold: 0.0,
            dynamic_compatibility_threshold: false,
            p_crossover: 0.0,
            species_stagnation_cap: 0,
            elite_threshold: 0,
            best_genomes_library_max_size: 0,
            representant_policy: RepresentantPolicy::Random,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            initial_population_size: NonZeroUsize::new(150).unwrap(),
            target_population_size: NonZeroUsize::new(150).unwrap(),
            compatibility_threshold: 3.0,
            dynamic_compatibility_threshold: false,
            p_crossover: 0.75,
            species_stagnation_cap: 15,
            elite_threshold: 4,
            best_genomes_library_max_size: 10,
            representant_policy: RepresentantPolicy::Random,
        }
    }
}
