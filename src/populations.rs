//! A population of genomes grouped into species, evolved
//! generation by generation under an external fitness signal.
//!
//! The [`Neat`] driver owns everything mutable about a run: the
//! population, the species list, the innovation pool and the random
//! generator. One generation is one [`evaluate_fitness`] call
//! followed by one [`epoch`] call.
//!
//! [`evaluate_fitness`]: Neat::evaluate_fitness
//! [`epoch`]: Neat::epoch

mod config;
mod errors;
mod logging;
mod population;
mod species;

pub use config::{PopulationConfig, RepresentantPolicy};
pub use errors::OffspringAllotmentError;
pub use logging::{EvolutionLogger, GenerationSample, Log, ReportingLevel, Stats};
pub use population::Population;
pub use species::{Species, SpeciesId};

use crate::genomics::{Gene, GeneticConfig, Genome, InnovationPool, InnovationRecord, BIAS_ID};
use crate::networks::Network;
use crate::serialization::{Deserializer, SerializationError, Serializer};
use crate::GenomeId;

use rand::prelude::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use std::io;

/// The NEAT driver: owns the innovation pool, the population and
/// the species list, and runs the generational loop.
///
/// Construction seeds the population with mutated copies of a fully
/// connected seed genome (bias→outputs and inputs→outputs) and
/// speciates it. The driver also tracks the best genome ever seen
/// and a bounded library of historic champions.
pub struct Neat {
    genetic_config: GeneticConfig,
    population_config: PopulationConfig,
    innovation_pool: InnovationPool,
    population: Population,
    species: Vec<Species>,
    next_species_id: usize,
    compatibility_threshold: f64,
    best_ever: Option<Genome>,
    age_of_best_ever: usize,
    best_library: Vec<Genome>,
    generation: usize,
    rng: ChaCha8Rng,
}

impl Neat {
    /// Creates a driver with an entropy-seeded random generator.
    pub fn new(genetic_config: GeneticConfig, population_config: PopulationConfig) -> Neat {
        Self::construct(genetic_config, population_config, ChaCha8Rng::from_entropy())
    }

    /// Creates a driver with a fixed seed. Given identical
    /// parameters and evaluator outputs, runs are reproducible
    /// epoch by epoch.
    pub fn with_seed(
        genetic_config: GeneticConfig,
        population_config: PopulationConfig,
        seed: u64,
    ) -> Neat {
        Self::construct(
            genetic_config,
            population_config,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    fn construct(
        genetic_config: GeneticConfig,
        population_config: PopulationConfig,
        mut rng: ChaCha8Rng,
    ) -> Neat {
        let mut innovation_pool = InnovationPool::new(
            genetic_config.input_count.get(),
            genetic_config.output_count.get(),
        );
        let seed_genome = Self::seed_genome(&genetic_config, &mut innovation_pool, &mut rng);

        let initial_size = population_config.initial_population_size.get();
        let mut population = Population::with_capacity(initial_size);
        for _ in 0..initial_size {
            population.add_genome(seed_genome.mutated_copy(
                &mut innovation_pool,
                &genetic_config,
                &mut rng,
            ));
        }

        let compatibility_threshold = population_config.compatibility_threshold;
        let mut neat = Neat {
            genetic_config,
            population_config,
            innovation_pool,
            population,
            species: Vec::new(),
            next_species_id: 0,
            compatibility_threshold,
            best_ever: None,
            age_of_best_ever: 0,
            best_library: Vec::new(),
            generation: 0,
            rng,
        };
        neat.speciate_population();
        neat
    }

    /// Builds the fully connected starting genome: one gene from the
    /// bias to every output, and one from every input to every
    /// output.
    fn seed_genome(
        config: &GeneticConfig,
        pool: &mut InnovationPool,
        rng: &mut impl Rng,
    ) -> Genome {
        let mut genome = Genome::new(config);
        let outputs_start = config.input_count.get() + 1;

        // links from the bias
        for o in 0..config.output_count.get() {
            Self::seed_gene(&mut genome, pool, BIAS_ID, outputs_start + o, config, rng);
        }
        // links from the inputs
        for i in 0..config.input_count.get() {
            for o in 0..config.output_count.get() {
                Self::seed_gene(&mut genome, pool, i + 1, outputs_start + o, config, rng);
            }
        }

        genome
    }

    fn seed_gene(
        genome: &mut Genome,
        pool: &mut InnovationPool,
        from: usize,
        to: usize,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) {
        let gene = Gene::new(
            pool.next_innovation(),
            from,
            to,
            Gene::random_weight(config, rng),
        );
        pool.register_gene(gene.clone());
        pool.register_innovation(InnovationRecord::NewLink {
            innovation: gene.innovation(),
            from,
            to,
        });
        genome.add_gene(gene);
    }

    /// Decodes every genome and assigns it the fitness the evaluator
    /// returns for its network. Must run before each [`epoch`] call.
    ///
    /// [`epoch`]: Neat::epoch
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&mut Network) -> f64,
    {
        for genome in self.population.genomes_mut() {
            let mut network = genome.generate_network();
            let fitness = evaluator(&mut network);
            genome.set_fitness(fitness);
        }
    }

    /// Advances the run by one generation: updates the best-ever
    /// genome and the champion library, culls stagnant species,
    /// allots offspring quotas by shared fitness, reproduces,
    /// re-speciates the new population and rotates representants.
    ///
    /// Fitness must have been assigned to the current population
    /// beforehand (see [`evaluate_fitness`]).
    ///
    /// # Errors
    /// Returns an error if the population has become degenerate
    /// (no species has a positive adjusted fitness).
    ///
    /// [`evaluate_fitness`]: Neat::evaluate_fitness
    pub fn epoch(&mut self) -> Result<(), OffspringAllotmentError> {
        self.update_best_ever();
        self.update_best_library();
        self.update_stagnation();
        let quotas = self.allot_offspring()?;
        self.generate_offspring(&quotas);
        self.speciate_population();
        self.rotate_representants();
        self.generation += 1;
        Ok(())
    }

    /// Tracks the best genome ever produced. The stored copy is only
    /// replaced when strictly beaten; otherwise it ages by one
    /// generation.
    fn update_best_ever(&mut self) {
        let champion_id = self.champion_id();
        let improved = match &self.best_ever {
            Some(best) => self.population[champion_id].fitness() > best.fitness(),
            None => true,
        };
        if improved {
            self.best_ever = Some(self.population[champion_id].clone());
            self.age_of_best_ever = 0;
        } else {
            self.age_of_best_ever += 1;
        }
    }

    /// Inserts the current champion into the bounded library of
    /// historic bests, unless a structurally identical entry already
    /// exists. A full library only gives up its worst entry for a
    /// strictly fitter champion.
    fn update_best_library(&mut self) {
        let max_size = self.population_config.best_genomes_library_max_size;
        if max_size == 0 {
            return;
        }

        let champion = self.champion();
        if self.best_library.iter().any(|g| g.same_structure(champion)) {
            return;
        }
        let champion = champion.clone();

        if self.best_library.len() < max_size {
            self.best_library.push(champion);
            return;
        }

        let worst = (0..self.best_library.len())
            .min_by(|&a, &b| {
                self.best_library[a]
                    .fitness()
                    .partial_cmp(&self.best_library[b].fitness())
                    .unwrap_or_else(|| panic!("invalid genome fitness detected (NaN)"))
            })
            .unwrap();
        if self.best_library[worst].fitness() < champion.fitness() {
            self.best_library[worst] = champion;
        }
    }

    /// Updates every species' stagnation counter and culls the ones
    /// past the cap. The champion's species is never culled.
    fn update_stagnation(&mut self) {
        let champion_species = self.population.species_of(self.champion_id());
        for species in &mut self.species {
            species.update_stagnation(&self.population);
        }
        let cap = self.population_config.species_stagnation_cap;
        self.species
            .retain(|s| !s.is_stagnant(cap) || Some(s.id()) == champion_species);
    }

    /// Computes per-species offspring quotas, proportional to the
    /// species' shares of the total adjusted fitness and summing to
    /// the target population size. Stagnant species are floored to
    /// zero unless they hold the champion; the rounding remainder
    /// lands on the fittest species.
    fn allot_offspring(&mut self) -> Result<Vec<usize>, OffspringAllotmentError> {
        for species in &mut self.species {
            species.adjust_fitnesses(&self.population);
        }

        let champion_species = self.population.species_of(self.champion_id());
        let cap = self.population_config.species_stagnation_cap;
        let effective: Vec<f64> = self
            .species
            .iter()
            .map(|s| {
                if s.is_stagnant(cap) && Some(s.id()) != champion_species {
                    0.0
                } else {
                    s.adjusted_fitness_sum().max(0.0)
                }
            })
            .collect();

        let total: f64 = effective.iter().sum();
        if total <= 0.0 {
            return Err(OffspringAllotmentError::DegeneratePopulation);
        }

        let target = self.population_config.target_population_size.get();
        let mut quotas: Vec<usize> = self
            .species
            .iter()
            .zip(&effective)
            .map(|(species, &sum)| {
                if sum <= 0.0 {
                    0
                } else {
                    species.offspring_quota(total, target)
                }
            })
            .collect();

        let by_fitness = self.species_indices_by_descending_fitness();
        let allotted: usize = quotas.iter().sum();
        if allotted < target {
            quotas[by_fitness[0]] += target - allotted;
        } else if allotted > target {
            let mut excess = allotted - target;
            for &index in &by_fitness {
                let taken = excess.min(quotas[index]);
                quotas[index] -= taken;
                excess -= taken;
                if excess == 0 {
                    break;
                }
            }
        }

        Ok(quotas)
    }

    fn species_indices_by_descending_fitness(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.species.len()).collect();
        indices.sort_by(|&a, &b| {
            let fitness_a = self.species[a].champion(&self.population).fitness();
            let fitness_b = self.species[b].champion(&self.population).fitness();
            fitness_b
                .partial_cmp(&fitness_a)
                .unwrap_or_else(|| panic!("invalid genome fitness detected (NaN)"))
        });
        indices
    }

    /// Rebuilds the population from each species' offspring.
    fn generate_offspring(&mut self, quotas: &[usize]) {
        let mut next = Population::with_capacity(quotas.iter().sum());
        for (species, &quota) in self.species.iter().zip(quotas) {
            let offspring = species.reproduce(
                quota,
                &mut self.innovation_pool,
                &self.population,
                &self.genetic_config,
                &self.population_config,
                &mut self.rng,
            );
            for child in offspring {
                next.add_genome(child);
            }
        }
        self.population = next;
    }

    /// Places every genome into the first species whose representant
    /// it is compatible with, founding a new species when none
    /// matches. Species left without members are removed.
    fn speciate_population(&mut self) {
        for species in &mut self.species {
            species.begin_next_generation();
        }

        for id in 0..self.population.len() {
            let found = self.species.iter().position(|s| {
                self.population[id].is_compatible_with(
                    s.representant(),
                    &self.genetic_config,
                    self.compatibility_threshold,
                )
            });
            match found {
                Some(index) => {
                    let species_id = self.species[index].id();
                    self.species[index].add_member(id);
                    self.population.assign_species(id, species_id);
                }
                None => {
                    let species_id = SpeciesId(self.next_species_id);
                    self.next_species_id += 1;
                    let mut species = Species::new(species_id, self.population[id].clone());
                    species.add_member(id);
                    self.population.assign_species(id, species_id);
                    self.species.push(species);
                }
            }
        }

        self.species.retain(|s| !s.is_empty());
    }

    fn rotate_representants(&mut self) {
        let policy = self.population_config.representant_policy;
        for species in &mut self.species {
            species.choose_representant(&self.population, policy, &mut self.rng);
        }
    }

    /// Returns the fittest genome of the current generation.
    ///
    /// # Panics
    /// Panics if the population is empty, or if a fitness is NaN.
    pub fn champion(&self) -> &Genome {
        &self.population[self.champion_id()]
    }

    fn champion_id(&self) -> GenomeId {
        (0..self.population.len())
            .max_by(|&a, &b| {
                self.population[a]
                    .fitness()
                    .partial_cmp(&self.population[b].fitness())
                    .unwrap_or_else(|| panic!("invalid genome fitness detected (NaN)"))
            })
            .expect("empty population has no champion")
    }

    /// Returns the best genome ever seen across the whole run, if a
    /// generation has been evaluated yet.
    pub fn best_ever(&self) -> Option<&Genome> {
        self.best_ever.as_ref()
    }

    /// Returns how many generations ago the best-ever genome was
    /// found.
    pub fn age_of_best_ever(&self) -> usize {
        self.age_of_best_ever
    }

    /// Returns the library of historically best genomes, most
    /// recent last.
    pub fn best_library(&self) -> &[Genome] {
        &self.best_library
    }

    /// Returns the current generation number, starting at 0.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the current population.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Returns an iterator over the current species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the run's innovation pool.
    pub fn innovation_pool(&self) -> &InnovationPool {
        &self.innovation_pool
    }

    /// Returns the compatibility threshold in effect.
    pub fn compatibility_threshold(&self) -> f64 {
        self.compatibility_threshold
    }

    /// Replaces the driver's random generator with a freshly seeded
    /// one.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Restarts the run from scratch with the same parameters,
    /// discarding all evolved state.
    pub fn reset(&mut self) {
        let seed = self.rng.gen();
        *self = Neat::construct(
            self.genetic_config.clone(),
            self.population_config.clone(),
            ChaCha8Rng::seed_from_u64(seed),
        );
    }

    /// Writes the run state as a textual, line-oriented stream:
    /// species counter, best-ever age, compatibility threshold, the
    /// best-ever genome (when present), the population, the species
    /// list, the champion library and the innovation pool.
    pub fn save_state<W: io::Write>(&self, writer: W) -> Result<(), SerializationError> {
        let mut ser = Serializer::new(writer);

        ser.field(self.next_species_id)?;
        ser.field(self.age_of_best_ever)?;
        ser.field(self.compatibility_threshold)?;
        ser.end_line()?;

        match &self.best_ever {
            Some(best) => {
                ser.field(true)?;
                ser.end_line()?;
                best.write_to(&mut ser)?;
            }
            None => {
                ser.field(false)?;
                ser.end_line()?;
            }
        }

        ser.field(self.population.len())?;
        ser.end_line()?;
        for genome in self.population.genomes() {
            genome.write_to(&mut ser)?;
        }

        ser.field(self.species.len())?;
        ser.end_line()?;
        for species in &self.species {
            species.write_to(&mut ser)?;
        }

        ser.field(self.best_library.len())?;
        ser.end_line()?;
        for genome in &self.best_library {
            genome.write_to(&mut ser)?;
        }

        self.innovation_pool.write_to(&mut ser)?;
        ser.finish()
    }

    /// Rebuilds a driver from a stream written by [`save_state`].
    /// The parameter record is supplied by the caller; the stored
    /// compatibility threshold only takes effect when
    /// `dynamic_compatibility_threshold` is set.
    ///
    /// # Errors
    /// Returns an error on a malformed or truncated stream.
    ///
    /// [`save_state`]: Neat::save_state
    pub fn restore_state<R: io::BufRead>(
        genetic_config: GeneticConfig,
        population_config: PopulationConfig,
        reader: R,
    ) -> Result<Neat, SerializationError> {
        let mut des = Deserializer::new(reader);

        let next_species_id = des.field()?;
        let age_of_best_ever = des.field()?;
        let stored_threshold: f64 = des.field()?;

        let best_ever = if des.field::<bool>()? {
            Some(Genome::read_from(&mut des)?)
        } else {
            None
        };

        let population_count: usize = des.field()?;
        let mut population = Population::with_capacity(population_count);
        for _ in 0..population_count {
            population.add_genome(Genome::read_from(&mut des)?);
        }

        let species_count: usize = des.field()?;
        let mut species = Vec::with_capacity(species_count);
        for _ in 0..species_count {
            species.push(Species::read_from(&mut des)?);
        }

        let library_count: usize = des.field()?;
        let mut best_library = Vec::with_capacity(library_count);
        for _ in 0..library_count {
            best_library.push(Genome::read_from(&mut des)?);
        }

        let innovation_pool = InnovationPool::read_from(&mut des)?;

        // rebuild the genome -> species mapping from the member lists
        for s in &species {
            for &member in s.members() {
                if member >= population.len() {
                    return Err(SerializationError::Malformed(format!(
                        "species member id {} out of range",
                        member
                    )));
                }
                population.assign_species(member, s.id());
            }
        }

        let compatibility_threshold = if population_config.dynamic_compatibility_threshold {
            stored_threshold
        } else {
            population_config.compatibility_threshold
        };

        Ok(Neat {
            genetic_config,
            population_config,
            innovation_pool,
            population,
            species,
            next_species_id,
            compatibility_threshold,
            best_ever,
            age_of_best_ever,
            best_library,
            generation: 0,
            rng: ChaCha8Rng::from_entropy(),
        })
    }
}
