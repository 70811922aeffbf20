use crate::genomics::{GeneticConfig, Genome, InnovationPool};
use crate::populations::{Population, PopulationConfig, RepresentantPolicy};
use crate::serialization::{Deserializer, SerializationError, Serializer};
use crate::GenomeId;

use rand::prelude::{Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::io;

/// Species identifier, allocated monotonically by the driver over
/// the whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub usize);

/// A cluster of reproductively compatible genomes.
///
/// Membership is decided by genetic distance to the _representant_,
/// a snapshot genome that outlives the generation it was taken from;
/// members themselves are referenced by id only, so the driver can
/// rebuild the population without dangling references.
///
/// A species that fails to improve its best fitness for more than
/// the configured cap of generations is flagged stagnant and culled
/// at the next epoch boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesId,
    representant: Genome,
    members: Vec<GenomeId>,
    age: usize,
    stagnation: usize,
    best_fitness_ever: f64,
    adjusted_fitness_sum: f64,
}

impl Species {
    /// Creates a species around the genome that could not be matched
    /// to any existing one. The genome is kept by value as the
    /// initial representant.
    pub fn new(id: SpeciesId, representant: Genome) -> Species {
        Species {
            id,
            representant,
            members: Vec::new(),
            age: 0,
            stagnation: 0,
            best_fitness_ever: f64::NEG_INFINITY,
            adjusted_fitness_sum: 0.0,
        }
    }

    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Returns the membership probe for this generation.
    pub fn representant(&self) -> &Genome {
        &self.representant
    }

    /// Returns the member genome ids, valid for the current
    /// generation.
    pub fn members(&self) -> &[GenomeId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the number of generations the species has existed.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Returns the number of consecutive generations without an
    /// improvement of the species' best fitness.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    pub fn is_stagnant(&self, stagnation_cap: usize) -> bool {
        self.stagnation > stagnation_cap
    }

    /// Appends a member for the current generation.
    pub fn add_member(&mut self, id: GenomeId) {
        self.members.push(id);
    }

    /// Ages the species and forgets the previous generation's
    /// members; the representant stays until rotated.
    pub(crate) fn begin_next_generation(&mut self) {
        self.age += 1;
        self.members.clear();
    }

    /// Updates the stagnation bookkeeping from the current members'
    /// raw fitnesses.
    pub(crate) fn update_stagnation(&mut self, population: &Population) {
        let best = self
            .members
            .iter()
            .map(|&id| population[id].fitness())
            .fold(f64::NEG_INFINITY, f64::max);
        if best > self.best_fitness_ever {
            self.best_fitness_ever = best;
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
    }

    /// Applies fitness sharing: every member's adjusted fitness is
    /// its raw fitness divided by the species size, and the species
    /// records the sum of those shares.
    pub fn adjust_fitnesses(&mut self, population: &Population) {
        if self.members.is_empty() {
            self.adjusted_fitness_sum = 0.0;
            return;
        }
        self.adjusted_fitness_sum = self
            .members
            .iter()
            .map(|&id| population[id].fitness())
            .sum::<f64>()
            / self.members.len() as f64;
    }

    /// Returns the sum of the members' adjusted fitnesses, as
    /// computed by the last [`adjust_fitnesses`] call.
    ///
    /// [`adjust_fitnesses`]: Species::adjust_fitnesses
    pub fn adjusted_fitness_sum(&self) -> f64 {
        self.adjusted_fitness_sum
    }

    /// Returns the species' proportional share of the next
    /// generation, rounded to the nearest whole genome.
    pub fn offspring_quota(&self, total_adjusted: f64, target_population_size: usize) -> usize {
        let share = self.adjusted_fitness_sum / total_adjusted * target_population_size as f64;
        share.round().max(0.0) as usize
    }

    /// Returns the currently fittest member.
    ///
    /// # Panics
    /// Panics if the species has no members.
    pub fn champion<'p>(&self, population: &'p Population) -> &'p Genome {
        &population[self.champion_id(population)]
    }

    pub(crate) fn champion_id(&self, population: &Population) -> GenomeId {
        self.members
            .iter()
            .copied()
            .max_by(|&a, &b| {
                population[a]
                    .fitness()
                    .partial_cmp(&population[b].fitness())
                    .unwrap_or_else(|| panic!("invalid genome fitness detected (NaN)"))
            })
            .expect("empty species has no champion")
    }

    /// Produces `quota` children.
    ///
    /// Parents are drawn from the members by fitness-proportional
    /// selection. Each child is either the crossover of two distinct
    /// parents (with chance `p_crossover`) or the clone of one. Every
    /// child undergoes one random mutation, except that a
    /// crossover-produced child skips it on a fair coin flip. When
    /// the quota allows it and the species is larger than the elite
    /// threshold, the champion is copied in unmodified first.
    pub fn reproduce(
        &self,
        quota: usize,
        pool: &mut InnovationPool,
        population: &Population,
        genetic_config: &GeneticConfig,
        population_config: &PopulationConfig,
        rng: &mut impl Rng,
    ) -> Vec<Genome> {
        let mut offspring = Vec::with_capacity(quota);
        if quota == 0 || self.members.is_empty() {
            return offspring;
        }

        if self.members.len() > population_config.elite_threshold {
            offspring.push(self.champion(population).clone());
        }

        while offspring.len() < quota {
            let crossover = self.members.len() >= 2
                && rng.gen::<f64>() < population_config.p_crossover;
            let child = if crossover {
                let (first, second) = self.select_two_distinct_parents(population, rng);
                let mut child =
                    population[first].crossover_random(&population[second], genetic_config, rng);
                if rng.gen::<bool>() {
                    child.mutate_random(pool, genetic_config, rng);
                }
                child
            } else {
                let parent = self.select_parent(population, rng);
                population[parent].mutated_copy(pool, genetic_config, rng)
            };
            offspring.push(child);
        }

        offspring
    }

    /// Fitness-proportional (roulette) selection over the members.
    /// Negative fitness counts as zero; when nothing scores, the
    /// draw is uniform.
    fn select_parent(&self, population: &Population, rng: &mut impl Rng) -> GenomeId {
        let total: f64 = self
            .members
            .iter()
            .map(|&id| population[id].fitness().max(0.0))
            .sum();
        if total <= 0.0 {
            return *self.members.choose(rng).unwrap();
        }

        let mut ticket = rng.gen::<f64>() * total;
        for &id in &self.members {
            let fitness = population[id].fitness().max(0.0);
            if ticket < fitness {
                return id;
            }
            ticket -= fitness;
        }
        *self.members.last().unwrap()
    }

    fn select_two_distinct_parents(
        &self,
        population: &Population,
        rng: &mut impl Rng,
    ) -> (GenomeId, GenomeId) {
        let first = self.select_parent(population, rng);
        let mut second = self.select_parent(population, rng);
        for _ in 0..8 {
            if second != first {
                break;
            }
            second = self.select_parent(population, rng);
        }
        if second == first {
            second = self
                .members
                .iter()
                .copied()
                .find(|&id| id != first)
                .expect("species of one cannot cross over");
        }
        (first, second)
    }

    /// Picks the representant used for speciation probes in the next
    /// generation.
    pub(crate) fn choose_representant(
        &mut self,
        population: &Population,
        policy: RepresentantPolicy,
        rng: &mut impl Rng,
    ) {
        if self.members.is_empty() {
            return;
        }
        let id = match policy {
            RepresentantPolicy::Random => *self.members.choose(rng).unwrap(),
            RepresentantPolicy::Champion => self.champion_id(population),
        };
        self.representant = population[id].clone();
    }

    pub(crate) fn write_to<W: io::Write>(
        &self,
        ser: &mut Serializer<W>,
    ) -> Result<(), SerializationError> {
        ser.field(self.id.0)?;
        ser.field(self.age)?;
        ser.field(self.stagnation)?;
        ser.field(self.best_fitness_ever)?;
        ser.field(self.adjusted_fitness_sum)?;
        ser.end_line()?;
        self.representant.write_to(ser)?;
        ser.field(self.members.len())?;
        for &member in &self.members {
            ser.field(member)?;
        }
        ser.end_line()
    }

    pub(crate) fn read_from<R: io::BufRead>(
        des: &mut Deserializer<R>,
    ) -> Result<Species, SerializationError> {
        let id = SpeciesId(des.field()?);
        let age = des.field()?;
        let stagnation = des.field()?;
        let best_fitness_ever = des.field()?;
        let adjusted_fitness_sum = des.field()?;
        let representant = Genome::read_from(des)?;
        let member_count: usize = des.field()?;
        let members = (0..member_count)
            .map(|_| des.field())
            .collect::<Result<_, _>>()?;

        Ok(Species {
            id,
            representant,
            members,
            age,
            stagnation,
            best_fitness_ever,
            adjusted_fitness_sum,
        })
    }
}
