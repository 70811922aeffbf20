//! Genomes are the focus of evolution in NEAT.
//! They are an ordered collection of genes over a set of known
//! neurons, and can be instantiated as a phenotype (a neural
//! network). Genomes are progressively mutated and recombined,
//! adding complexity and functionality; every structural change is
//! stamped by the run-wide [`InnovationPool`] so that independently
//! discovered structure stays aligned across the population.

mod config;
mod errors;
mod genes;
mod history;

pub use config::{CrossoverWeights, GeneticConfig, MutationWeights};
pub use errors::MutationError;
pub use genes::Gene;
pub use history::{InnovationKind, InnovationPool, InnovationRecord};

use crate::networks::{self, Network, NeuronKind, DEFAULT_ACTIVATION};
use crate::serialization::{Deserializer, SerializationError, Serializer};
use crate::{Innovation, NeuronId};

use ahash::RandomState;
use rand::prelude::{IteratorRandom, Rng};
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::io;

/// Reserved id of the bias neuron.
pub const BIAS_ID: NeuronId = 0;

/// A structural encoding of a neural network: a gene list ordered
/// by innovation number, plus the set of neurons the genome knows
/// about.
///
/// The known-neuron list is a superset of the gene endpoints and
/// always starts with the reserved range (bias, inputs, outputs),
/// followed by hidden neurons in discovery order. Raw fitness is
/// assigned externally after each evaluation.
///
/// Supports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    input_count: usize,
    output_count: usize,
    genes: Vec<Gene>,
    known_neurons: Vec<NeuronId>,
    fitness: f64,
}

impl Genome {
    /// Creates an empty genome knowing only the bias, input and
    /// output neurons.
    ///
    /// # Examples
    /// ```
    /// use neatkit::genomics::{GeneticConfig, Genome};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = Genome::new(&config);
    /// assert_eq!(genome.genes().count(), 0);
    /// // Bias + 3 inputs + 2 outputs.
    /// assert_eq!(genome.known_neurons().len(), 1 + 3 + 2);
    /// ```
    pub fn new(config: &GeneticConfig) -> Genome {
        Self::barebones(config.input_count.get(), config.output_count.get())
    }

    fn barebones(input_count: usize, output_count: usize) -> Genome {
        let mut known_neurons = Vec::with_capacity(1 + input_count + output_count);
        known_neurons.push(BIAS_ID);
        known_neurons.extend(1..=input_count + output_count);

        Genome {
            input_count,
            output_count,
            genes: Vec::new(),
            known_neurons,
            fitness: 0.0,
        }
    }

    /// Adds a gene to the genome, keeping the gene list ordered by
    /// innovation number. Endpoints the genome did not know about
    /// yet are appended to the known-neuron list.
    ///
    /// The caller is responsible for not inserting a second gene
    /// with an innovation number already present in the genome.
    pub fn add_gene(&mut self, gene: Gene) -> &Gene {
        debug_assert!(
            !self.contains_innovation(gene.innovation()),
            "duplicate innovation {} inserted",
            gene.innovation()
        );

        if !self.known_neurons.contains(&gene.from()) {
            self.known_neurons.push(gene.from());
        }
        if !self.known_neurons.contains(&gene.to()) {
            self.known_neurons.push(gene.to());
        }

        let position = self
            .genes
            .partition_point(|g| g.innovation() < gene.innovation());
        self.genes.insert(position, gene);
        &self.genes[position]
    }

    /// Returns whether the genome holds a gene with the given
    /// endpoints, enabled or not.
    pub fn contains_link(&self, from: NeuronId, to: NeuronId) -> bool {
        self.genes.iter().any(|g| g.endpoints() == (from, to))
    }

    fn contains_innovation(&self, innovation: Innovation) -> bool {
        self.genes
            .binary_search_by_key(&innovation, |g| g.innovation())
            .is_ok()
    }

    /// Calculates the _genetic distance_ between two genomes.
    ///
    /// The gene lists are walked in merge order: genes matching by
    /// innovation number contribute their absolute weight difference,
    /// genes present in only one genome count as disjoint while the
    /// other genome still has genes ahead, and as excess past that
    /// point. With `N` the larger gene count, the distance is
    ///
    /// `c1·excess/N + c2·disjoint/N + c3·avg_weight_diff`.
    ///
    /// Genomes of at most 4 genes are never discriminated: their
    /// distance is 0.
    pub fn distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f64 {
        let larger_size = first.genes.len().max(second.genes.len());
        if larger_size <= 4 {
            return 0.0;
        }

        let mut matching = 0usize;
        let mut disjoint = 0usize;
        let mut weight_difference = 0.0;

        let (mut i, mut j) = (0, 0);
        while i < first.genes.len() && j < second.genes.len() {
            match first.genes[i]
                .innovation()
                .cmp(&second.genes[j].innovation())
            {
                Ordering::Equal => {
                    matching += 1;
                    weight_difference +=
                        (first.genes[i].weight() - second.genes[j].weight()).abs();
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    disjoint += 1;
                    i += 1;
                }
                Ordering::Greater => {
                    disjoint += 1;
                    j += 1;
                }
            }
        }
        let excess = (first.genes.len() - i) + (second.genes.len() - j);

        let average_weight_difference = if matching > 0 {
            weight_difference / matching as f64
        } else {
            0.0
        };

        config.excess_coefficient * excess as f64 / larger_size as f64
            + config.disjoint_coefficient * disjoint as f64 / larger_size as f64
            + config.weight_coefficient * average_weight_difference
    }

    /// Returns whether the two genomes belong to the same species,
    /// i.e. their distance is below the compatibility threshold.
    pub fn is_compatible_with(
        &self,
        other: &Genome,
        config: &GeneticConfig,
        compatibility_threshold: f64,
    ) -> bool {
        Genome::distance(self, other, config) < compatibility_threshold
    }

    /// Applies one random mutation, selected by weighted sampling
    /// over [`MutationWeights`]. An operator can fail for want of a
    /// legal target; in that case up to two further fresh draws are
    /// made before the genome is accepted unchanged.
    ///
    /// Returns whether any attempt succeeded.
    pub fn mutate_random(
        &mut self,
        pool: &mut InnovationPool,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> bool {
        for _ in 0..3 {
            if self.try_random_mutation(pool, config, rng).is_ok() {
                return true;
            }
        }
        false
    }

    fn try_random_mutation(
        &mut self,
        pool: &mut InnovationPool,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Result<(), MutationError> {
        let weights = config.mutation_weights;
        let mut draw = rng.gen_range(0..weights.total());

        if draw < weights.add_link {
            return self.mutate_add_link(pool, config, rng).map(|_| ());
        }
        draw -= weights.add_link;

        if draw < weights.add_neuron {
            return self.mutate_add_neuron(pool, rng).map(|_| ());
        }
        draw -= weights.add_neuron;

        if draw < weights.one_weight {
            return self.mutate_one_weight(config, rng);
        }
        draw -= weights.one_weight;

        if draw < weights.all_weights {
            self.mutate_all_weights(config, rng);
            return Ok(());
        }
        draw -= weights.all_weights;

        if draw < weights.reset_weights {
            self.mutate_reset_weights(config, rng);
            return Ok(());
        }
        draw -= weights.reset_weights;

        if draw < weights.remove_gene {
            return self.mutate_remove_gene(rng).map(|_| ());
        }
        draw -= weights.remove_gene;

        if draw < weights.reenable_gene {
            return self.mutate_reenable_gene(rng);
        }

        // the last option is...
        self.mutate_toggle_enable(rng)
    }

    /// Returns a copy of the genome with one random mutation applied
    /// and its fitness reset.
    pub fn mutated_copy(
        &self,
        pool: &mut InnovationPool,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Genome {
        let mut offspring = self.clone();
        offspring.fitness = 0.0;
        offspring.mutate_random(pool, config, rng);
        offspring
    }

    /// Induces a _link mutation_: a new synapse between a uniformly
    /// chosen source (any known neuron) and destination (any known
    /// neuron that is not an input or the bias).
    ///
    /// If the pool already holds a canonical gene for the pair, its
    /// innovation number is reused and the weight re-randomised;
    /// otherwise a fresh innovation is allocated and registered.
    ///
    /// # Errors
    /// Fails if the chosen link already exists in this genome.
    pub fn mutate_add_link(
        &mut self,
        pool: &mut InnovationPool,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Result<&Gene, MutationError> {
        let from = self.known_neurons[rng.gen_range(0..self.known_neurons.len())];
        // destinations start past the bias and input block
        let destination_start = self.input_count + 1;
        let to = self.known_neurons[rng.gen_range(destination_start..self.known_neurons.len())];

        if self.contains_link(from, to) {
            return Err(MutationError::LinkAlreadyExists(from, to));
        }

        let gene = match pool.find_gene(from, to) {
            Some(known) => {
                let mut gene = known.clone();
                gene.set_enabled(true);
                gene.randomize_weight(config, rng);
                gene
            }
            None => {
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
                gene
            }
        };

        Ok(self.add_gene(gene))
    }

    /// Induces a _neuron mutation_: a uniformly chosen enabled gene
    /// is disabled and split in two by a hidden neuron. Both
    /// replacement genes carry the split gene's weight.
    ///
    /// If the pool already recorded a split of the same edge, its
    /// innovation numbers and hidden neuron id are reused; otherwise
    /// fresh ones are allocated and registered.
    ///
    /// Returns `(incoming gene, new neuron, outgoing gene)` ids.
    ///
    /// # Errors
    /// Fails if no gene is enabled, or if the recorded split was
    /// already applied to this genome.
    pub fn mutate_add_neuron(
        &mut self,
        pool: &mut InnovationPool,
        rng: &mut impl Rng,
    ) -> Result<(Innovation, NeuronId, Innovation), MutationError> {
        let index = (0..self.genes.len())
            .filter(|&i| self.genes[i].enabled())
            .choose(rng)
            .ok_or(MutationError::NoEnabledGene)?;
        let (from, to) = self.genes[index].endpoints();
        let weight = self.genes[index].weight();

        let existing = pool
            .find_innovation(InnovationKind::NewNeuron, from, to)
            .cloned();
        if let Some(InnovationRecord::NewNeuron {
            innovation_in,
            innovation_out,
            new_neuron,
            ..
        }) = existing
        {
            if self.contains_innovation(innovation_in) || self.contains_innovation(innovation_out)
            {
                return Err(MutationError::SplitAlreadyApplied(from, to));
            }
            self.genes[index].set_enabled(false);
            self.add_gene(Gene::new(innovation_in, from, new_neuron, weight));
            self.add_gene(Gene::new(innovation_out, new_neuron, to, weight));
            Ok((innovation_in, new_neuron, innovation_out))
        } else {
            self.genes[index].set_enabled(false);
            let new_neuron = pool.next_hidden_neuron();
            let gene_in = Gene::new(pool.next_innovation(), from, new_neuron, weight);
            let gene_out = Gene::new(pool.next_innovation(), new_neuron, to, weight);

            pool.register_gene(gene_in.clone());
            pool.register_gene(gene_out.clone());
            pool.register_innovation(InnovationRecord::NewNeuron {
                innovation_in: gene_in.innovation(),
                innovation_out: gene_out.innovation(),
                from,
                to,
                new_neuron,
            });

            let ids = (gene_in.innovation(), new_neuron, gene_out.innovation());
            self.add_gene(gene_in);
            self.add_gene(gene_out);
            Ok(ids)
        }
    }

    /// Adds noise from ±`weight_mutation_power` to one uniformly
    /// chosen gene.
    pub fn mutate_one_weight(
        &mut self,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Result<(), MutationError> {
        if self.genes.is_empty() {
            return Err(MutationError::NoGenes);
        }
        let index = rng.gen_range(0..self.genes.len());
        self.genes[index].nudge_weight(config, rng);
        Ok(())
    }

    /// Adds noise from ±`weight_mutation_power` to every gene.
    pub fn mutate_all_weights(&mut self, config: &GeneticConfig, rng: &mut impl Rng) {
        for gene in &mut self.genes {
            gene.nudge_weight(config, rng);
        }
    }

    /// Replaces every weight with a uniform draw from
    /// ±`initial_weight_perturbation`.
    pub fn mutate_reset_weights(&mut self, config: &GeneticConfig, rng: &mut impl Rng) {
        for gene in &mut self.genes {
            gene.randomize_weight(config, rng);
        }
    }

    /// Erases a uniformly chosen gene and returns it.
    ///
    /// Neurons referenced only by the removed gene stay in the
    /// known-neuron list; decoding simply leaves them unconnected.
    pub fn mutate_remove_gene(&mut self, rng: &mut impl Rng) -> Result<Gene, MutationError> {
        if self.genes.is_empty() {
            return Err(MutationError::NoGenes);
        }
        let index = rng.gen_range(0..self.genes.len());
        Ok(self.genes.remove(index))
    }

    /// Enables a uniformly chosen disabled gene.
    pub fn mutate_reenable_gene(&mut self, rng: &mut impl Rng) -> Result<(), MutationError> {
        let index = (0..self.genes.len())
            .filter(|&i| !self.genes[i].enabled())
            .choose(rng)
            .ok_or(MutationError::NoDisabledGene)?;
        self.genes[index].set_enabled(true);
        Ok(())
    }

    /// Inverts the enable flag of a uniformly chosen gene.
    pub fn mutate_toggle_enable(&mut self, rng: &mut impl Rng) -> Result<(), MutationError> {
        if self.genes.is_empty() {
            return Err(MutationError::NoGenes);
        }
        let index = rng.gen_range(0..self.genes.len());
        let enabled = self.genes[index].enabled();
        self.genes[index].set_enabled(!enabled);
        Ok(())
    }

    /// Combines the genome with `other`, selecting one of the three
    /// crossover variants by weighted sampling over
    /// [`CrossoverWeights`].
    pub fn crossover_random(
        &self,
        other: &Genome,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Genome {
        let weights = config.crossover_weights;
        let mut draw = rng.gen_range(0..weights.total());

        if draw < weights.multipoint_avg {
            return self.crossover_multipoint_avg(other, config, rng);
        }
        draw -= weights.multipoint_avg;

        if draw < weights.multipoint_best {
            return self.crossover_multipoint_best(other, config, rng);
        }

        // the last option is...
        self.crossover_multipoint_rnd(other, config, rng)
    }

    /// Multipoint crossover taking matching genes from the fitter
    /// parent.
    pub fn crossover_multipoint_best(
        &self,
        other: &Genome,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Genome {
        let first_is_fitter = self.fitness > other.fitness;
        self.crossover_multipoint(other, config, rng, move |_, own, theirs| {
            if first_is_fitter {
                own.clone()
            } else {
                theirs.clone()
            }
        })
    }

    /// Multipoint crossover deciding each matching gene by a fair
    /// coin.
    pub fn crossover_multipoint_rnd(
        &self,
        other: &Genome,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Genome {
        self.crossover_multipoint(other, config, rng, |rng, own, theirs| {
            if rng.gen::<bool>() {
                own.clone()
            } else {
                theirs.clone()
            }
        })
    }

    /// Multipoint crossover averaging the weights of matching genes.
    pub fn crossover_multipoint_avg(
        &self,
        other: &Genome,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) -> Genome {
        self.crossover_multipoint(other, config, rng, |_, own, theirs| {
            let mut gene = own.clone();
            gene.set_weight((own.weight() + theirs.weight()) / 2.0);
            gene
        })
    }

    /// Walks both parents' gene lists in merge order. Matching genes
    /// are resolved by `pick_matching`; disjoint and excess genes are
    /// inherited from the fitter parent only, or from both parents
    /// when the fitnesses are exactly equal. The offspring's
    /// known-neuron list is rebuilt from the inherited endpoints plus
    /// the reserved range.
    fn crossover_multipoint<R: Rng>(
        &self,
        other: &Genome,
        config: &GeneticConfig,
        rng: &mut R,
        mut pick_matching: impl FnMut(&mut R, &Gene, &Gene) -> Gene,
    ) -> Genome {
        let mut child = Genome::barebones(self.input_count, self.output_count);
        let inherit_own = self.fitness >= other.fitness;
        let inherit_theirs = other.fitness >= self.fitness;

        let own = &self.genes;
        let theirs = &other.genes;
        let (mut i, mut j) = (0, 0);
        while i < own.len() && j < theirs.len() {
            match own[i].innovation().cmp(&theirs[j].innovation()) {
                Ordering::Equal => {
                    let mut gene = pick_matching(rng, &own[i], &theirs[j]);
                    let disabled_in_parent = !own[i].enabled() || !theirs[j].enabled();
                    Self::resolve_inherited_enable(&mut gene, disabled_in_parent, config, rng);
                    child.add_gene(gene);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    if inherit_own {
                        Self::inherit_unmatched(&mut child, &own[i], config, rng);
                    }
                    i += 1;
                }
                Ordering::Greater => {
                    if inherit_theirs {
                        Self::inherit_unmatched(&mut child, &theirs[j], config, rng);
                    }
                    j += 1;
                }
            }
        }
        if inherit_own {
            for gene in &own[i..] {
                Self::inherit_unmatched(&mut child, gene, config, rng);
            }
        }
        if inherit_theirs {
            for gene in &theirs[j..] {
                Self::inherit_unmatched(&mut child, gene, config, rng);
            }
        }

        child
    }

    fn inherit_unmatched(
        child: &mut Genome,
        gene: &Gene,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) {
        let mut gene = gene.clone();
        let disabled_in_parent = !gene.enabled();
        Self::resolve_inherited_enable(&mut gene, disabled_in_parent, config, rng);
        child.add_gene(gene);
    }

    fn resolve_inherited_enable(
        gene: &mut Gene,
        disabled_in_parent: bool,
        config: &GeneticConfig,
        rng: &mut impl Rng,
    ) {
        if disabled_in_parent && rng.gen::<f64>() < config.p_inherit_disabled {
            gene.set_enabled(rng.gen::<f64>() < config.p_reenable);
        } else {
            gene.set_enabled(true);
        }
    }

    /// Decodes the genome into an executable [`Network`].
    ///
    /// Network neurons are allocated for the bias, each input, each
    /// output and each hidden neuron in known order; every _enabled_
    /// gene becomes a weighted link. Disabled genes are omitted.
    pub fn generate_network(&self) -> Network {
        let mut network = Network::new();

        // map genome neuron ids to network neuron ids
        let mut ids: HashMap<NeuronId, usize, RandomState> = HashMap::default();
        ids.insert(BIAS_ID, networks::BIAS_ID);

        for i in 0..self.input_count {
            ids.insert(i + 1, network.add_neuron(NeuronKind::Input, DEFAULT_ACTIVATION));
        }
        for o in 0..self.output_count {
            ids.insert(
                o + self.input_count + 1,
                network.add_neuron(NeuronKind::Output, DEFAULT_ACTIVATION),
            );
        }
        for &id in &self.known_neurons[self.input_count + self.output_count + 1..] {
            ids.insert(id, network.add_neuron(NeuronKind::Hidden, DEFAULT_ACTIVATION));
        }

        for gene in self.genes.iter().filter(|g| g.enabled()) {
            network.add_link(ids[&gene.from()], ids[&gene.to()], gene.weight());
        }

        network
    }

    /// Returns whether both genomes encode the same structure:
    /// identical I/O counts and identical gene lists. Fitness is
    /// ignored.
    pub fn same_structure(&self, other: &Genome) -> bool {
        self.input_count == other.input_count
            && self.output_count == other.output_count
            && self.genes == other.genes
    }

    /// Returns an iterator over the genes, ordered by innovation
    /// number.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.iter()
    }

    /// Returns the neurons the genome knows about: the reserved
    /// range first, then hidden neurons in discovery order.
    pub fn known_neurons(&self) -> &[NeuronId] {
        &self.known_neurons
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Returns the genome's current raw fitness.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Sets the genome's raw fitness, as measured by the external
    /// evaluator.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    pub(crate) fn write_to<W: io::Write>(
        &self,
        ser: &mut Serializer<W>,
    ) -> Result<(), SerializationError> {
        ser.field(self.input_count)?;
        ser.field(self.output_count)?;
        ser.field(self.fitness)?;
        ser.field(self.genes.len())?;
        ser.end_line()?;
        for gene in &self.genes {
            ser.field(gene.innovation())?;
            ser.field(gene.from())?;
            ser.field(gene.to())?;
            ser.field(gene.weight())?;
            ser.field(gene.enabled())?;
            ser.end_line()?;
        }
        Ok(())
    }

    pub(crate) fn read_from<R: io::BufRead>(
        des: &mut Deserializer<R>,
    ) -> Result<Genome, SerializationError> {
        let input_count = des.field()?;
        let output_count = des.field()?;
        let fitness = des.field()?;
        let gene_count: usize = des.field()?;

        let mut genome = Genome::barebones(input_count, output_count);
        genome.fitness = fitness;
        for _ in 0..gene_count {
            let innovation = des.field()?;
            let from = des.field()?;
            let to = des.field()?;
            let weight = des.field()?;
            let mut gene = Gene::new(innovation, from, to, weight);
            gene.set_enabled(des.field()?);
            genome.add_gene(gene);
        }
        Ok(genome)
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "<genome: (fitness = {}) {} input(s) {} output(s)",
            self.fitness, self.input_count, self.output_count
        )?;
        for gene in &self.genes {
            writeln!(f, "\t{}", gene)?;
        }
        write!(
            f,
            "\ttotal: {} genes and {} neurons>",
            self.genes.len(),
            self.known_neurons.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    fn config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::default()
        }
    }

    fn assert_invariants(genome: &Genome) {
        assert!(genome
            .genes
            .windows(2)
            .all(|w| w[0].innovation() < w[1].innovation()));
        for gene in &genome.genes {
            assert!(genome.known_neurons.contains(&gene.from()));
            assert!(genome.known_neurons.contains(&gene.to()));
        }
    }

    #[test]
    fn new_knows_reserved_neurons() {
        let genome = Genome::new(&config(3, 2));
        assert_eq!(genome.known_neurons(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(genome.genes().count(), 0);
    }

    #[test]
    fn add_gene_keeps_order_and_neurons() {
        let mut genome = Genome::new(&config(2, 1));
        genome.add_gene(Gene::new(5, 1, 3, 0.1));
        genome.add_gene(Gene::new(2, 2, 3, 0.2));
        genome.add_gene(Gene::new(9, 4, 4, 0.3));

        let innovations: Vec<_> = genome.genes().map(|g| g.innovation()).collect();
        assert_eq!(innovations, [2, 5, 9]);
        // 4 was unknown until the self-loop gene introduced it.
        assert_eq!(genome.known_neurons(), &[0, 1, 2, 3, 4]);
        assert_invariants(&genome);
    }

    #[test]
    fn distance_counts_disjoint_and_excess() {
        let mut config = config(2, 1);
        config.excess_coefficient = 1.0;
        config.disjoint_coefficient = 1.0;
        config.weight_coefficient = 1.0;

        let mut first = Genome::new(&config);
        for innovation in [1, 2, 3, 5, 8] {
            first.add_gene(Gene::new(innovation, 0, 3, 1.0));
        }
        let mut second = Genome::new(&config);
        for innovation in [1, 2, 4, 5, 9, 10] {
            second.add_gene(Gene::new(innovation, 0, 3, 1.0));
        }

        // Matching {1, 2, 5} with equal weights; the remaining five
        // genes split between disjoint and excess; N = 6.
        let distance = Genome::distance(&first, &second, &config);
        assert_abs_diff_eq!(distance, 5.0 / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            distance,
            Genome::distance(&second, &first, &config),
            epsilon = 1e-12
        );
    }

    #[test]
    fn distance_to_self_is_zero() {
        let config = config(2, 1);
        let mut genome = Genome::new(&config);
        for innovation in 0..8 {
            genome.add_gene(Gene::new(innovation, 1, 3, innovation as f64));
        }
        assert_eq!(Genome::distance(&genome, &genome, &config), 0.0);
    }

    #[test]
    fn small_genomes_are_not_discriminated() {
        let mut config = config(2, 1);
        config.excess_coefficient = 1.0;
        config.disjoint_coefficient = 1.0;
        config.weight_coefficient = 1.0;

        let mut first = Genome::new(&config);
        first.add_gene(Gene::new(0, 1, 3, 5.0));
        let mut second = Genome::new(&config);
        second.add_gene(Gene::new(7, 2, 3, -5.0));

        assert_eq!(Genome::distance(&first, &second, &config), 0.0);
        assert!(first.is_compatible_with(&second, &config, 0.1));
    }

    #[test]
    fn add_link_reuses_innovation_across_genomes() {
        let config = config(1, 1);
        let mut pool = InnovationPool::new(1, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut first = Genome::new(&config);
        let (target, innovation) = {
            let gene = first.mutate_add_link(&mut pool, &config, &mut rng).unwrap();
            (gene.endpoints(), gene.innovation())
        };

        // An independent genome adding the same link must end up with
        // the same innovation number.
        let mut second = Genome::new(&config);
        for _ in 0..100 {
            if second.contains_link(target.0, target.1) {
                break;
            }
            let _ = second.mutate_add_link(&mut pool, &config, &mut rng);
        }
        let twin = second
            .genes()
            .find(|g| g.endpoints() == target)
            .expect("link never drawn");
        assert_eq!(twin.innovation(), innovation);
    }

    #[test]
    fn add_neuron_splits_the_only_enabled_gene() {
        let mut pool = InnovationPool::new(2, 2);
        // Simulate three previously allocated innovations.
        for _ in 0..3 {
            pool.next_innovation();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let mut genome = Genome::new(&config(2, 2));
        let mut disabled = Gene::new(0, 1, 3, 0.3);
        disabled.set_enabled(false);
        genome.add_gene(disabled);
        genome.add_gene(Gene::new(1, 2, 3, 0.7));

        let (innovation_in, new_neuron, innovation_out) =
            genome.mutate_add_neuron(&mut pool, &mut rng).unwrap();

        assert_eq!(new_neuron, 2 + 2 + 1);
        assert_eq!((innovation_in, innovation_out), (3, 4));

        // The split gene is disabled and replaced by two genes
        // carrying its weight.
        let split = genome.genes().find(|g| g.innovation() == 1).unwrap();
        assert!(!split.enabled());
        let gene_in = genome.genes().find(|g| g.innovation() == 3).unwrap();
        assert_eq!(gene_in.endpoints(), (2, new_neuron));
        assert_eq!(gene_in.weight(), 0.7);
        let gene_out = genome.genes().find(|g| g.innovation() == 4).unwrap();
        assert_eq!(gene_out.endpoints(), (new_neuron, 3));
        assert_eq!(gene_out.weight(), 0.7);
        assert_invariants(&genome);
    }

    #[test]
    fn add_neuron_reuses_recorded_split() {
        let mut pool = InnovationPool::new(1, 1);
        // Innovation 0 is taken by the hand-built gene below.
        pool.next_innovation();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = config(1, 1);

        let mut first = Genome::new(&config);
        first.add_gene(Gene::new(0, 1, 2, 0.5));
        let mut second = first.clone();

        let split_a = first.mutate_add_neuron(&mut pool, &mut rng).unwrap();
        let split_b = second.mutate_add_neuron(&mut pool, &mut rng).unwrap();
        assert_eq!(split_a, split_b);
    }

    #[test]
    fn crossover_closure_over_parent_innovations() {
        let config = config(2, 1);
        let mut pool = InnovationPool::new(2, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let mut first = Genome::new(&config);
        let mut second = Genome::new(&config);
        for _ in 0..12 {
            let _ = first.mutate_add_link(&mut pool, &config, &mut rng);
            let _ = second.mutate_add_link(&mut pool, &config, &mut rng);
        }
        let _ = first.mutate_add_neuron(&mut pool, &mut rng);
        first.set_fitness(2.0);
        second.set_fitness(1.0);

        let parent_innovations: Vec<_> = first
            .genes()
            .chain(second.genes())
            .map(|g| g.innovation())
            .collect();

        for _ in 0..20 {
            let child = first.crossover_random(&second, &config, &mut rng);
            assert!(child
                .genes()
                .all(|g| parent_innovations.contains(&g.innovation())));
            assert_invariants(&child);
        }
    }

    #[test]
    fn equal_fitness_parents_bequeath_both_sides() {
        let mut config = config(2, 1);
        config.p_inherit_disabled = 0.0;

        let mut first = Genome::new(&config);
        first.add_gene(Gene::new(0, 1, 3, 1.0));
        first.add_gene(Gene::new(2, 2, 3, 1.0));
        let mut second = Genome::new(&config);
        second.add_gene(Gene::new(0, 1, 3, 1.0));
        second.add_gene(Gene::new(5, 0, 3, 1.0));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let child = first.crossover_multipoint_best(&second, &config, &mut rng);
        let innovations: Vec<_> = child.genes().map(|g| g.innovation()).collect();
        assert_eq!(innovations, [0, 2, 5]);
    }

    #[test]
    fn random_mutations_preserve_structure() {
        let config = config(3, 2);
        let mut pool = InnovationPool::new(3, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let mut genome = Genome::new(&config);
        for _ in 0..300 {
            genome.mutate_random(&mut pool, &config, &mut rng);
            assert_invariants(&genome);
            for gene in genome.genes() {
                // Destinations are never inputs or the bias.
                assert!(gene.to() > genome.input_count());
            }
        }
    }

    #[test]
    fn genome_serde_round_trip() {
        let mut genome = Genome::new(&config(2, 1));
        genome.add_gene(Gene::new(0, 1, 3, 1.5));
        let mut disabled = Gene::new(4, 0, 3, -0.25);
        disabled.set_enabled(false);
        genome.add_gene(disabled);
        genome.set_fitness(3.0);

        let json = serde_json::to_string(&genome).unwrap();
        let copy: Genome = serde_json::from_str(&json).unwrap();
        assert_eq!(copy, genome);
    }

    #[test]
    fn decoded_network_skips_disabled_genes() {
        let mut genome = Genome::new(&config(1, 1));
        genome.add_gene(Gene::new(0, 1, 2, 1.0));
        let mut suppressed = Gene::new(1, 0, 2, 100.0);
        suppressed.set_enabled(false);
        genome.add_gene(suppressed);

        let mut network = genome.generate_network();
        let low = network.evaluate(&[0.0])[0];
        let high = network.evaluate(&[10.0])[0];
        // Only the enabled input link drives the output.
        assert!(high > low);
        assert!(low < 0.6);
    }
}
