use crate::genomics::Gene;
use crate::serialization::{Deserializer, SerializationError, Serializer};
use crate::{Innovation, NeuronId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};
use std::io;

/// Discriminates the two kinds of structural event a genome
/// can undergo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InnovationKind {
    /// A new synapse between two existing neurons.
    NewLink,
    /// A synapse split in two by a freshly allocated hidden neuron.
    NewNeuron,
}

/// A record of a structural event, as registered by the genome
/// that first performed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InnovationRecord {
    NewLink {
        innovation: Innovation,
        from: NeuronId,
        to: NeuronId,
    },
    /// Splitting the edge `from -> to` by inserting `new_neuron`,
    /// producing the two genes `innovation_in` and `innovation_out`.
    NewNeuron {
        innovation_in: Innovation,
        innovation_out: Innovation,
        from: NeuronId,
        to: NeuronId,
        new_neuron: NeuronId,
    },
}

impl InnovationRecord {
    pub fn kind(&self) -> InnovationKind {
        match self {
            InnovationRecord::NewLink { .. } => InnovationKind::NewLink,
            InnovationRecord::NewNeuron { .. } => InnovationKind::NewNeuron,
        }
    }

    pub fn endpoints(&self) -> (NeuronId, NeuronId) {
        match *self {
            InnovationRecord::NewLink { from, to, .. } => (from, to),
            InnovationRecord::NewNeuron { from, to, .. } => (from, to),
        }
    }

    fn key(&self) -> (InnovationKind, NeuronId, NeuronId) {
        let (from, to) = self.endpoints();
        (self.kind(), from, to)
    }
}

/// An `InnovationPool` keeps track of every structural event in a
/// run, in order to make sure identical mutations are assigned the
/// same innovation numbers (and, for neuron splits, the same hidden
/// neuron id).
///
/// When two genomes of the same generation independently add the
/// same link or split the same edge, their descendants must align
/// correctly at crossover time; the pool is the sole arbiter of
/// that alignment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InnovationPool {
    next_innovation: Innovation,
    next_hidden_neuron: NeuronId,
    genes: HashMap<(NeuronId, NeuronId), Gene, RandomState>,
    innovations: HashMap<(InnovationKind, NeuronId, NeuronId), InnovationRecord, RandomState>,
}

impl InnovationPool {
    /// Creates an empty pool for genomes with the given I/O counts.
    ///
    /// Hidden neuron ids start right past the reserved range
    /// (bias, inputs, outputs).
    pub fn new(input_count: usize, output_count: usize) -> InnovationPool {
        InnovationPool {
            next_innovation: 0,
            next_hidden_neuron: input_count + output_count + 1,
            genes: HashMap::default(),
            innovations: HashMap::default(),
        }
    }

    pub(crate) fn from_parts(
        next_innovation: Innovation,
        next_hidden_neuron: NeuronId,
        genes: impl IntoIterator<Item = Gene>,
        innovations: impl IntoIterator<Item = InnovationRecord>,
    ) -> InnovationPool {
        InnovationPool {
            next_innovation,
            next_hidden_neuron,
            genes: genes.into_iter().map(|g| (g.endpoints(), g)).collect(),
            innovations: innovations.into_iter().map(|r| (r.key(), r)).collect(),
        }
    }

    /// Returns the next innovation number and increments the counter.
    pub fn next_innovation(&mut self) -> Innovation {
        let innovation = self.next_innovation;
        self.next_innovation += 1;
        innovation
    }

    /// Returns the next hidden neuron id and increments the counter.
    pub fn next_hidden_neuron(&mut self) -> NeuronId {
        let id = self.next_hidden_neuron;
        self.next_hidden_neuron += 1;
        id
    }

    /// Returns the canonical gene recorded for the directed pair
    /// `(from, to)`, if any.
    ///
    /// The weight of the canonical copy is meaningless; consumers
    /// re-randomise it.
    pub fn find_gene(&self, from: NeuronId, to: NeuronId) -> Option<&Gene> {
        self.genes.get(&(from, to))
    }

    /// Records `gene` as the canonical gene for its endpoint pair.
    /// The first registration wins; later calls for the same pair
    /// are ignored.
    pub fn register_gene(&mut self, gene: Gene) {
        if let Entry::Vacant(entry) = self.genes.entry(gene.endpoints()) {
            entry.insert(gene);
        }
    }

    /// Returns the innovation recorded for `(kind, from, to)`, if any.
    pub fn find_innovation(
        &self,
        kind: InnovationKind,
        from: NeuronId,
        to: NeuronId,
    ) -> Option<&InnovationRecord> {
        self.innovations.get(&(kind, from, to))
    }

    /// Records a structural innovation. The first registration for a
    /// given `(kind, from, to)` wins; later calls are ignored.
    pub fn register_innovation(&mut self, record: InnovationRecord) {
        if let Entry::Vacant(entry) = self.innovations.entry(record.key()) {
            entry.insert(record);
        }
    }

    /// Returns an iterator over all canonical genes.
    /// No ordering is guaranteed.
    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.genes.values()
    }

    /// Returns an iterator over all recorded innovations.
    /// No ordering is guaranteed.
    pub fn innovations(&self) -> impl Iterator<Item = &InnovationRecord> {
        self.innovations.values()
    }

    pub(crate) fn counters(&self) -> (Innovation, NeuronId) {
        (self.next_innovation, self.next_hidden_neuron)
    }

    pub(crate) fn write_to<W: io::Write>(
        &self,
        ser: &mut Serializer<W>,
    ) -> Result<(), SerializationError> {
        ser.field(self.next_innovation)?;
        ser.field(self.next_hidden_neuron)?;
        ser.end_line()?;

        // Registries are sorted by innovation number for a stable
        // stream.
        let mut genes: Vec<&Gene> = self.genes.values().collect();
        genes.sort_unstable_by_key(|g| g.innovation());
        ser.field(genes.len())?;
        ser.end_line()?;
        for gene in genes {
            ser.field(gene.innovation())?;
            ser.field(gene.from())?;
            ser.field(gene.to())?;
            ser.field(gene.weight())?;
            ser.field(gene.enabled())?;
            ser.end_line()?;
        }

        let mut records: Vec<&InnovationRecord> = self.innovations.values().collect();
        records.sort_unstable_by_key(|r| match r {
            InnovationRecord::NewLink { innovation, .. } => *innovation,
            InnovationRecord::NewNeuron { innovation_in, .. } => *innovation_in,
        });
        ser.field(records.len())?;
        ser.end_line()?;
        for record in records {
            match *record {
                InnovationRecord::NewLink {
                    innovation,
                    from,
                    to,
                } => {
                    ser.field("link")?;
                    ser.field(innovation)?;
                    ser.field(from)?;
                    ser.field(to)?;
                }
                InnovationRecord::NewNeuron {
                    innovation_in,
                    innovation_out,
                    from,
                    to,
                    new_neuron,
                } => {
                    ser.field("neuron")?;
                    ser.field(innovation_in)?;
                    ser.field(innovation_out)?;
                    ser.field(from)?;
                    ser.field(to)?;
                    ser.field(new_neuron)?;
                }
            }
            ser.end_line()?;
        }
        Ok(())
    }

    pub(crate) fn read_from<R: io::BufRead>(
        des: &mut Deserializer<R>,
    ) -> Result<InnovationPool, SerializationError> {
        let next_innovation = des.field()?;
        let next_hidden_neuron = des.field()?;

        let gene_count: usize = des.field()?;
        let mut genes = Vec::with_capacity(gene_count);
        for _ in 0..gene_count {
            let innovation = des.field()?;
            let from = des.field()?;
            let to = des.field()?;
            let weight = des.field()?;
            let mut gene = Gene::new(innovation, from, to, weight);
            gene.set_enabled(des.field()?);
            genes.push(gene);
        }

        let record_count: usize = des.field()?;
        let mut records = Vec::with_capacity(record_count);
        for _ in 0..record_count {
            let tag: String = des.field()?;
            let record = match tag.as_str() {
                "link" => InnovationRecord::NewLink {
                    innovation: des.field()?,
                    from: des.field()?,
                    to: des.field()?,
                },
                "neuron" => InnovationRecord::NewNeuron {
                    innovation_in: des.field()?,
                    innovation_out: des.field()?,
                    from: des.field()?,
                    to: des.field()?,
                    new_neuron: des.field()?,
                },
                _ => {
                    return Err(SerializationError::Malformed(format!(
                        "unknown innovation kind {:?}",
                        tag
                    )))
                }
            };
            records.push(record);
        }

        Ok(InnovationPool::from_parts(
            next_innovation,
            next_hidden_neuron,
            genes,
            records,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_strictly_increase() {
        let mut pool = InnovationPool::new(2, 1);

        let innovations: Vec<_> = (0..10).map(|_| pool.next_innovation()).collect();
        assert!(innovations.windows(2).all(|w| w[0] < w[1]));

        let neurons: Vec<_> = (0..10).map(|_| pool.next_hidden_neuron()).collect();
        assert_eq!(neurons[0], 2 + 1 + 1);
        assert!(neurons.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn gene_registry_first_write_wins() {
        let mut pool = InnovationPool::new(2, 1);

        let first = pool.next_innovation();
        pool.register_gene(Gene::new(first, 1, 3, 0.5));
        let second = pool.next_innovation();
        pool.register_gene(Gene::new(second, 1, 3, -0.5));

        assert_eq!(pool.find_gene(1, 3).unwrap().innovation(), first);
        assert!(pool.find_gene(3, 1).is_none());
    }

    #[test]
    fn innovation_registry_keyed_by_kind_and_endpoints() {
        let mut pool = InnovationPool::new(2, 1);

        pool.register_innovation(InnovationRecord::NewLink {
            innovation: 7,
            from: 1,
            to: 3,
        });
        pool.register_innovation(InnovationRecord::NewNeuron {
            innovation_in: 8,
            innovation_out: 9,
            from: 1,
            to: 3,
            new_neuron: 4,
        });

        // Same endpoints, different kinds: both are retrievable.
        assert_eq!(
            pool.find_innovation(InnovationKind::NewLink, 1, 3)
                .unwrap()
                .kind(),
            InnovationKind::NewLink
        );
        match pool.find_innovation(InnovationKind::NewNeuron, 1, 3) {
            Some(&InnovationRecord::NewNeuron { new_neuron, .. }) => assert_eq!(new_neuron, 4),
            other => panic!("unexpected record: {:?}", other),
        }

        // A second split of the same edge keeps the original record.
        pool.register_innovation(InnovationRecord::NewNeuron {
            innovation_in: 100,
            innovation_out: 101,
            from: 1,
            to: 3,
            new_neuron: 40,
        });
        match pool.find_innovation(InnovationKind::NewNeuron, 1, 3) {
            Some(&InnovationRecord::NewNeuron { innovation_in, .. }) => {
                assert_eq!(innovation_in, 8)
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }
}
