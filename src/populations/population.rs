use crate::genomics::Genome;
use crate::populations::SpeciesId;
use crate::GenomeId;

use serde::{Deserialize, Serialize};

use std::ops::{Index, IndexMut};

/// Storage for one generation's genomes, indexable by [`GenomeId`],
/// plus the reverse mapping from each genome to its current species.
///
/// Ids are plain indices and stay stable within a generation; the
/// driver rebuilds the whole container at every epoch, so species
/// reference genomes by id and never by pointer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Population {
    genomes: Vec<Genome>,
    species_of: Vec<Option<SpeciesId>>,
}

impl Population {
    pub fn new() -> Population {
        Population::default()
    }

    pub fn with_capacity(capacity: usize) -> Population {
        Population {
            genomes: Vec::with_capacity(capacity),
            species_of: Vec::with_capacity(capacity),
        }
    }

    /// Appends a genome, returning the id it is reachable under for
    /// the rest of the generation.
    pub fn add_genome(&mut self, genome: Genome) -> GenomeId {
        self.genomes.push(genome);
        self.species_of.push(None);
        self.genomes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Returns an iterator over all genomes, in id order.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    pub(crate) fn genomes_mut(&mut self) -> impl Iterator<Item = &mut Genome> {
        self.genomes.iter_mut()
    }

    /// Returns the species the genome is currently assigned to, if
    /// speciation has run since the genome was added.
    pub fn species_of(&self, id: GenomeId) -> Option<SpeciesId> {
        self.species_of[id]
    }

    pub(crate) fn assign_species(&mut self, id: GenomeId, species: SpeciesId) {
        self.species_of[id] = Some(species);
    }
}

impl Index<GenomeId> for Population {
    type Output = Genome;

    fn index(&self, id: GenomeId) -> &Genome {
        &self.genomes[id]
    }
}

impl IndexMut<GenomeId> for Population {
    fn index_mut(&mut self, id: GenomeId) -> &mut Genome {
        &mut self.genomes[id]
    }
}
