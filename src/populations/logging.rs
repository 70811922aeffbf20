use crate::genomics::Genome;
use crate::populations::{Neat, SpeciesId};

use std::fmt;

/// Defines how much of a population each snapshot clones.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species champions only.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A reporting-level dependent store of genomes from one
/// generation.
#[derive(Clone, Debug)]
pub enum GenerationSample {
    /// Species ids, their genomes and stagnation level.
    Species(Vec<(SpeciesId, Vec<Genome>, usize)>),
    /// Species ids, champions and stagnation level.
    SpeciesChampions(Vec<(SpeciesId, Genome, usize)>),
    /// Only the population champion.
    PopulationChampion(Genome),
    /// Empty.
    None,
}

/// A snapshot of a population at one generation.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation: usize,
    pub species_count: usize,
    pub best_fitness: f64,
    pub fitness: Stats,
    pub sample: GenerationSample,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {} species, best fitness {:.4}, fitness {:?}",
            self.generation, self.species_count, self.best_fitness, self.fitness
        )
    }
}

/// Basic statistics over a non-empty data sequence.
#[derive(Clone, Debug)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Computes statistics over the values yielded by `data`.
    ///
    /// # Panics
    /// Panics if `data` yields nothing, or yields values that do not
    /// compare (NaN).
    ///
    /// # Examples
    /// ```
    /// use neatkit::populations::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        assert!(!data.is_empty(), "no data to compute statistics over");
        data.sort_by(|a, b| {
            a.partial_cmp(b)
                .unwrap_or_else(|| panic!("uncomparable value detected (NaN)"))
        });

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };

        Stats {
            maximum: *data.last().unwrap(),
            minimum: data[0],
            mean: data.iter().sum::<f64>() / data.len() as f64,
            median,
        }
    }
}

/// A log of the evolution of a population over time.
///
/// # Examples
/// ```
/// use neatkit::genomics::GeneticConfig;
/// use neatkit::populations::{EvolutionLogger, Neat, PopulationConfig, ReportingLevel};
///
/// let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
/// let mut neat = Neat::with_seed(GeneticConfig::default(), PopulationConfig::default(), 0);
///
/// neat.evaluate_fitness(|network| network.evaluate(&[1.0])[0]);
/// logger.log(&neat);
///
/// for snapshot in logger.iter() {
///     println!("{}", snapshot);
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: Vec::new(),
        }
    }

    /// Stores a snapshot of the driver's population. Call after
    /// fitness evaluation so the recorded fitnesses are meaningful.
    pub fn log(&mut self, neat: &Neat) {
        let population = neat.population();
        self.logs.push(Log {
            generation: neat.generation(),
            species_count: neat.species().count(),
            best_fitness: neat.champion().fitness(),
            fitness: Stats::from(population.genomes().map(|g| g.fitness())),
            sample: match self.reporting_level {
                ReportingLevel::AllGenomes => GenerationSample::Species(
                    neat.species()
                        .map(|s| {
                            (
                                s.id(),
                                s.members().iter().map(|&id| population[id].clone()).collect(),
                                s.time_stagnated(),
                            )
                        })
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationSample::SpeciesChampions(
                    neat.species()
                        .map(|s| (s.id(), s.champion(population).clone(), s.time_stagnated()))
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => {
                    GenerationSample::PopulationChampion(neat.champion().clone())
                }
                ReportingLevel::NoGenomes => GenerationSample::None,
            },
        })
    }

    /// Iterates over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

impl Default for ReportingLevel {
    fn default() -> ReportingLevel {
        ReportingLevel::NoGenomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_over_even_sized_data() {
        let stats = Stats::from([4.0, 1.0, 3.0, 2.0].iter().copied());
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.minimum, 1.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
    }
}
