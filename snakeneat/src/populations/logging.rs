use super::{Population, SpeciesID};

use crate::genomics::Genome;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub species_sizes: Vec<(SpeciesID, usize)>,
    pub genome_stats: Vec<(String, Stats)>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {:?}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {:?}", self.species_count)?;
        writeln!(
            f,
            "\tspecies_sizes: {:?}",
            self.species_sizes.iter().map(|(_, size)| size).collect::<Vec<_>>()
        )?;
        for (name, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if the sequence is empty.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::logging::Stats;
    ///
    /// let stats = Stats::from_values([-2.0, -1.0, 0.5, 1.0, 1.5]).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// assert!(Stats::from_values(std::iter::empty()).is_none());
    /// ```
    pub fn from_values(data: impl IntoIterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.into_iter().collect();
        if data.is_empty() {
            return None;
        }
        data.sort_unstable_by(f32::total_cmp);

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.3}, min {:.3}, mean {:.3}, median {:.3}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Species IDs and member genomes.
    Species(Vec<(SpeciesID, Vec<Genome>)>),
    /// Only species IDs and species champions.
    SpeciesChampions(Vec<(SpeciesID, Genome)>),
    /// Only population champion.
    PopulationChampion(Genome),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    /// assert_eq!(logger.iter().count(), 0);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population.
    ///
    /// The `genome_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the population,
    /// where each statistic is named by `stat_names`.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::GeneticConfig;
    /// use snakeneat::logging::{EvolutionLogger, ReportingLevel};
    /// use snakeneat::{Population, PopulationConfig};
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// let population = Population::new(
    ///     PopulationConfig { size: std::num::NonZeroUsize::new(10).unwrap(), ..PopulationConfig::default() },
    ///     GeneticConfig::default(),
    /// ).unwrap();
    ///
    /// logger.log(&population, &|g| [g.fitness, g.connections().count() as f32], ["fitness", "size"]);
    ///
    /// let log = logger.last().unwrap();
    /// assert_eq!(log.generation_number, 0);
    /// assert_eq!(log.genome_stats[1].0, "size");
    /// ```
    pub fn log<GSE, const N: usize>(
        &mut self,
        population: &Population,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        GSE: Fn(&Genome) -> [f32; N],
    {
        let stats: Vec<[f32; N]> = population.agents().iter().map(genome_stat_extractor).collect();
        let genome_stats = stat_names
            .iter()
            .map(|name| String::from(*name))
            .zip(unzip_n_vecs(stats))
            .filter_map(|(name, data)| Stats::from_values(data).map(|s| (name, s)))
            .collect();

        let agents = population.agents();
        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                    population
                        .species()
                        .iter()
                        .map(|s| (s.id(), population.genomes_of(s).cloned().collect()))
                        .collect(),
                ),
                ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                    population
                        .species()
                        .iter()
                        .filter_map(|s| s.champion(agents).map(|c| (s.id(), c.clone())))
                        .collect(),
                ),
                ReportingLevel::PopulationChampion => match population.champion() {
                    Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                    None => GenerationMemberRecord::None,
                },
                ReportingLevel::NoGenomes => GenerationMemberRecord::None,
            },
            species_count: population.species().len(),
            species_sizes: population.species().iter().map(|s| (s.id(), s.len())).collect(),
            genome_stats,
        })
    }

    /// Returns the latest snapshot, if any.
    pub fn last(&self) -> Option<&Log> {
        self.logs.last()
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(items: Vec<[T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::with_capacity(items.len()); N];
    for row in items {
        for (column, item) in vecs.iter_mut().zip(row) {
            column.push(item);
        }
    }
    vecs
}
