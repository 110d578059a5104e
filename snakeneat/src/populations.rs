//! A Population is a collection of genomes.
//! These are grouped into species, pruned by
//! truncation selection and refilled from the
//! survivors, using the fitness assigned by an
//! environment driver as the source of selective
//! pressure.
mod config;
mod errors;
pub mod logging;
mod record;
mod species;

pub use config::PopulationConfig;
pub use errors::EvolutionError;
pub use record::PopulationRecord;
pub use species::{Species, SpeciesID};

use crate::genomics::{GeneticConfig, Genome, InnovationRegistry};
use errors::fatal;

use log::debug;
use rand::prelude::{Rng, SeedableRng, SliceRandom};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// A population of genomes.
///
/// The population owns the innovation registry shared by
/// all its genomes, and the seeded random number generator
/// every random decision is drawn from, so a population
/// (and the driver's fitness assignments) fully determine
/// the next generation. It can be serialized to checkpoint
/// a run, as a [`PopulationRecord`] that is checked for
/// consistency when loaded.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "PopulationRecord", try_from = "PopulationRecord")]
pub struct Population {
    agents: Vec<Genome>,
    species: Vec<Species>,
    registry: InnovationRegistry,
    rng: ChaCha8Rng,
    generation: usize,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population using the passed configurations.
    /// Every genome is created with one random structural
    /// mutation, and the population is speciated.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::InvalidConfig`] if either
    /// configuration fails validation, and an error if the
    /// innovation registry is exhausted.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::GeneticConfig;
    /// use snakeneat::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(population.agents().len(), 20);
    /// assert_eq!(
    ///     population.species().iter().map(|s| s.len()).sum::<usize>(),
    ///     20
    /// );
    /// ```
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
    ) -> Result<Population, EvolutionError> {
        population_config.validate()?;
        genetic_config.validate()?;
        let mut population = Population::empty(population_config, genetic_config);
        population.create_agents(
            population.population_config.size,
            population.genetic_config.input_count,
            population.genetic_config.output_count,
        )?;
        population.speciate_agents();
        Ok(population)
    }

    /// Creates a new population using the passed configurations,
    /// and seeds it with the specified genomes, such as champions
    /// of a previous run. Their connections are registered in the
    /// population's innovation registry. If the number of seed
    /// genomes is not as large as the configured population size,
    /// the remaining space is filled as in [`new`].
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::InvalidConfig`] if either configuration
    /// fails validation.
    /// Returns [`EvolutionError::IncompatibleSeed`] if there are more
    /// seed genomes than the configured size, or any of them has a
    /// different input or output count than the genetic configuration.
    /// Returns [`EvolutionError::Registry`] if the seed genomes assign
    /// conflicting innovation numbers.
    ///
    /// [`new`]: Population::new
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use snakeneat::{Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let genetic_config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::default()
    /// };
    /// let mut champion = Genome::new(&genetic_config);
    /// champion.connect(1, 3, 1.0, &mut InnovationRegistry::new()).unwrap();
    ///
    /// let population = Population::new_seeded(
    ///     vec![champion.clone()],
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(10).unwrap(),
    ///         ..PopulationConfig::default()
    ///     },
    ///     genetic_config,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(population.agents().len(), 10);
    /// assert_eq!(&population.agents()[0], &champion);
    /// assert_eq!(population.registry().lookup(1, 3), Some(1));
    /// ```
    pub fn new_seeded(
        genomes: Vec<Genome>,
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
    ) -> Result<Population, EvolutionError> {
        population_config.validate()?;
        genetic_config.validate()?;
        if genomes.len() > population_config.size.get()
            || genomes.iter().any(|g| {
                g.input_count() != genetic_config.input_count.get()
                    || g.output_count() != genetic_config.output_count.get()
            })
        {
            return Err(EvolutionError::IncompatibleSeed);
        }

        let mut population = Population::empty(population_config, genetic_config);
        for genome in &genomes {
            population.registry.absorb(genome)?;
        }
        population.agents = genomes;
        if let Some(missing) =
            NonZeroUsize::new(population.population_config.size.get() - population.agents.len())
        {
            population.create_agents(
                missing,
                population.genetic_config.input_count,
                population.genetic_config.output_count,
            )?;
        }
        population.speciate_agents();
        Ok(population)
    }

    fn empty(population_config: PopulationConfig, genetic_config: GeneticConfig) -> Population {
        Population {
            agents: Vec::with_capacity(population_config.size.get()),
            species: vec![],
            registry: InnovationRegistry::new(),
            rng: ChaCha8Rng::seed_from_u64(population_config.seed),
            generation: 0,
            population_config,
            genetic_config,
        }
    }

    /// Appends `n` new genomes with the specified input and
    /// output counts to the population. Each genome is given
    /// one random structural mutation, a node or a connection
    /// mutation with equal chance.
    ///
    /// Species are not updated; call [`speciate_agents`]
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the innovation registry is exhausted.
    /// Mutations with nothing to act on are skipped.
    ///
    /// [`speciate_agents`]: Population::speciate_agents
    pub fn create_agents(
        &mut self,
        n: NonZeroUsize,
        input_count: NonZeroUsize,
        output_count: NonZeroUsize,
    ) -> Result<(), EvolutionError> {
        for _ in 0..n.get() {
            let mut genome = Genome::with_io(input_count, output_count);
            let mutation = if self.rng.gen_bool(0.5) {
                genome
                    .add_connection(&mut self.registry, &self.genetic_config, &mut self.rng)
                    .map(|_| ())
            } else {
                genome
                    .add_node(&mut self.registry, &self.genetic_config, &mut self.rng)
                    .map(|_| ())
            };
            if let Err(e) = mutation {
                if let Some(e) = fatal(e) {
                    return Err(e);
                }
                debug!("skipped initial mutation: {}", e);
            }
            self.agents.push(genome);
        }
        Ok(())
    }

    /// Partitions the agents into species in a single greedy
    /// pass: each agent, in order, joins the first species whose
    /// representative is closer than the [distance threshold],
    /// or founds a new species.
    ///
    /// [distance threshold]: PopulationConfig::distance_threshold
    pub fn speciate_agents(&mut self) {
        self.species.clear();
        'agents: for (index, genome) in self.agents.iter().enumerate() {
            for species in &mut self.species {
                let representative = match species.representative_index() {
                    Some(r) => &self.agents[r],
                    None => continue,
                };
                if genome.speciation_difference(representative, &self.genetic_config)
                    < self.population_config.distance_threshold
                {
                    species.members.push(index);
                    continue 'agents;
                }
            }
            let id = SpeciesID(self.generation, self.species.len());
            self.species.push(Species::new(id, index));
        }
        debug!(
            "generation {}: {} agents in {} species",
            self.generation,
            self.agents.len(),
            self.species.len()
        );
    }

    /// Applies truncation selection within each species:
    /// members are sorted by _decreasing_ fitness, and the top
    /// [`survival_fraction`] of them (rounded down) is kept.
    /// Species left without members vanish.
    ///
    /// Agents are reordered species by species, and species'
    /// member positions are updated to match.
    ///
    /// # Note
    /// Fitness is maximized: the fittest members survive.
    /// Keeping the lower half of an ascending sort instead
    /// would select the _least_ fit genomes.
    ///
    /// [`survival_fraction`]: PopulationConfig::survival_fraction
    pub fn select_fit_agents(&mut self) {
        let fraction = self.population_config.survival_fraction.clamp(0.0, 1.0);
        let agents = &self.agents;
        for species in &mut self.species {
            species
                .members
                .sort_by(|&a, &b| agents[b].fitness.total_cmp(&agents[a].fitness));
            let survivors = (species.members.len() as f32 * fraction).floor() as usize;
            species.members.truncate(survivors);
        }
        self.species.retain(|s| !s.is_empty());
        self.compact_agents();
    }

    /// Drops agents that belong to no species, and renumbers
    /// species members to be contiguous in species order.
    fn compact_agents(&mut self) {
        let mut slots: Vec<Option<Genome>> = self.agents.drain(..).map(Some).collect();
        for species in &mut self.species {
            for member in &mut species.members {
                if let Some(genome) = slots.get_mut(*member).and_then(Option::take) {
                    *member = self.agents.len();
                    self.agents.push(genome);
                }
            }
        }
    }

    /// Refills the population to its configured size. Each species
    /// is allotted children in proportion to its mean fitness (or
    /// its size, if no species has positive fitness).
    fn reproduce(&mut self) -> Result<(), EvolutionError> {
        if self.agents.is_empty() {
            return Err(EvolutionError::DegeneratePopulation);
        }
        let deficit = self
            .population_config
            .size
            .get()
            .saturating_sub(self.agents.len());

        let mut weights: Vec<f32> = self
            .species
            .iter()
            .map(|s| s.mean_fitness(&self.agents).max(0.0))
            .collect();
        let mut weight_sum: f32 = weights.iter().sum();
        if !weight_sum.is_normal() {
            weights = self.species.iter().map(|s| s.len() as f32).collect();
            weight_sum = weights.iter().sum();
        }
        let allotted = round_retain_sum(
            &weights
                .iter()
                .map(|w| w / weight_sum * deficit as f32)
                .collect::<Vec<_>>(),
            deficit,
        );

        let mut next = Vec::with_capacity(self.population_config.size.get());
        for (species, &children) in self.species.iter_mut().zip(&allotted) {
            let parents: Vec<&Genome> =
                species.members.iter().map(|&i| &self.agents[i]).collect();
            let mut members = Vec::with_capacity(parents.len() + children);
            for parent in &parents {
                members.push(next.len());
                next.push((*parent).clone());
            }
            for _ in 0..children {
                let child = if parents.len() > 1
                    && self.rng.gen::<f32>() < self.population_config.crossover_chance
                {
                    let mut pair = parents.choose_multiple(&mut self.rng, 2);
                    match (pair.next(), pair.next()) {
                        (Some(a), Some(b)) => a.crossover(b, &mut self.rng),
                        _ => continue,
                    }
                } else {
                    match parents.choose(&mut self.rng) {
                        Some(parent) => (*parent).clone(),
                        None => continue,
                    }
                };
                members.push(next.len());
                next.push(child);
            }
            species.members = members;
        }
        self.agents = next;
        Ok(())
    }

    /// Rolls each agent for a node mutation, a connection
    /// mutation and a weight mutation, in that order.
    fn mutate(&mut self) -> Result<(), EvolutionError> {
        let config = &self.population_config;
        for genome in &mut self.agents {
            if self.rng.gen::<f32>() < config.node_mutation_rate {
                let mutation =
                    genome.add_node(&mut self.registry, &self.genetic_config, &mut self.rng);
                if let Err(e) = mutation {
                    if let Some(e) = fatal(e) {
                        return Err(e);
                    }
                    debug!("skipped node mutation: {}", e);
                }
            }
            if self.rng.gen::<f32>() < config.connection_mutation_rate {
                let mutation =
                    genome.add_connection(&mut self.registry, &self.genetic_config, &mut self.rng);
                if let Err(e) = mutation {
                    if let Some(e) = fatal(e) {
                        return Err(e);
                    }
                    debug!("skipped connection mutation: {}", e);
                }
            }
            if self.rng.gen::<f32>() < config.weight_mutation_rate {
                genome.mutate_weights(&self.genetic_config, &mut self.rng);
            }
        }
        Ok(())
    }

    /// Advances the population by one generation: agents are
    /// speciated, pruned by [`select_fit_agents`], refilled from
    /// the survivors of each species and mutated. Fitness is
    /// reset to 0, and the new generation is speciated.
    ///
    /// Children are copies of a random survivor of their species,
    /// or with [`crossover_chance`] the crossover of two of them.
    ///
    /// # Errors
    ///
    /// Returns [`EvolutionError::DegeneratePopulation`] if no agent
    /// survives selection, which leaves the population empty until
    /// [`reset`]. Returns [`EvolutionError::Registry`] if the
    /// innovation registry is exhausted.
    ///
    /// [`select_fit_agents`]: Population::select_fit_agents
    /// [`crossover_chance`]: PopulationConfig::crossover_chance
    /// [`reset`]: Population::reset
    pub fn next_generation(&mut self) -> Result<(), EvolutionError> {
        self.speciate_agents();
        self.select_fit_agents();
        self.reproduce()?;
        self.mutate()?;
        for genome in &mut self.agents {
            genome.fitness = 0.0;
        }
        self.generation += 1;
        self.speciate_agents();
        Ok(())
    }

    /// Resets the population to an initial randomized state
    /// with a fresh innovation registry, continuing the random
    /// number sequence. Used primarily in case of population
    /// degeneration.
    ///
    /// # Errors
    ///
    /// Returns an error if the innovation registry is exhausted.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::GeneticConfig;
    /// use snakeneat::{EvolutionError, Population, PopulationConfig};
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig {
    ///         // Nobody survives selection.
    ///         survival_fraction: 0.0,
    ///         ..PopulationConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(population.next_generation(), Err(EvolutionError::DegeneratePopulation));
    /// assert!(population.agents().is_empty());
    ///
    /// population.reset().unwrap();
    /// assert_eq!(population.agents().len(), 150);
    /// assert_eq!(population.generation(), 0);
    /// ```
    pub fn reset(&mut self) -> Result<(), EvolutionError> {
        self.agents.clear();
        self.species.clear();
        self.registry.reset();
        self.generation = 0;
        self.create_agents(
            self.population_config.size,
            self.genetic_config.input_count,
            self.genetic_config.output_count,
        )?;
        self.speciate_agents();
        Ok(())
    }

    /// Returns the currently best-performing genome, the
    /// earliest one on ties, or `None` if the population
    /// is empty.
    pub fn champion(&self) -> Option<&Genome> {
        self.agents.iter().fold(None, |best, g| match best {
            Some(b) if b.fitness.total_cmp(&g.fitness).is_ge() => Some(b),
            _ => Some(g),
        })
    }

    /// Returns the current genomes, in species order
    /// after a generation has been advanced.
    pub fn agents(&self) -> &[Genome] {
        &self.agents
    }

    /// Returns the current genomes mutably, so
    /// that the driver can assign their fitness.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::GeneticConfig;
    /// use snakeneat::{Population, PopulationConfig};
    ///
    /// let mut population =
    ///     Population::new(PopulationConfig::default(), GeneticConfig::default()).unwrap();
    ///
    /// let mut fitness = 0.0;
    /// for genome in population.agents_mut() {
    ///     fitness += 10.0;
    ///     genome.fitness = fitness;
    /// }
    ///
    /// assert_eq!(population.champion().map(|g| g.fitness), Some(150.0 * 10.0));
    /// ```
    pub fn agents_mut(&mut self) -> &mut [Genome] {
        &mut self.agents
    }

    /// Returns the current species.
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Returns an iterator over the genomes of a species.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::GeneticConfig;
    /// use snakeneat::{Population, PopulationConfig};
    ///
    /// let population =
    ///     Population::new(PopulationConfig::default(), GeneticConfig::default()).unwrap();
    ///
    /// for species in population.species() {
    ///     println!(
    ///         "Species {:?} contains {} genomes, represented by {}",
    ///         species.id(),
    ///         population.genomes_of(species).count(),
    ///         species.representative(population.agents()).unwrap(),
    ///     );
    /// }
    /// ```
    pub fn genomes_of<'a>(&'a self, species: &'a Species) -> impl Iterator<Item = &'a Genome> {
        species.members().iter().filter_map(move |&i| self.agents.get(i))
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation registry.
    pub fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns the genetic configuration shared by all genomes.
    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }
}

/// Rounds all values to whole numbers summing to `total`,
/// while preserving their order. The values are expected
/// to be non-negative and to sum to `total`, up to rounding.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values.
fn round_retain_sum(values: &[f32], total: usize) -> Vec<usize> {
    let mut truncated: Vec<(usize, usize, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.max(0.0).floor();
            (i, u as usize, f - u)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total.saturating_sub(truncated_sum);
    if !truncated.is_empty() {
        // Sort in decreasing order of error
        truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
        let len = truncated.len();
        for k in 0..remainder {
            truncated[k % len].1 += 1;
        }
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::RegistryError;

    fn genetic_config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            ..GeneticConfig::default()
        }
    }

    fn population_config(size: usize) -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            ..PopulationConfig::default()
        }
    }

    fn species_of(population: &Population) -> Vec<Vec<usize>> {
        population
            .species()
            .iter()
            .map(|s| s.members().to_vec())
            .collect()
    }

    #[test]
    fn round_retain_sum() {
        let v = [5.2, 9.5, 2.8, 1.3, 2.2, 2.7, 6.3, 1.0000001, 0.9999999];
        let w = super::round_retain_sum(&v, 32);
        assert_eq!(w.iter().sum::<usize>(), 32);
        assert_eq!(w, [5, 10, 3, 1, 2, 3, 6, 1, 1]);

        assert_eq!(super::round_retain_sum(&[0.5, 0.5], 1).iter().sum::<usize>(), 1);
        assert_eq!(super::round_retain_sum(&[0.0, 0.0], 3).iter().sum::<usize>(), 3);
        assert!(super::round_retain_sum(&[], 3).is_empty());
    }

    #[test]
    fn create_agents_applies_one_mutation() {
        let population = Population::new(population_config(50), genetic_config(4, 2)).unwrap();
        assert_eq!(population.agents().len(), 50);
        for genome in population.agents() {
            let connections = genome.connections().count();
            let hidden = genome.nodes().count() - 6;
            assert!(
                (connections == 1 && hidden == 0) || (connections == 2 && hidden == 1),
                "{}",
                genome
            );
        }
    }

    #[test]
    fn speciation_scenario() {
        let genetic_config = GeneticConfig {
            excess_gene_factor: 2.5,
            disjoint_gene_factor: 2.5,
            common_weight_factor: 1.0,
            ..genetic_config(1, 2)
        };
        let mut registry = InnovationRegistry::new();
        let mut a = Genome::new(&genetic_config);
        let mut b = Genome::new(&genetic_config);
        let mut c = Genome::new(&genetic_config);
        a.connect(1, 2, 0.5, &mut registry).unwrap();
        b.connect(1, 2, 0.6, &mut registry).unwrap();
        c.connect(1, 3, 0.5, &mut registry).unwrap();

        assert!((a.speciation_difference(&b, &genetic_config) - 0.1).abs() < 1e-6);
        assert_eq!(a.speciation_difference(&c, &genetic_config), 5.0);

        let population = Population::new_seeded(
            vec![a, b, c],
            PopulationConfig {
                distance_threshold: 1.35,
                ..population_config(3)
            },
            genetic_config,
        )
        .unwrap();

        assert_eq!(species_of(&population), vec![vec![0, 1], vec![2]]);
        assert_eq!(population.species()[0].id(), SpeciesID(0, 0));
        assert_eq!(population.species()[1].id(), SpeciesID(0, 1));
    }

    #[test]
    fn speciation_covers_every_agent_once() {
        let population = Population::new(population_config(80), genetic_config(5, 3)).unwrap();
        let mut members: Vec<usize> = population
            .species()
            .iter()
            .flat_map(|s| s.members().iter().copied())
            .collect();
        members.sort_unstable();
        assert_eq!(members, (0..80).collect::<Vec<_>>());

        // Representatives are the first agent of their species.
        for species in population.species() {
            assert!(species.members().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn select_fit_agents_keeps_top_half() {
        let genetic_config = genetic_config(1, 2);
        let mut registry = InnovationRegistry::new();
        let mut seeds = vec![];
        for fitness in [1.0, 7.0, 3.0, 5.0, 2.0] {
            let mut genome = Genome::new(&genetic_config);
            genome.connect(1, 2, 0.5, &mut registry).unwrap();
            genome.fitness = fitness;
            seeds.push(genome);
        }
        let mut lonely = Genome::new(&genetic_config);
        lonely.connect(1, 3, 0.5, &mut registry).unwrap();
        lonely.fitness = 100.0;
        seeds.push(lonely);

        let mut population =
            Population::new_seeded(seeds, population_config(6), genetic_config).unwrap();
        assert_eq!(species_of(&population), vec![vec![0, 1, 2, 3, 4], vec![5]]);

        population.select_fit_agents();

        // floor(5 / 2) survivors, fittest first; the single-member
        // species is reduced to nothing.
        let fitnesses: Vec<f32> = population.agents().iter().map(|g| g.fitness).collect();
        assert_eq!(fitnesses, vec![7.0, 5.0]);
        assert_eq!(species_of(&population), vec![vec![0, 1]]);
    }

    #[test]
    fn select_fit_agents_stable_on_ties() {
        let mut population = Population::new(
            PopulationConfig {
                survival_fraction: 1.0,
                ..population_config(30)
            },
            genetic_config(2, 2),
        )
        .unwrap();
        let before: Vec<Vec<usize>> = species_of(&population);
        let agents = population.agents().to_vec();

        population.select_fit_agents();

        assert_eq!(population.agents().len(), 30);
        let mut position = 0;
        for (species, members) in population.species().iter().zip(&before) {
            assert_eq!(species.len(), members.len());
            for (&now, &was) in species.members().iter().zip(members) {
                assert_eq!(now, position);
                assert_eq!(population.agents()[now], agents[was]);
                position += 1;
            }
        }
    }

    #[test]
    fn next_generation_refills() {
        let mut population = Population::new(
            PopulationConfig {
                distance_threshold: 10.0,
                node_mutation_rate: 0.3,
                connection_mutation_rate: 0.3,
                weight_mutation_rate: 0.3,
                crossover_chance: 0.5,
                ..population_config(40)
            },
            genetic_config(3, 2),
        )
        .unwrap();

        for generation in 1..=10 {
            for (i, genome) in population.agents_mut().iter_mut().enumerate() {
                genome.fitness = (i % 7) as f32;
            }
            population.next_generation().unwrap();

            assert_eq!(population.generation(), generation);
            assert_eq!(population.agents().len(), 40);
            assert!(population.agents().iter().all(|g| g.fitness == 0.0));
            assert_eq!(
                population.species().iter().map(Species::len).sum::<usize>(),
                40
            );
            assert!(population
                .species()
                .iter()
                .all(|s| s.id().0 == generation));
        }
        assert!(population.registry().max_innovation() > 0);
    }

    #[test]
    fn degenerate_population() {
        let mut population = Population::new(population_config(10), genetic_config(8, 4)).unwrap();
        // Every species is a singleton at a tiny threshold.
        population.population_config.distance_threshold = 0.0;

        assert_eq!(
            population.next_generation(),
            Err(EvolutionError::DegeneratePopulation)
        );
        assert!(population.agents().is_empty());
        assert!(population.champion().is_none());

        population.reset().unwrap();
        assert_eq!(population.agents().len(), 10);
    }

    #[test]
    fn exhausted_registry_ends_the_run() {
        let exhausted = || -> InnovationRegistry {
            serde_json::from_str(&format!(
                r#"{{"counter":{},"innovations":{{}}}}"#,
                usize::MAX
            ))
            .unwrap()
        };
        let mut population = Population::new(
            PopulationConfig {
                survival_fraction: 1.0,
                node_mutation_rate: 1.0,
                distance_threshold: 10.0,
                ..population_config(10)
            },
            genetic_config(4, 2),
        )
        .unwrap();
        population.registry = exhausted();
        assert_eq!(
            population.next_generation(),
            Err(EvolutionError::Registry(RegistryError::Exhausted))
        );

        // Half the initial mutations add a connection, which
        // needs a fresh innovation.
        population.registry = exhausted();
        let inputs = population.genetic_config.input_count;
        let outputs = population.genetic_config.output_count;
        assert_eq!(
            population.create_agents(NonZeroUsize::new(20).unwrap(), inputs, outputs),
            Err(EvolutionError::Registry(RegistryError::Exhausted))
        );
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let run = || {
            let mut population = Population::new(
                PopulationConfig {
                    seed: 1234,
                    node_mutation_rate: 0.2,
                    connection_mutation_rate: 0.4,
                    crossover_chance: 0.5,
                    distance_threshold: 3.0,
                    ..population_config(25)
                },
                genetic_config(3, 3),
            )
            .unwrap();
            for _ in 0..5 {
                for genome in population.agents_mut() {
                    let action = genome.evaluate(&[0.5, -0.5, 1.0]).unwrap();
                    genome.fitness = action as f32 + genome.connections().count() as f32;
                }
                if population.next_generation().is_err() {
                    population.reset().unwrap();
                }
            }
            population
        };

        let (first, second) = (run(), run());
        assert_eq!(first.agents(), second.agents());
        assert_eq!(
            first.registry().innovation_history(),
            second.registry().innovation_history()
        );
    }

    #[test]
    fn new_seeded_rejects_incompatible() {
        let genetic_config = genetic_config(2, 1);
        let wrong_shape = Genome::with_io(NonZeroUsize::MIN, NonZeroUsize::MIN);
        assert_eq!(
            Population::new_seeded(vec![wrong_shape], population_config(5), genetic_config.clone())
                .err(),
            Some(EvolutionError::IncompatibleSeed)
        );

        let too_many = vec![Genome::new(&genetic_config); 6];
        assert_eq!(
            Population::new_seeded(too_many, population_config(5), genetic_config.clone()).err(),
            Some(EvolutionError::IncompatibleSeed)
        );

        let mut first = Genome::new(&genetic_config);
        first.connect(1, 3, 1.0, &mut InnovationRegistry::new()).unwrap();
        let mut second = Genome::new(&genetic_config);
        second.connect(2, 3, 1.0, &mut InnovationRegistry::new()).unwrap();
        assert!(matches!(
            Population::new_seeded(vec![first, second], population_config(5), genetic_config),
            Err(EvolutionError::Registry(_))
        ));
    }

    #[test]
    fn checkpoint_resumes_identically() {
        let config = PopulationConfig {
            node_mutation_rate: 0.5,
            connection_mutation_rate: 0.5,
            distance_threshold: 3.0,
            ..population_config(20)
        };
        let mut population = Population::new(config, genetic_config(2, 2)).unwrap();
        population.next_generation().unwrap();

        let json = serde_json::to_string(&population).unwrap();
        let mut restored: Population = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.agents(), population.agents());

        population.next_generation().unwrap();
        restored.next_generation().unwrap();
        assert_eq!(restored.agents(), population.agents());
        assert_eq!(restored.species(), population.species());
    }
}
