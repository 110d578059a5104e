use super::{EvolutionError, Population, PopulationConfig, Species};

use crate::genomics::{GeneticConfig, Genome, InnovationRegistry};

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use std::convert::TryFrom;

/// Plain representation of a [`Population`], used
/// for checkpointing a run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub agents: Vec<Genome>,
    pub species: Vec<Species>,
    pub registry: InnovationRegistry,
    pub rng: ChaCha8Rng,
    pub generation: usize,
    pub population_config: PopulationConfig,
    pub genetic_config: GeneticConfig,
}

impl From<Population> for PopulationRecord {
    fn from(population: Population) -> Self {
        PopulationRecord {
            agents: population.agents,
            species: population.species,
            registry: population.registry,
            rng: population.rng,
            generation: population.generation,
            population_config: population.population_config,
            genetic_config: population.genetic_config,
        }
    }
}

impl TryFrom<PopulationRecord> for Population {
    type Error = EvolutionError;

    /// Rebuilds a population from a record, checking that
    /// both configurations are valid, that every genome fits
    /// the genetic configuration, that species members refer
    /// to distinct agents, and that the genomes' genes agree
    /// with the innovation registry.
    fn try_from(record: PopulationRecord) -> Result<Self, Self::Error> {
        record.population_config.validate()?;
        record.genetic_config.validate()?;

        let (inputs, outputs) = (
            record.genetic_config.input_count.get(),
            record.genetic_config.output_count.get(),
        );
        if record.agents.len() > record.population_config.size.get()
            || record
                .agents
                .iter()
                .any(|g| g.input_count() != inputs || g.output_count() != outputs)
        {
            return Err(EvolutionError::InconsistentCheckpoint);
        }

        let mut assigned = vec![false; record.agents.len()];
        for &member in record.species.iter().flat_map(Species::members) {
            match assigned.get_mut(member) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(EvolutionError::InconsistentCheckpoint),
            }
        }

        let mut registry = record.registry;
        for genome in &record.agents {
            registry.absorb(genome)?;
        }

        Ok(Population {
            agents: record.agents,
            species: record.species,
            registry,
            rng: record.rng,
            generation: record.generation,
            population_config: record.population_config,
            genetic_config: record.genetic_config,
        })
    }
}
