mod config;
mod game;

use config::RunConfig;
use game::{Environment, Game};

use snakeneat::genomics::{EvaluationError, Genome};
use snakeneat::logging::{EvolutionLogger, ReportingLevel};
use snakeneat::{EvolutionError, Population};

use log::{info, warn};
use rayon::prelude::*;
use ron::ser::PrettyConfig;

use std::env;
use std::error::Error;
use std::fs;

/// Plays one episode with `genome` choosing every
/// action, and returns the episode's score.
fn play<E: Environment>(
    genome: &mut Genome,
    environment: &mut E,
) -> Result<f32, EvaluationError> {
    let mut state = environment.reset();
    while !environment.done() {
        let action = genome.evaluate(&state)?;
        state = environment.step(action);
    }
    Ok(environment.score())
}

/// Scores every agent on the same episode, in parallel.
fn evaluate_fitness(
    population: &mut Population,
    config: &RunConfig,
    seed: u64,
) -> Result<(), EvaluationError> {
    population
        .agents_mut()
        .par_iter_mut()
        .try_for_each(|genome| -> Result<(), EvaluationError> {
            let mut game = Game::new(config.game.clone(), seed);
            genome.fitness = play(genome, &mut game)?;
            Ok(())
        })
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = match env::args().nth(1) {
        Some(path) => RunConfig::from_path(path)?,
        None => RunConfig::default(),
    };
    config.validate()?;

    let mut population = Population::new(config.population.clone(), config.genetic.clone())?;
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    let mut best: Option<Genome> = None;

    for run_generation in 0..config.generations {
        let seed = config.population.seed.wrapping_add(run_generation as u64);
        evaluate_fitness(&mut population, &config, seed)?;

        logger.log(
            &population,
            &|g| [g.fitness, g.connections().count() as f32],
            ["fitness", "connections"],
        );
        if let Some(log) = logger.last() {
            let fitness = log.genome_stats.first().map(|(_, stats)| stats.to_string());
            info!(
                "generation {} ({} overall): {} species, fitness {}",
                log.generation_number,
                run_generation,
                log.species_count,
                fitness.unwrap_or_default(),
            );
        }

        if let Some(champion) = population.champion() {
            if best.as_ref().map_or(true, |b| champion.fitness > b.fitness) {
                info!("new best genome, fitness {:.3}", champion.fitness);
                best = Some(champion.clone());
            }
        }

        match population.next_generation() {
            Ok(()) => {}
            Err(EvolutionError::DegeneratePopulation) => {
                warn!("{}, starting over", EvolutionError::DegeneratePopulation);
                population.reset()?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(champion) = best {
        let text = ron::ser::to_string_pretty(&champion, PrettyConfig::new())?;
        fs::write(&config.champion_path, text)?;
        info!(
            "saved genome with fitness {:.3} to {}",
            champion.fitness,
            config.champion_path.display()
        );
    }
    Ok(())
}
