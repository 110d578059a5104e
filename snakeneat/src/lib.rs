//! A topology-and-weight-evolving neuroevolution engine, in the spirit of
//! NeuroEvolution of Augmenting Topologies
//! (<http://nn.cs.utexas.edu/keyword?stanley:ec02>), built to drive agents
//! that pick one of a fixed set of discrete actions every step.
//!
//! Genomes are graphs of [`Node`]s joined by [`Connection`]s. Structural
//! mutations are tagged with innovation numbers handed out by an
//! [`InnovationRegistry`], which makes genes of independently evolved genomes
//! comparable. A [`Population`] clusters its genomes into species, keeps the
//! fittest part of each species, refills itself from the survivors and mutates
//! the result, one generation at a time.
//!
//! Running episodes and scoring genomes is left to the caller: evaluate a
//! genome once per environment step with [`Genome::evaluate`], and write the
//! episode's score into [`Genome::fitness`] before advancing the population.
//!
//! [`Node`]: crate::genomics::Node
//! [`Connection`]: crate::genomics::Connection
//! [`InnovationRegistry`]: crate::genomics::InnovationRegistry
//! [`Genome::evaluate`]: crate::genomics::Genome::evaluate
//! [`Genome::fitness`]: crate::genomics::Genome::fitness
//!
//! # Example usage: a toy two-action task
//! ```
//! use snakeneat::genomics::GeneticConfig;
//! use snakeneat::{Population, PopulationConfig};
//! use std::num::NonZeroUsize;
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(2).unwrap(),
//!     ..GeneticConfig::default()
//! };
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(30).unwrap(),
//!     seed: 7,
//!     ..PopulationConfig::default()
//! };
//!
//! let mut population = Population::new(population_config, genetic_config).unwrap();
//! for _ in 0..5 {
//!     for genome in population.agents_mut() {
//!         // Reward genomes that pick the action matching the hot input.
//!         let mut score = 0.0;
//!         for (inputs, wanted) in [([1.0, 0.0], 0), ([0.0, 1.0], 1)] {
//!             if genome.evaluate(&inputs).unwrap() == wanted {
//!                 score += 1.0;
//!             }
//!         }
//!         genome.fitness = score;
//!     }
//!     if let Err(e) = population.next_generation() {
//!         eprintln!("{}, starting over", e);
//!         population.reset().unwrap();
//!     }
//! }
//! assert_eq!(population.agents().len(), 30);
//! ```

pub mod genomics;
mod populations;

pub use populations::*;

/// Identifier type used to designate historically
/// identical structural mutations, for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

/// Identifier of a node within a single genome.
/// Ids start at 1 and are handed out in creation order.
pub type NodeId = usize;
