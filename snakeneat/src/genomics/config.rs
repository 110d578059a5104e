use crate::genomics::ParameterError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation,
/// mutation and inter-genome comparison.
///
/// # Note
/// Using [`zero`] as a base leaves every factor at 0 and
/// disables connection mutations entirely; the [`Default`]
/// value carries the tuned values the engine was built around.
///
/// [`zero`]: GeneticConfig::zero
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs (discrete actions) in a genome.
    pub output_count: NonZeroUsize,
    /// Maximum magnitude of a connection's weight.
    /// New weights are drawn uniformly from `[-weight_bound, weight_bound]`.
    pub weight_bound: f32,
    /// Magnitude of the uniform nudge applied during weight mutation.
    pub weight_mutation_power: f32,
    /// Maximum number of random node pairs tried during a
    /// connection mutation before it gives up.
    pub max_mutation_attempts: usize,
    /// Weight of excess genes in speciation distance (c1).
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in speciation distance (c2).
    pub disjoint_gene_factor: f32,
    /// Weight of the average matching-gene weight difference
    /// in speciation distance (c3).
    pub common_weight_factor: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 2.0,
    ///     max_mutation_attempts: 20,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert_eq!(config.excess_gene_factor, 0.0);
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            weight_bound: 0.0,
            weight_mutation_power: 0.0,
            max_mutation_attempts: 0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
        }
    }

    /// Checks that every weight and distance parameter is a
    /// finite, non-negative number. Mutation operators draw
    /// from ranges built on these values, and expect a
    /// configuration that passes this check.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, ParameterError};
    ///
    /// assert_eq!(GeneticConfig::default().validate(), Ok(()));
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: -1.0,
    ///     ..GeneticConfig::default()
    /// };
    /// assert_eq!(
    ///     config.validate(),
    ///     Err(ParameterError::NotNonNegative("weight_bound"))
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ParameterError> {
        ParameterError::non_negative("weight_bound", self.weight_bound)?;
        ParameterError::non_negative("weight_mutation_power", self.weight_mutation_power)?;
        ParameterError::non_negative("excess_gene_factor", self.excess_gene_factor)?;
        ParameterError::non_negative("disjoint_gene_factor", self.disjoint_gene_factor)?;
        ParameterError::non_negative("common_weight_factor", self.common_weight_factor)
    }
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            weight_bound: 2.0,
            weight_mutation_power: 0.5,
            max_mutation_attempts: 20,
            excess_gene_factor: 0.7,
            disjoint_gene_factor: 1.2,
            common_weight_factor: 0.3,
        }
    }
}
