use crate::genomics::ParameterError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

const DEFAULT_SIZE: NonZeroUsize = match NonZeroUsize::new(150) {
    Some(size) => size,
    None => unreachable!(),
};

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities or fractions
/// should be in the range [0.0, 1.0]. Rates are rolled
/// once per genome per generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of genomes in every generation.
    pub size: NonZeroUsize,
    /// Speciation distance below which a genome joins
    /// an existing species.
    pub distance_threshold: f32,
    /// Top fraction of each species kept by selection.
    pub survival_fraction: f32,
    /// Chance that a genome receives a node mutation.
    pub node_mutation_rate: f32,
    /// Chance that a genome receives a connection mutation.
    pub connection_mutation_rate: f32,
    /// Chance that a genome has its weights perturbed.
    pub weight_mutation_rate: f32,
    /// Chance that a child is produced by crossover of two
    /// survivors of its species, instead of being a copy of one.
    pub crossover_chance: f32,
    /// Seed of the population's random number generator.
    pub seed: u64,
}

impl PopulationConfig {
    /// Returns a "zero-valued" configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::PopulationConfig;
    ///
    /// let config = PopulationConfig {
    ///     survival_fraction: 0.5,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert_eq!(config.size.get(), 1);
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            distance_threshold: 0.0,
            survival_fraction: 0.0,
            node_mutation_rate: 0.0,
            connection_mutation_rate: 0.0,
            weight_mutation_rate: 0.0,
            crossover_chance: 0.0,
            seed: 0,
        }
    }

    /// Checks that the distance threshold is a finite,
    /// non-negative number, and that every rate and
    /// fraction lies in [0.0, 1.0].
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::ParameterError;
    /// use snakeneat::PopulationConfig;
    ///
    /// let config = PopulationConfig {
    ///     survival_fraction: 1.5,
    ///     ..PopulationConfig::default()
    /// };
    /// assert_eq!(
    ///     config.validate(),
    ///     Err(ParameterError::NotAProbability("survival_fraction"))
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ParameterError> {
        ParameterError::non_negative("distance_threshold", self.distance_threshold)?;
        ParameterError::probability("survival_fraction", self.survival_fraction)?;
        ParameterError::probability("node_mutation_rate", self.node_mutation_rate)?;
        ParameterError::probability("connection_mutation_rate", self.connection_mutation_rate)?;
        ParameterError::probability("weight_mutation_rate", self.weight_mutation_rate)?;
        ParameterError::probability("crossover_chance", self.crossover_chance)
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            size: DEFAULT_SIZE,
            distance_threshold: 1.35,
            survival_fraction: 0.5,
            node_mutation_rate: 0.01,
            connection_mutation_rate: 0.01,
            weight_mutation_rate: 0.0,
            crossover_chance: 0.0,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rates() {
        assert_eq!(PopulationConfig::default().validate(), Ok(()));
        assert_eq!(PopulationConfig::zero().validate(), Ok(()));

        let nan_rate = PopulationConfig {
            node_mutation_rate: f32::NAN,
            ..PopulationConfig::default()
        };
        assert_eq!(
            nan_rate.validate(),
            Err(ParameterError::NotAProbability("node_mutation_rate"))
        );

        let negative_chance = PopulationConfig {
            crossover_chance: -0.1,
            ..PopulationConfig::default()
        };
        assert_eq!(
            negative_chance.validate(),
            Err(ParameterError::NotAProbability("crossover_chance"))
        );

        let negative_threshold = PopulationConfig {
            distance_threshold: -1.0,
            ..PopulationConfig::default()
        };
        assert_eq!(
            negative_threshold.validate(),
            Err(ParameterError::NotNonNegative("distance_threshold"))
        );
    }
}
