use crate::genomics::{MutationError, ParameterError, RegistryError};

use std::error::Error;
use std::fmt;

/// An error type indicating a population
/// could not be created or advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolutionError {
    /// Selection left no genome to reproduce from.
    DegeneratePopulation,
    /// Seed genomes do not fit the population's
    /// configuration, or outnumber its size.
    IncompatibleSeed,
    /// The innovation registry failed.
    Registry(RegistryError),
    /// A configuration parameter is unusable.
    InvalidConfig(ParameterError),
    /// A checkpoint's species, genomes and configuration
    /// do not agree with each other.
    InconsistentCheckpoint,
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegeneratePopulation => {
                write!(f, "attempted evolution on degenerate population")
            }
            Self::IncompatibleSeed => write!(f, "seed genomes incompatible with population"),
            Self::Registry(e) => write!(f, "{}", e),
            Self::InvalidConfig(e) => write!(f, "invalid configuration: {}", e),
            Self::InconsistentCheckpoint => write!(f, "inconsistent population checkpoint"),
        }
    }
}

impl From<RegistryError> for EvolutionError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<ParameterError> for EvolutionError {
    fn from(e: ParameterError) -> Self {
        Self::InvalidConfig(e)
    }
}

impl Error for EvolutionError {}

/// Mutations with nothing to act on are no-ops; only
/// registry failures abort the generation.
pub(super) fn fatal(e: MutationError) -> Option<EvolutionError> {
    match e {
        MutationError::Registry(e) => Some(e.into()),
        _ => None,
    }
}
