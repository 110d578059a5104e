use crate::game::{GameConfig, ACTION_COUNT};

use snakeneat::genomics::{GeneticConfig, ParameterError};
use snakeneat::PopulationConfig;

use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const DEFAULT_INPUTS: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(inputs) => inputs,
    None => unreachable!(),
};
const DEFAULT_OUTPUTS: NonZeroUsize = match NonZeroUsize::new(ACTION_COUNT) {
    Some(outputs) => outputs,
    None => unreachable!(),
};

/// Everything a training run needs, readable from a RON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub genetic: GeneticConfig,
    pub population: PopulationConfig,
    pub game: GameConfig,
    /// Number of generations to evolve.
    pub generations: usize,
    /// Where the best genome of the run is written.
    pub champion_path: PathBuf,
}

/// Unusable values in a [`RunConfig`], or inconsistencies
/// between its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An evolution parameter is out of range.
    Parameter(ParameterError),
    /// Genome inputs do not match the board size.
    InputMismatch { board_cells: usize, inputs: usize },
    /// Genome outputs do not match the snake's actions.
    OutputMismatch { outputs: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConfigError::*;
        match self {
            Parameter(e) => write!(f, "{}", e),
            InputMismatch {
                board_cells,
                inputs,
            } => write!(
                f,
                "genomes take {} inputs but the board has {} cells",
                inputs, board_cells
            ),
            OutputMismatch { outputs } => write!(
                f,
                "genomes have {} outputs but the snake has {} actions",
                outputs, ACTION_COUNT
            ),
        }
    }
}

impl From<ParameterError> for ConfigError {
    fn from(e: ParameterError) -> Self {
        ConfigError::Parameter(e)
    }
}

impl Error for ConfigError {}

impl RunConfig {
    /// Reads a configuration from a RON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<RunConfig, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Ok(ron::from_str(&text)?)
    }

    /// Checks that the evolution parameters are usable
    /// and that genomes fit the game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.genetic.validate()?;
        self.population.validate()?;
        let board_cells = self.game.cell_count();
        if self.genetic.input_count.get() != board_cells {
            return Err(ConfigError::InputMismatch {
                board_cells,
                inputs: self.genetic.input_count.get(),
            });
        }
        if self.genetic.output_count.get() != ACTION_COUNT {
            return Err(ConfigError::OutputMismatch {
                outputs: self.genetic.output_count.get(),
            });
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            genetic: GeneticConfig {
                input_count: DEFAULT_INPUTS,
                output_count: DEFAULT_OUTPUTS,
                ..GeneticConfig::default()
            },
            population: PopulationConfig {
                distance_threshold: 3.0,
                ..PopulationConfig::default()
            },
            game: GameConfig::default(),
            generations: 100,
            champion_path: PathBuf::from("champion.ron"),
        }
    }
}
