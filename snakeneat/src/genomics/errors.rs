use crate::{Innovation, NodeId};

use std::error::Error;
use std::fmt;

/// An error type indicating the innovation
/// registry can no longer hand out new numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The innovation counter would overflow.
    Exhausted,
    /// An innovation number is already registered
    /// for a different pair of endpoints.
    Conflict(Innovation),
}

/// An error type indicating the connection being
/// created or restored is invalid for the genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// One or both endpoints are not nodes of the genome.
    NonexistentEndpoint(NodeId, NodeId),
    /// The target of the connection is an input node.
    InputEndpoint(NodeId),
    /// The connection starts and ends at the same node.
    SelfLoop(NodeId),
    /// A connection between the same endpoints already exists.
    DuplicatePair(NodeId, NodeId),
    /// A connection with the same innovation number already exists.
    DuplicateInnovation(Innovation),
}

/// An error type indicating a failure
/// to carry out a structural mutation.
///
/// Every variant except [`Registry`] describes a
/// mutation that had nothing to act on, and is
/// treated as a no-op by the population.
///
/// [`Registry`]: MutationError::Registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    /// Every possible connection already exists,
    /// or no free pair was found within the allowed attempts.
    NoAvailablePair,
    /// There is no enabled connection to split.
    NoEnabledConnection,
    /// An explicitly requested connection is invalid.
    InvalidConnection(ConnectionError),
    /// The innovation registry ran out of numbers.
    Registry(RegistryError),
}

/// An error type indicating a failed network evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationError {
    /// The number of inputs disagrees with the genome's input count.
    ShapeMismatch { expected: usize, found: usize },
}

/// An error type indicating a stored genome record
/// does not describe a valid genome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// The record declares no inputs or no outputs.
    MissingInterface,
    /// A node id appears more than once.
    DuplicateNode(NodeId),
    /// Node ids or kinds break the inputs-outputs-hidden sequence.
    NodeSequence(NodeId),
    /// A connection in the record is invalid.
    Connection(ConnectionError),
}

/// An error type indicating a configuration
/// parameter holds an unusable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterError {
    /// The named parameter is negative, infinite or NaN.
    NotNonNegative(&'static str),
    /// The named parameter lies outside [0.0, 1.0].
    NotAProbability(&'static str),
}

impl ParameterError {
    /// Checks that `value` is a finite, non-negative number.
    pub(crate) fn non_negative(name: &'static str, value: f32) -> Result<(), ParameterError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(Self::NotNonNegative(name))
        }
    }

    /// Checks that `value` lies in [0.0, 1.0].
    pub(crate) fn probability(name: &'static str, value: f32) -> Result<(), ParameterError> {
        if (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(Self::NotAProbability(name))
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => write!(f, "innovation registry exhausted"),
            Self::Conflict(innovation) => write!(
                f,
                "innovation {} already registered for different endpoints",
                innovation
            ),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonexistentEndpoint(source, target) => write!(
                f,
                "connection between nonexistent endpoint(s) {} -> {}",
                source, target
            ),
            Self::InputEndpoint(id) => {
                write!(f, "connection with input node {} as target", id)
            }
            Self::SelfLoop(id) => write!(f, "connection from node {} to itself", id),
            Self::DuplicatePair(source, target) => write!(
                f,
                "connection {} -> {} shadows connection with same endpoints",
                source, target
            ),
            Self::DuplicateInnovation(innovation) => write!(
                f,
                "duplicate connection insertion with innovation {}",
                innovation
            ),
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAvailablePair => {
                write!(f, "no unconnected node pair available for connection mutation")
            }
            Self::NoEnabledConnection => {
                write!(f, "node mutation on genome without enabled connections")
            }
            Self::InvalidConnection(e) => write!(f, "invalid connection: {}", e),
            Self::Registry(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch { expected, found } => write!(
                f,
                "evaluation with {} inputs on genome with {} inputs",
                found, expected
            ),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInterface => write!(f, "genome record without inputs or outputs"),
            Self::DuplicateNode(id) => write!(f, "duplicate node {} in genome record", id),
            Self::NodeSequence(id) => {
                write!(f, "node {} breaks the genome's node id sequence", id)
            }
            Self::Connection(e) => write!(f, "invalid connection in genome record: {}", e),
        }
    }
}

impl fmt::Display for ParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNonNegative(name) => {
                write!(f, "`{}` must be a finite, non-negative number", name)
            }
            Self::NotAProbability(name) => write!(f, "`{}` must lie in [0, 1]", name),
        }
    }
}

impl From<RegistryError> for MutationError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<ConnectionError> for MutationError {
    fn from(e: ConnectionError) -> Self {
        Self::InvalidConnection(e)
    }
}

impl From<ConnectionError> for RecordError {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

impl Error for RegistryError {}
impl Error for ConnectionError {}
impl Error for MutationError {}
impl Error for EvaluationError {}
impl Error for RecordError {}
impl Error for ParameterError {}
