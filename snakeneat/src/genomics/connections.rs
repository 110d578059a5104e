use crate::genomics::GeneticConfig;
use crate::{Innovation, NodeId};

use rand::Rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Connections are the genes of a genome.
/// They join two nodes, carry a weight, and are
/// identified across genomes by their innovation number.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Connection {
    innovation: Innovation,
    source: NodeId,
    target: NodeId,
    weight: f32,
    enabled: bool,
}

impl Connection {
    /// Returns a new _enabled_ connection with the specified parameters.
    pub fn new(innovation: Innovation, source: NodeId, target: NodeId, weight: f32) -> Connection {
        Connection {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight. Uses a uniform distribution
    /// over the range ±config.weight_bound.
    pub(super) fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f32 {
        rng.gen_range(-config.weight_bound..=config.weight_bound)
    }

    /// Nudges the connection's weight by a random amount. Uses
    /// a uniform distribution over the range ±[`weight_mutation_power`].
    /// If the weight's magnitude would exceed the [`weight_bound`],
    /// the weight is set to the maximum magnitude with the same
    /// sign.
    ///
    /// [`weight_mutation_power`]: crate::genomics::GeneticConfig::weight_mutation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub fn nudge_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight +=
            rng.gen_range(-config.weight_mutation_power..=config.weight_mutation_power);
        self.weight = self.weight.clamp(-config.weight_bound, config.weight_bound);
    }

    /// Returns the connection's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the node the connection starts at.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Returns the id of the node the connection ends at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Returns the connection's endpoints as `(source, target)`.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the connection's weight.
    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Returns whether the connection takes part in evaluation.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Only the owning genome may toggle this, as it
    /// mirrors the flag in its nodes' adjacency.
    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
