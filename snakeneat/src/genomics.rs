//! Genomes are the focus of evolution.
//! They are a graph of nodes joined by connections (genes), and are
//! evaluated directly as a neural network that scores a fixed set of
//! discrete actions. Genomes grow through structural mutations whose
//! innovation numbers are handed out by a shared [`InnovationRegistry`].

mod config;
mod connections;
mod errors;
mod evaluation;
mod nodes;
mod record;
mod registry;

pub use config::GeneticConfig;
pub use connections::Connection;
pub use errors::*;
pub use nodes::{Node, NodeKind};
pub use record::{ConnectionRecord, GenomeRecord, NodeRecord};
pub use registry::InnovationRegistry;

use crate::{Innovation, NodeId};

use ahash::RandomState;
use log::trace;
use rand::prelude::{IteratorRandom, Rng};
use serde::{Deserialize, Serialize};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::NonZeroUsize;

/// A mutable collection of nodes and connections.
///
/// Node ids are sequential starting at 1: inputs first,
/// then outputs, then hidden nodes in creation order.
/// At most one connection joins any ordered pair of nodes,
/// disabled connections included.
///
/// Serializes as a [`GenomeRecord`], and is validated
/// when deserialized.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(into = "GenomeRecord", try_from = "GenomeRecord")]
pub struct Genome {
    input_count: NonZeroUsize,
    output_count: NonZeroUsize,
    nodes: BTreeMap<NodeId, Node>,
    connections: BTreeMap<Innovation, Connection>,
    pairings: HashMap<(NodeId, NodeId), Innovation, RandomState>,
    /// Score of the genome's latest episode, set by the
    /// environment driver. Higher is better.
    pub fitness: f32,
}

impl Genome {
    /// Create a new, unconnected genome with the
    /// input and output counts of the configuration.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, Genome, NodeKind};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// let genome = Genome::new(&config);
    ///
    /// // As configured, the genome should have 3 inputs + 2 outputs.
    /// assert_eq!(genome.nodes().count(), 3 + 2);
    /// assert_eq!(genome.nodes().filter(|n| n.kind() == NodeKind::Input).count(), 3);
    /// assert_eq!(genome.nodes().filter(|n| n.kind() == NodeKind::Output).count(), 2);
    ///
    /// // Ids are handed out inputs first.
    /// assert_eq!(genome.node(4).map(|n| n.kind()), Some(NodeKind::Output));
    /// assert_eq!(genome.connections().count(), 0);
    /// ```
    pub fn new(config: &GeneticConfig) -> Genome {
        Self::with_io(config.input_count, config.output_count)
    }

    /// Create a new, unconnected genome with
    /// the specified input and output counts.
    pub fn with_io(input_count: NonZeroUsize, output_count: NonZeroUsize) -> Genome {
        let inputs = (1..=input_count.get()).map(|id| (id, NodeKind::Input));
        let outputs = (1..=output_count.get()).map(|o| (input_count.get() + o, NodeKind::Output));
        Genome {
            input_count,
            output_count,
            nodes: inputs
                .chain(outputs)
                .map(|(id, kind)| (id, Node::new(id, kind)))
                .collect(),
            connections: BTreeMap::new(),
            pairings: HashMap::default(),
            fitness: 0.0,
        }
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.input_count.get()
    }

    /// Returns the number of output nodes, which is
    /// also the number of actions the genome picks from.
    pub fn output_count(&self) -> usize {
        self.output_count.get()
    }

    /// Returns an iterator over the genome's nodes, sorted by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns an iterator over the genome's connections,
    /// sorted by innovation number.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns the node with the specified id, if any.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the connection with the specified innovation number, if any.
    pub fn connection(&self, innovation: Innovation) -> Option<&Connection> {
        self.connections.get(&innovation)
    }

    /// Returns the connection from `source` to `target`, if any,
    /// whether enabled or not.
    pub fn connection_between(&self, source: NodeId, target: NodeId) -> Option<&Connection> {
        self.pairings
            .get(&(source, target))
            .and_then(|innovation| self.connections.get(innovation))
    }

    /// Returns the highest innovation number among the
    /// genome's connections, or `None` if it has none.
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.connections.keys().next_back().copied()
    }

    /// Returns the id the next hidden node will receive.
    pub fn next_node_id(&self) -> NodeId {
        self.nodes.keys().next_back().map_or(1, |id| id + 1)
    }

    fn output_ids(&self) -> std::ops::RangeInclusive<NodeId> {
        self.input_count() + 1..=self.input_count() + self.output_count()
    }

    /// Adds an enabled connection from `source` to `target`,
    /// obtaining its innovation number from the registry.
    /// Returns the innovation number used.
    ///
    /// # Errors
    /// Returns an error if the connection would be invalid for
    /// the genome (see [`ConnectionError`]), or if the registry
    /// is exhausted.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{
    ///     ConnectionError, GeneticConfig, Genome, InnovationRegistry, MutationError,
    /// };
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let mut genome = Genome::new(&config);
    ///
    /// assert_eq!(genome.connect(1, 3, 0.5, &mut registry), Ok(1));
    /// assert_eq!(genome.connect(2, 3, -1.5, &mut registry), Ok(2));
    ///
    /// // Inputs cannot be targeted.
    /// assert_eq!(
    ///     genome.connect(3, 1, 1.0, &mut registry),
    ///     Err(MutationError::InvalidConnection(ConnectionError::InputEndpoint(1)))
    /// );
    /// ```
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        weight: f32,
        registry: &mut InnovationRegistry,
    ) -> Result<Innovation, MutationError> {
        self.check_connection_validity(source, target)?;
        let innovation = registry.innovation_for(source, target)?;
        if self.connections.contains_key(&innovation) {
            return Err(ConnectionError::DuplicateInnovation(innovation).into());
        }
        self.insert_connection_unchecked(Connection::new(innovation, source, target, weight));
        Ok(innovation)
    }

    /// Checks whether a connection between the specified
    /// endpoints would be invalid for the genome.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first broken rule.
    fn check_connection_validity(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> Result<(), ConnectionError> {
        use ConnectionError::*;
        match (self.nodes.get(&source), self.nodes.get(&target)) {
            (Some(_), Some(target_node)) => {
                if source == target {
                    Err(SelfLoop(source))
                } else if target_node.kind() == NodeKind::Input {
                    Err(InputEndpoint(target))
                } else if self.pairings.contains_key(&(source, target)) {
                    Err(DuplicatePair(source, target))
                } else {
                    Ok(())
                }
            }
            _ => Err(NonexistentEndpoint(source, target)),
        }
    }

    /// Adds a connection to the genome, recording its adjacency
    /// if it is enabled. Assumes the connection is valid and
    /// its innovation number is unused.
    fn insert_connection_unchecked(&mut self, connection: Connection) {
        let (source, target) = connection.endpoints();
        if connection.enabled() {
            self.link(source, target);
        }
        self.pairings.insert((source, target), connection.innovation());
        self.connections.insert(connection.innovation(), connection);
    }

    fn link(&mut self, source: NodeId, target: NodeId) {
        if let Some(node) = self.nodes.get_mut(&source) {
            node.add_output(target);
        }
        if let Some(node) = self.nodes.get_mut(&target) {
            node.add_input(source);
        }
    }

    fn unlink(&mut self, source: NodeId, target: NodeId) {
        if let Some(node) = self.nodes.get_mut(&source) {
            node.remove_output(target);
        }
        if let Some(node) = self.nodes.get_mut(&target) {
            node.remove_input(source);
        }
    }

    /// Enables or disables a connection, keeping the
    /// endpoints' adjacency in sync.
    fn set_connection_enabled(&mut self, innovation: Innovation, enabled: bool) {
        let (source, target) = match self.connections.get_mut(&innovation) {
            Some(connection) if connection.enabled() != enabled => {
                connection.set_enabled(enabled);
                connection.endpoints()
            }
            _ => return,
        };
        if enabled {
            self.link(source, target);
        } else {
            self.unlink(source, target);
        }
    }

    /// Induces a _connection mutation_ in the genome: a random
    /// pair of unconnected nodes is joined by a new connection with
    /// a random weight. Returns the innovation number of the
    /// new connection.
    ///
    /// Sources may be any node; targets are never inputs.
    /// Pairs are drawn at random up to
    /// [`max_mutation_attempts`] times.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NoAvailablePair`] if every possible
    /// connection already exists or no free pair was drawn within the
    /// allowed attempts, and [`MutationError::Registry`] if the
    /// registry is exhausted.
    ///
    /// [`max_mutation_attempts`]: GeneticConfig::max_mutation_attempts
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new();
    /// let mut rng = ChaCha8Rng::seed_from_u64(42);
    ///
    /// // 1 input and 1 output: the only possible connection is 1 -> 2.
    /// let mut genome = Genome::new(&config);
    /// let innovation = genome.add_connection(&mut registry, &config, &mut rng).unwrap();
    ///
    /// let connection = genome.connection(innovation).unwrap();
    /// assert_eq!(connection.endpoints(), (1, 2));
    /// assert!(connection.weight().abs() <= config.weight_bound);
    ///
    /// // The genome is now fully connected.
    /// assert!(genome.add_connection(&mut registry, &config, &mut rng).is_err());
    /// ```
    pub fn add_connection<R: Rng + ?Sized>(
        &mut self,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<Innovation, MutationError> {
        if self.open_pair_count() == 0 {
            return Err(MutationError::NoAvailablePair);
        }

        let last = self.next_node_id() - 1;
        let first_target = self.input_count() + 1;
        let pair = (0..config.max_mutation_attempts)
            .map(|_| (rng.gen_range(1..=last), rng.gen_range(first_target..=last)))
            .find(|&(source, target)| {
                source != target && !self.pairings.contains_key(&(source, target))
            });

        match pair {
            Some((source, target)) => {
                let weight = Connection::random_weight(config, rng);
                self.connect(source, target, weight, registry)
            }
            None => Err(MutationError::NoAvailablePair),
        }
    }

    /// Number of valid node pairs not yet joined by a connection.
    fn open_pair_count(&self) -> usize {
        let targets = self.nodes.len() - self.input_count();
        (self.nodes.len() * targets - targets).saturating_sub(self.pairings.len())
    }

    /// Induces a _node mutation_ in the genome: an enabled connection,
    /// chosen uniformly at random, is disabled and replaced by a new
    /// hidden node with a connection from the old source (carrying
    /// the old weight) and a connection to the old target (with
    /// weight 1).
    ///
    /// A genome without any connection instead gets a hidden node
    /// placed between a random pair of nodes, with random weights.
    ///
    /// Returns the innovation numbers of the two new connections,
    /// as `(into new node, out of new node)`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NoEnabledConnection`] if the genome has
    /// connections but none is enabled, and [`MutationError::Registry`]
    /// if the registry is exhausted. The genome and the registry are
    /// unchanged on error.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, Genome, InnovationRegistry, NodeKind};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = InnovationRegistry::new();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// let mut genome = Genome::new(&config);
    /// let split = genome.connect(1, 2, 0.75, &mut registry).unwrap();
    ///
    /// let (into, out_of) = genome.add_node(&mut registry, &config, &mut rng).unwrap();
    ///
    /// assert_eq!(genome.nodes().count(), 1 + 1 + 1);
    /// assert_eq!(genome.node(3).map(|n| n.kind()), Some(NodeKind::Hidden));
    ///
    /// // Old connection is disabled, and the new ones keep its signal.
    /// assert!(!genome.connection(split).unwrap().enabled());
    /// assert_eq!(genome.connection(into).unwrap().endpoints(), (1, 3));
    /// assert_eq!(genome.connection(into).unwrap().weight(), 0.75);
    /// assert_eq!(genome.connection(out_of).unwrap().endpoints(), (3, 2));
    /// assert_eq!(genome.connection(out_of).unwrap().weight(), 1.0);
    /// ```
    pub fn add_node<R: Rng + ?Sized>(
        &mut self,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
        rng: &mut R,
    ) -> Result<(Innovation, Innovation), MutationError> {
        let new_node = self.next_node_id();

        let (source, target, split, into_weight, out_of_weight) = if self.connections.is_empty() {
            let target = rng.gen_range(self.input_count() + 1..new_node);
            let source = (1..new_node)
                .filter(|&id| id != target)
                .choose(rng)
                .ok_or(MutationError::NoAvailablePair)?;
            (
                source,
                target,
                None,
                Connection::random_weight(config, rng),
                Connection::random_weight(config, rng),
            )
        } else {
            let connection = self
                .connections
                .values()
                .filter(|c| c.enabled())
                .choose(rng)
                .ok_or(MutationError::NoEnabledConnection)?;
            (
                connection.source(),
                connection.target(),
                Some(connection.innovation()),
                connection.weight(),
                1.0,
            )
        };

        let (into, out_of) = registry.innovations_for((source, new_node), (new_node, target))?;
        for innovation in [into, out_of] {
            if self.connections.contains_key(&innovation) {
                return Err(ConnectionError::DuplicateInnovation(innovation).into());
            }
        }

        if let Some(split) = split {
            self.set_connection_enabled(split, false);
        }
        self.nodes
            .insert(new_node, Node::new(new_node, NodeKind::Hidden));
        self.insert_connection_unchecked(Connection::new(into, source, new_node, into_weight));
        self.insert_connection_unchecked(Connection::new(
            out_of,
            new_node,
            target,
            out_of_weight,
        ));
        Ok((into, out_of))
    }

    /// Nudges the weight of every connection, enabled or not,
    /// by a random amount. Weights stay within the
    /// configuration's [`weight_bound`].
    ///
    /// [`weight_bound`]: GeneticConfig::weight_bound
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        for connection in self.connections.values_mut() {
            connection.nudge_weight(config, rng);
        }
    }

    /// Returns the speciation distance between two genomes:
    ///
    /// `(c1 * excess + c2 * disjoint) / N + c3 * W`
    ///
    /// where `N` is the connection count of the larger genome (at
    /// least 1), and `W` the average weight difference of matching
    /// connections (0 if there are none). A connection is _excess_
    /// if its innovation number is greater than every innovation
    /// number of the other genome, and _disjoint_ if it is
    /// unmatched otherwise. The factors are taken from the
    /// configuration.
    ///
    /// The distance is symmetric, and 0 between equal genomes.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(1).unwrap(),
    ///     excess_gene_factor: 1.0,
    ///     disjoint_gene_factor: 2.0,
    ///     common_weight_factor: 0.5,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    ///
    /// let mut first = Genome::new(&config);
    /// let mut second = Genome::new(&config);
    ///
    /// // Matching connection, weight difference of 2.0.
    /// first.connect(1, 4, 1.0, &mut registry).unwrap();
    /// second.connect(1, 4, -1.0, &mut registry).unwrap();
    ///
    /// // Disjoint connection.
    /// second.connect(2, 4, 1.0, &mut registry).unwrap();
    ///
    /// // Excess connection.
    /// first.connect(3, 4, 1.0, &mut registry).unwrap();
    ///
    /// assert_eq!(
    ///     first.speciation_difference(&second, &config),
    ///     (1.0 * 1.0 + 2.0 * 1.0) / 2.0 + 0.5 * 2.0
    /// );
    /// ```
    pub fn speciation_difference(&self, other: &Genome, config: &GeneticConfig) -> f32 {
        let (own_excess, own_disjoint) = self.count_unmatched(other);
        let (other_excess, other_disjoint) = other.count_unmatched(self);
        let excess = (own_excess + other_excess) as f32;
        let disjoint = (own_disjoint + other_disjoint) as f32;

        let normalizer = self.connections.len().max(other.connections.len()).max(1) as f32;

        (config.excess_gene_factor * excess + config.disjoint_gene_factor * disjoint) / normalizer
            + config.common_weight_factor * self.average_weight_difference(other)
    }

    /// Returns the number of `(excess, disjoint)` connections
    /// of this genome relative to `other`.
    fn count_unmatched(&self, other: &Genome) -> (usize, usize) {
        let cutoff = other.max_innovation().unwrap_or(0);
        self.connections
            .keys()
            .filter(|innovation| !other.connections.contains_key(innovation))
            .fold((0, 0), |(excess, disjoint), &innovation| {
                if innovation > cutoff {
                    (excess + 1, disjoint)
                } else {
                    (excess, disjoint + 1)
                }
            })
    }

    fn average_weight_difference(&self, other: &Genome) -> f32 {
        let (count, sum) = self
            .connections
            .iter()
            .filter_map(|(innovation, c)| {
                other
                    .connections
                    .get(innovation)
                    .map(|o| (c.weight() - o.weight()).abs())
            })
            .fold((0usize, 0.0f32), |(count, sum), diff| (count + 1, sum + diff));
        if count == 0 {
            trace!("no matching connections, ignoring weight difference");
            0.0
        } else {
            sum / count as f32
        }
    }

    /// Returns a child of two genomes. The child has the structure
    /// of the fitter parent (`self` on ties); each connection it
    /// shares with the other parent takes that parent's weight and
    /// enabled state with probability 1/2. The child's fitness is 0.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::default()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let mut rng = ChaCha8Rng::seed_from_u64(5);
    ///
    /// let mut fitter = Genome::new(&config);
    /// fitter.connect(1, 3, 0.5, &mut registry).unwrap();
    /// fitter.connect(2, 3, 0.5, &mut registry).unwrap();
    /// fitter.fitness = 10.0;
    ///
    /// let mut weaker = Genome::new(&config);
    /// weaker.connect(1, 3, -0.5, &mut registry).unwrap();
    ///
    /// let child = weaker.crossover(&fitter, &mut rng);
    /// assert_eq!(child.connections().count(), 2);
    /// assert_eq!(child.connection(2).unwrap().weight(), 0.5);
    /// assert_eq!(child.fitness, 0.0);
    /// ```
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Genome, rng: &mut R) -> Genome {
        let (fitter, weaker) = if other.fitness > self.fitness {
            (other, self)
        } else {
            (self, other)
        };

        let mut child = fitter.clone();
        child.fitness = 0.0;
        for (innovation, connection) in &fitter.connections {
            let inherited = match weaker.connections.get(innovation) {
                Some(c) if c.endpoints() == connection.endpoints() => c,
                _ => continue,
            };
            if rng.gen_bool(0.5) {
                if let Some(c) = child.connections.get_mut(innovation) {
                    c.set_weight(inherited.weight());
                }
                child.set_connection_enabled(*innovation, inherited.enabled());
            }
        }
        child
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<&Node> = self.nodes.values().collect();
        let connections: Vec<String> = self.connections.values().map(|c| c.to_string()).collect();
        f.debug_struct("Genome")
            .field("Nodes", &nodes.len())
            .field("Connections", &connections)
            .field("Fitness", &self.fitness)
            .finish()
    }
}
