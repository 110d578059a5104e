use crate::genomics::{Connection, ConnectionError, Genome, Node, NodeKind, RecordError};
use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::num::NonZeroUsize;

/// Plain, stable representation of a [`Genome`],
/// used for saving and loading genomes.
///
/// Nodes are listed by id and connections by
/// innovation number, so records of related genomes
/// can be compared line by line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    pub input_count: usize,
    pub output_count: usize,
    pub nodes: Vec<NodeRecord>,
    pub connections: Vec<ConnectionRecord>,
    pub fitness: f32,
}

/// A node entry of a [`GenomeRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
}

/// A connection entry of a [`GenomeRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub innovation: Innovation,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
    pub enabled: bool,
}

impl From<Genome> for GenomeRecord {
    fn from(genome: Genome) -> Self {
        GenomeRecord {
            input_count: genome.input_count(),
            output_count: genome.output_count(),
            nodes: genome
                .nodes()
                .map(|n| NodeRecord {
                    id: n.id(),
                    kind: n.kind(),
                })
                .collect(),
            connections: genome
                .connections()
                .map(|c| ConnectionRecord {
                    innovation: c.innovation(),
                    source: c.source(),
                    target: c.target(),
                    weight: c.weight(),
                    enabled: c.enabled(),
                })
                .collect(),
            fitness: genome.fitness,
        }
    }
}

impl TryFrom<GenomeRecord> for Genome {
    type Error = RecordError;

    /// Rebuilds a genome from a record, checking that node ids
    /// follow the inputs-outputs-hidden sequence and that every
    /// connection is valid for the genome.
    fn try_from(record: GenomeRecord) -> Result<Self, Self::Error> {
        let (input_count, output_count) = match (
            NonZeroUsize::new(record.input_count),
            NonZeroUsize::new(record.output_count),
        ) {
            (Some(i), Some(o)) => (i, o),
            _ => return Err(RecordError::MissingInterface),
        };
        let interface = input_count.get() + output_count.get();

        let mut nodes = BTreeMap::new();
        for node in &record.nodes {
            if nodes.insert(node.id, node.kind).is_some() {
                return Err(RecordError::DuplicateNode(node.id));
            }
        }
        if nodes.len() < interface {
            return Err(RecordError::MissingInterface);
        }
        for (expected, (&id, &kind)) in (1..).zip(&nodes) {
            let expected_kind = if id <= input_count.get() {
                NodeKind::Input
            } else if id <= interface {
                NodeKind::Output
            } else {
                NodeKind::Hidden
            };
            if id != expected || kind != expected_kind {
                return Err(RecordError::NodeSequence(id));
            }
        }

        let mut genome = Genome::with_io(input_count, output_count);
        for id in interface + 1..=nodes.len() {
            genome.nodes.insert(id, Node::new(id, NodeKind::Hidden));
        }

        for c in record.connections {
            genome.check_connection_validity(c.source, c.target)?;
            if genome.connections.contains_key(&c.innovation) {
                return Err(ConnectionError::DuplicateInnovation(c.innovation).into());
            }
            let mut connection = Connection::new(c.innovation, c.source, c.target, c.weight);
            connection.set_enabled(c.enabled);
            genome.insert_connection_unchecked(connection);
        }
        genome.fitness = record.fitness;
        Ok(genome)
    }
}
