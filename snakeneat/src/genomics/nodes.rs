use crate::NodeId;

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::fmt;

/// A NodeKind indicates the role of a node
/// in the genome's network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Receives one element of the environment state.
    Input,
    /// Scores one discrete action.
    Output,
    /// Created by node mutations.
    Hidden,
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
///
/// Besides its identity, a node carries the transient
/// state of an evaluation pass and the ids of the nodes
/// it is joined to by _enabled_ connections. Equality
/// ignores the evaluation state.
#[derive(Clone, Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    value: f32,
    evaluated: bool,
    inputs: BTreeSet<NodeId>,
    outputs: BTreeSet<NodeId>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.kind == other.kind
            && self.inputs == other.inputs
            && self.outputs == other.outputs
    }
}

impl Node {
    /// Generate a new, unconnected node.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{Node, NodeKind};
    ///
    /// let node = Node::new(5, NodeKind::Hidden);
    /// assert_eq!(node.id(), 5);
    /// assert!(!node.evaluated());
    /// ```
    pub fn new(id: NodeId, kind: NodeKind) -> Node {
        Node {
            id,
            kind,
            value: 0.0,
            evaluated: false,
            inputs: BTreeSet::new(),
            outputs: BTreeSet::new(),
        }
    }

    /// Returns the node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the value computed for the node
    /// in the latest evaluation pass that reached it.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Returns whether the node has been computed
    /// in the current evaluation pass. Outside of
    /// [`Genome::evaluate`] this is always `false`.
    ///
    /// [`Genome::evaluate`]: crate::genomics::Genome::evaluate
    pub fn evaluated(&self) -> bool {
        self.evaluated
    }

    /// Returns an iterator over the ids of the nodes
    /// feeding into this one through enabled connections.
    pub fn input_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.inputs.iter()
    }

    /// Returns an iterator over the ids of the nodes
    /// this one feeds into through enabled connections.
    pub fn output_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.outputs.iter()
    }

    pub(super) fn add_input(&mut self, source: NodeId) {
        self.inputs.insert(source);
    }

    pub(super) fn add_output(&mut self, target: NodeId) {
        self.outputs.insert(target);
    }

    pub(super) fn remove_input(&mut self, source: NodeId) {
        self.inputs.remove(&source);
    }

    pub(super) fn remove_output(&mut self, target: NodeId) {
        self.outputs.remove(&target);
    }

    pub(super) fn set_value(&mut self, value: f32) {
        self.value = value;
        self.evaluated = true;
    }

    pub(super) fn clear_evaluated(&mut self) {
        self.evaluated = false;
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, IN: {:?}, OUT: {:?}]",
            self.id, self.kind, self.inputs, self.outputs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_a_set() {
        let mut node = Node::new(4, NodeKind::Hidden);
        node.add_input(1);
        node.add_input(1);
        node.add_output(3);

        assert_eq!(node.input_ids().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(node.output_ids().copied().collect::<Vec<_>>(), vec![3]);

        node.remove_input(1);
        node.remove_output(3);
        assert_eq!(node.input_ids().count(), 0);
        assert_eq!(node.output_ids().count(), 0);
    }

    #[test]
    fn set_value_marks_evaluated() {
        let mut node = Node::new(1, NodeKind::Output);
        node.set_value(0.25);
        assert!(node.evaluated());
        assert_eq!(node.value(), 0.25);

        node.clear_evaluated();
        assert!(!node.evaluated());
        assert_eq!(node.value(), 0.25);
    }

    #[test]
    fn equality_ignores_evaluation_state() {
        let mut node = Node::new(2, NodeKind::Hidden);
        node.add_output(3);
        let fresh = node.clone();
        node.set_value(0.75);
        assert_eq!(node, fresh);

        node.add_input(1);
        assert_ne!(node, fresh);
    }
}
