use crate::genomics::{EvaluationError, Genome};
use crate::NodeId;

use std::collections::VecDeque;

/// Logistic activation function.
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl Genome {
    /// Runs the genome as a network over the specified inputs,
    /// and returns the index of the chosen action: the output
    /// node with the highest value, counting outputs from 0 in
    /// id order. Ties go to the lowest index.
    ///
    /// Nodes are computed breadth-first starting from the inputs,
    /// following enabled connections only. Each node is computed
    /// once per call as the sigmoid of its weighted inputs; inputs
    /// not yet computed in this call contribute the value they
    /// held after the previous call, so cycles terminate and act
    /// as one step of recurrent memory. Outputs the traversal did
    /// not reach are computed at the end.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::ShapeMismatch`] if the number
    /// of inputs differs from the genome's input count.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let mut genome = Genome::new(&config);
    ///
    /// // Input 1 excites output 3, input 2 inhibits it.
    /// genome.connect(1, 3, 2.0, &mut registry).unwrap();
    /// genome.connect(2, 3, -2.0, &mut registry).unwrap();
    ///
    /// // Output 4 always sits at sigmoid(0) = 0.5.
    /// assert_eq!(genome.evaluate(&[1.0, 0.0]), Ok(0));
    /// assert_eq!(genome.evaluate(&[0.0, 1.0]), Ok(1));
    /// assert!(genome.evaluate(&[1.0]).is_err());
    /// ```
    pub fn evaluate(&mut self, inputs: &[f32]) -> Result<usize, EvaluationError> {
        if inputs.len() != self.input_count() {
            return Err(EvaluationError::ShapeMismatch {
                expected: self.input_count(),
                found: inputs.len(),
            });
        }

        let mut queue = VecDeque::new();
        for (id, &value) in (1..).zip(inputs) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.set_value(value);
                queue.extend(node.output_ids().copied());
            }
        }

        while let Some(id) = queue.pop_front() {
            if self.is_evaluated(id) {
                continue;
            }
            let value = self.activation(id);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.set_value(value);
            }
            let pending: Vec<NodeId> = self
                .nodes
                .get(&id)
                .into_iter()
                .flat_map(|node| node.output_ids())
                .copied()
                .filter(|&target| !self.is_evaluated(target))
                .collect();
            queue.extend(pending);
        }

        let mut action = 0;
        let mut best = f32::NEG_INFINITY;
        for (index, id) in self.output_ids().enumerate() {
            if !self.is_evaluated(id) {
                let value = self.activation(id);
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.set_value(value);
                }
            }
            let value = self.nodes.get(&id).map_or(f32::NEG_INFINITY, |n| n.value());
            if value > best {
                best = value;
                action = index;
            }
        }

        for node in self.nodes.values_mut() {
            node.clear_evaluated();
        }
        Ok(action)
    }

    fn is_evaluated(&self, id: NodeId) -> bool {
        self.nodes.get(&id).map_or(false, |n| n.evaluated())
    }

    /// Sigmoid of the weighted sum of a node's enabled inputs.
    fn activation(&self, id: NodeId) -> f32 {
        let sum = self
            .nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.input_ids())
            .filter_map(|&source| {
                let weight = self.connection_between(source, id)?.weight();
                let value = self.nodes.get(&source)?.value();
                Some(weight * value)
            })
            .sum();
        sigmoid(sum)
    }
}
