use crate::genomics::{Genome, RegistryError};
use crate::{Innovation, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// An `InnovationRegistry` keeps track of the connection
/// innovations of a population, in order to make sure identical
/// structural mutations are assigned the same innovation numbers.
///
/// Connections are identified by their `(source, target)` node ids.
/// The first request for a pair is assigned the next value of a
/// monotonically increasing counter, starting at 1; any later
/// request for the same pair returns that same number.
///
/// A registry is shared by every genome of a population for the
/// whole run. Independent runs should each use their own registry,
/// or [`reset`] the previous one.
///
/// [`reset`]: InnovationRegistry::reset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationRegistry {
    counter: Innovation,
    // target -> source -> innovation
    innovations: HashMap<NodeId, HashMap<NodeId, Innovation, RandomState>, RandomState>,
}

impl InnovationRegistry {
    /// Creates an empty registry.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new();
    /// assert_eq!(registry.innovation_for(1, 3), Ok(1));
    /// assert_eq!(registry.innovation_for(2, 3), Ok(2));
    /// assert_eq!(registry.innovation_for(1, 3), Ok(1));
    /// ```
    pub fn new() -> InnovationRegistry {
        InnovationRegistry::default()
    }

    /// Returns the innovation number of the connection from
    /// `source` to `target`, registering the pair if it has
    /// never been seen.
    ///
    /// # Errors
    /// Returns [`RegistryError::Exhausted`] if a new number
    /// is needed but the counter would overflow.
    pub fn innovation_for(
        &mut self,
        source: NodeId,
        target: NodeId,
    ) -> Result<Innovation, RegistryError> {
        let counter = &mut self.counter;
        match self
            .innovations
            .entry(target)
            .or_default()
            .entry(source)
        {
            Entry::Occupied(entry) => Ok(*entry.get()),
            Entry::Vacant(entry) => {
                let innovation = counter.checked_add(1).ok_or(RegistryError::Exhausted)?;
                *counter = innovation;
                Ok(*entry.insert(innovation))
            }
        }
    }

    /// Returns the innovation numbers of two connections,
    /// given as `(source, target)` pairs, registering the
    /// pairs never seen before. Either both pairs end up
    /// registered or, on error, the registry is unchanged.
    ///
    /// # Errors
    /// Returns [`RegistryError::Exhausted`] if the counter
    /// cannot cover every new number needed.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new();
    /// registry.innovation_for(3, 2).unwrap();
    /// assert_eq!(registry.innovations_for((1, 3), (3, 2)), Ok((2, 1)));
    /// ```
    pub fn innovations_for(
        &mut self,
        first: (NodeId, NodeId),
        second: (NodeId, NodeId),
    ) -> Result<(Innovation, Innovation), RegistryError> {
        let unseen = |(source, target): (NodeId, NodeId)| self.lookup(source, target).is_none();
        let needed = usize::from(unseen(first)) + usize::from(first != second && unseen(second));
        self.counter
            .checked_add(needed)
            .ok_or(RegistryError::Exhausted)?;
        Ok((
            self.innovation_for(first.0, first.1)?,
            self.innovation_for(second.0, second.1)?,
        ))
    }

    /// Returns the innovation number registered for the
    /// connection from `source` to `target`, if any.
    pub fn lookup(&self, source: NodeId, target: NodeId) -> Option<Innovation> {
        self.innovations
            .get(&target)
            .and_then(|sources| sources.get(&source))
            .copied()
    }

    /// Returns the highest innovation number handed out
    /// so far, or 0 if the registry is empty.
    pub fn max_innovation(&self) -> Innovation {
        self.counter
    }

    /// Returns the number of registered connection pairs.
    pub fn len(&self) -> usize {
        self.innovations.values().map(HashMap::len).sum()
    }

    /// Returns `true` if no pair has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every registered pair and restarts the counter.
    pub fn reset(&mut self) {
        self.counter = 0;
        self.innovations.clear();
    }

    /// Returns every registered innovation as
    /// `(innovation, source, target)`, sorted by innovation number.
    pub fn innovation_history(&self) -> Vec<(Innovation, NodeId, NodeId)> {
        let mut history: Vec<_> = self
            .innovations
            .iter()
            .flat_map(|(&target, sources)| {
                sources
                    .iter()
                    .map(move |(&source, &innovation)| (innovation, source, target))
            })
            .collect();
        history.sort_unstable();
        history
    }

    /// Registers the connections of a genome that was built
    /// outside this registry, such as a loaded champion, so
    /// that later mutations stay consistent with its genes.
    ///
    /// Either every connection is registered or, on conflict,
    /// the registry is left unchanged.
    ///
    /// # Errors
    /// Returns [`RegistryError::Conflict`] if one of the genome's
    /// innovation numbers, or one of its endpoint pairs, is already
    /// registered with a different counterpart.
    pub fn absorb(&mut self, genome: &Genome) -> Result<(), RegistryError> {
        let mut endpoints: HashMap<Innovation, (NodeId, NodeId), RandomState> = self
            .innovation_history()
            .into_iter()
            .map(|(innovation, source, target)| (innovation, (source, target)))
            .collect();

        for connection in genome.connections() {
            let pair = connection.endpoints();
            match endpoints.entry(connection.innovation()) {
                Entry::Occupied(entry) if *entry.get() != pair => {
                    return Err(RegistryError::Conflict(connection.innovation()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(entry) => {
                    if self.lookup(pair.0, pair.1).is_some() {
                        return Err(RegistryError::Conflict(connection.innovation()));
                    }
                    entry.insert(pair);
                }
            }
        }

        for connection in genome.connections() {
            let (source, target) = connection.endpoints();
            self.innovations
                .entry(target)
                .or_default()
                .insert(source, connection.innovation());
            self.counter = self.counter.max(connection.innovation());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[test]
    fn same_pair_same_number() {
        let mut registry = InnovationRegistry::new();
        let first = registry.innovation_for(1, 4).unwrap();
        let second = registry.innovation_for(2, 4).unwrap();
        let third = registry.innovation_for(4, 1).unwrap();

        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(registry.innovation_for(1, 4), Ok(1));
        assert_eq!(registry.innovation_for(4, 1), Ok(3));
        assert_eq!(registry.max_innovation(), 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn lookup_does_not_register() {
        let mut registry = InnovationRegistry::new();
        assert_eq!(registry.lookup(1, 2), None);
        assert!(registry.is_empty());

        registry.innovation_for(1, 2).unwrap();
        assert_eq!(registry.lookup(1, 2), Some(1));
        assert_eq!(registry.lookup(2, 1), None);
    }

    #[test]
    fn exhausted_counter() {
        let mut registry = InnovationRegistry {
            counter: usize::MAX,
            innovations: HashMap::default(),
        };
        assert_eq!(registry.innovation_for(1, 2), Err(RegistryError::Exhausted));
        assert!(registry.is_empty());
    }

    #[test]
    fn paired_request_is_all_or_nothing() {
        let mut registry = InnovationRegistry {
            counter: usize::MAX - 1,
            innovations: HashMap::default(),
        };
        assert_eq!(
            registry.innovations_for((1, 3), (3, 2)),
            Err(RegistryError::Exhausted)
        );
        assert!(registry.is_empty());
        assert_eq!(registry.max_innovation(), usize::MAX - 1);

        // One known pair leaves room for the other.
        assert_eq!(registry.innovation_for(1, 3), Ok(usize::MAX));
        assert_eq!(
            registry.innovations_for((1, 3), (3, 2)),
            Err(RegistryError::Exhausted)
        );
        assert_eq!(registry.len(), 1);

        let mut registry = InnovationRegistry::new();
        assert_eq!(registry.innovations_for((1, 3), (1, 3)), Ok((1, 1)));
        assert_eq!(registry.max_innovation(), 1);
    }

    #[test]
    fn reset_restarts_counter() {
        let mut registry = InnovationRegistry::new();
        registry.innovation_for(1, 3).unwrap();
        registry.innovation_for(2, 3).unwrap();
        registry.reset();

        assert!(registry.is_empty());
        assert_eq!(registry.innovation_for(2, 3), Ok(1));
    }

    #[test]
    fn history_is_sorted() {
        let mut registry = InnovationRegistry::new();
        for (source, target) in [(5, 3), (1, 3), (2, 4), (1, 4)] {
            registry.innovation_for(source, target).unwrap();
        }
        assert_eq!(
            registry.innovation_history(),
            vec![(1, 5, 3), (2, 1, 3), (3, 2, 4), (4, 1, 4)]
        );
    }

    #[test]
    fn absorb_foreign_genome() {
        let two = NonZeroUsize::new(2).unwrap();
        let one = NonZeroUsize::new(1).unwrap();

        let mut foreign = InnovationRegistry::new();
        let mut genome = Genome::with_io(two, one);
        genome.connect(2, 3, 0.5, &mut foreign).unwrap();
        genome.connect(1, 3, 0.5, &mut foreign).unwrap();

        let mut registry = InnovationRegistry::new();
        registry.absorb(&genome).unwrap();
        assert_eq!(registry.lookup(2, 3), Some(1));
        assert_eq!(registry.lookup(1, 3), Some(2));
        assert_eq!(registry.innovation_for(3, 3), Ok(3));

        let mut conflicting = InnovationRegistry::new();
        conflicting.innovation_for(1, 3).unwrap();
        assert_eq!(
            conflicting.absorb(&genome),
            Err(RegistryError::Conflict(1))
        );
        assert_eq!(conflicting.len(), 1);
    }
}
