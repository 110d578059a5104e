use crate::genomics::Genome;

use serde::{Deserialize, Serialize};

/// Species identifier. Specifies the generation
/// in which the species was formed, and the count
/// of other species formed before it in the _same
/// generation_ (i.e, if it was the third species
/// formed in generation 5, it will be species [5, 2]).
///
/// Species are formed anew every generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are clusters of genomes within a
/// [speciation distance] of the species' _representative_,
/// which is its first member.
///
/// A species holds the positions of its members in
/// the population's agents; the genomes themselves
/// are reached through [`Population::genomes_of`].
///
/// [speciation distance]: crate::PopulationConfig::distance_threshold
/// [`Population::genomes_of`]: crate::Population::genomes_of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesID,
    pub(super) members: Vec<usize>,
}

impl Species {
    /// Creates a new species with the specified ID,
    /// represented by the agent at `representative`.
    ///
    /// # Examples
    /// ```
    /// use snakeneat::{Species, SpeciesID};
    ///
    /// let species = Species::new(SpeciesID(1, 0), 4);
    /// assert_eq!(species.id(), SpeciesID(1, 0));
    /// assert_eq!(species.members(), &[4]);
    /// ```
    pub fn new(id: SpeciesID, representative: usize) -> Species {
        Species {
            id,
            members: vec![representative],
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the positions of the species' members
    /// among the population's agents, representative first.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns the position of the species' representative.
    pub fn representative_index(&self) -> Option<usize> {
        self.members.first().copied()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the species' representative among `agents`.
    pub fn representative<'a>(&self, agents: &'a [Genome]) -> Option<&'a Genome> {
        self.representative_index().and_then(|i| agents.get(i))
    }

    /// Returns the species' best-performing member among
    /// `agents`. Ties go to the earliest member.
    pub fn champion<'a>(&self, agents: &'a [Genome]) -> Option<&'a Genome> {
        self.members
            .iter()
            .filter_map(|&i| agents.get(i))
            .fold(None, |best: Option<&Genome>, g| match best {
                Some(b) if b.fitness.total_cmp(&g.fitness).is_ge() => Some(b),
                _ => Some(g),
            })
    }

    /// Returns the average fitness of the species' members
    /// among `agents`, or 0 for an empty species.
    pub fn mean_fitness(&self, agents: &[Genome]) -> f32 {
        let fitnesses: Vec<f32> = self
            .members
            .iter()
            .filter_map(|&i| agents.get(i))
            .map(|g| g.fitness)
            .collect();
        if fitnesses.is_empty() {
            0.0
        } else {
            fitnesses.iter().sum::<f32>() / fitnesses.len() as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn agents(fitnesses: &[f32]) -> Vec<Genome> {
        fitnesses
            .iter()
            .map(|&fitness| {
                let mut genome = Genome::with_io(NonZeroUsize::MIN, NonZeroUsize::MIN);
                genome.fitness = fitness;
                genome
            })
            .collect()
    }

    #[test]
    fn champion_and_mean() {
        let agents = agents(&[5.0, 20.0, 10.0, 20.0]);
        let mut species = Species::new(SpeciesID(0, 0), 0);
        species.members.extend([1, 3]);

        assert_eq!(species.len(), 3);
        assert_eq!(species.mean_fitness(&agents), (5.0 + 20.0 + 20.0) / 3.0);
        let champion = species.champion(&agents).unwrap();
        assert!(std::ptr::eq(champion, &agents[1]));
        assert!(std::ptr::eq(species.representative(&agents).unwrap(), &agents[0]));
    }

    #[test]
    fn empty_species() {
        let agents = agents(&[1.0]);
        let mut species = Species::new(SpeciesID(2, 1), 0);
        species.members.clear();

        assert!(species.is_empty());
        assert_eq!(species.representative_index(), None);
        assert_eq!(species.champion(&agents), None);
        assert_eq!(species.mean_fitness(&agents), 0.0);
    }
}
