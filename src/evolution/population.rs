//! Individuals and the population container.

use crate::fitness::UNDEFINED_FITNESS;
use crate::program::Program;
use serde::{Deserialize, Serialize};

/// A program with its cached fitness.
///
/// `fitness` is `None` until the program has been evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// The program.
    pub program: Program,
    /// Cached fitness, lower is better.
    pub fitness: Option<f64>,
}

impl Individual {
    /// An unevaluated individual.
    #[must_use]
    pub fn new(program: Program) -> Self {
        Self { program, fitness: None }
    }

    /// Cached fitness, or [`UNDEFINED_FITNESS`] if not yet evaluated.
    #[must_use]
    pub fn fitness_or_undefined(&self) -> f64 {
        self.fitness.unwrap_or(UNDEFINED_FITNESS)
    }
}

/// A fixed-size collection of individuals owned by one run.
#[derive(Debug, Clone, Default)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Wrap freshly generated programs.
    #[must_use]
    pub fn new(programs: Vec<Program>) -> Self {
        Self {
            individuals: programs.into_iter().map(Individual::new).collect(),
        }
    }

    /// Number of individuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Whether the population is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// All individuals.
    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Individual at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Individual> {
        self.individuals.get(index)
    }

    /// Indices whose fitness must be (re)computed.
    #[must_use]
    pub fn pending(&self) -> Vec<usize> {
        self.individuals
            .iter()
            .enumerate()
            .filter_map(|(i, individual)| individual.fitness.is_none().then_some(i))
            .collect()
    }

    /// Cache the fitness of `index`.
    pub fn set_fitness(&mut self, index: usize, fitness: f64) {
        self.individuals[index].fitness = Some(fitness);
    }

    /// Replace the individual at `index`, invalidating its fitness.
    pub fn replace(&mut self, index: usize, program: Program) {
        self.individuals[index] = Individual::new(program);
    }

    /// Fitness values in population order.
    #[must_use]
    pub fn fitness(&self) -> Vec<f64> {
        self.individuals.iter().map(Individual::fitness_or_undefined).collect()
    }

    /// The individual with the lowest fitness. Ties go to the lower index.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .min_by(|a, b| a.fitness_or_undefined().total_cmp(&b.fitness_or_undefined()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Program {
        Program::new(Vec::new(), vec![0])
    }

    #[test]
    fn test_pending_tracks_invalidated_slots() {
        let mut population = Population::new(vec![program(), program(), program()]);
        assert_eq!(population.pending(), vec![0, 1, 2]);

        for i in 0..3 {
            population.set_fitness(i, 1.0);
        }
        assert!(population.pending().is_empty());

        population.replace(1, program());
        assert_eq!(population.pending(), vec![1]);
        assert_eq!(population.len(), 3);
    }

    #[test]
    fn test_best_is_lowest_fitness() {
        let mut population = Population::new(vec![program(), program(), program()]);
        population.set_fitness(0, 3.0);
        population.set_fitness(1, 0.5);
        population.set_fitness(2, 0.5);

        assert_eq!(population.best().and_then(|b| b.fitness), Some(0.5));
        assert_eq!(population.fitness(), vec![3.0, 0.5, 0.5]);
    }

    #[test]
    fn test_unevaluated_reads_as_undefined() {
        let population = Population::new(vec![program()]);
        assert_eq!(population.fitness(), vec![UNDEFINED_FITNESS]);
    }
}
