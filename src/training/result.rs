//! Aggregated training output.

// Averaging over run counts
#![allow(clippy::cast_precision_loss)]

use crate::evolution::RunResult;
use serde::{Deserialize, Serialize};

/// Results of every run in run order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingResult {
    /// One result per run, sorted by run index.
    pub evaluations: Vec<RunResult>,
}

impl TrainingResult {
    /// The run whose best individual has the lowest fitness.
    #[must_use]
    pub fn best(&self) -> Option<&RunResult> {
        self.evaluations
            .iter()
            .min_by(|a, b| a.best_fitness().total_cmp(&b.best_fitness()))
    }

    /// Mean of the per-run best fitness values.
    #[must_use]
    pub fn mean_best_fitness(&self) -> Option<f64> {
        if self.evaluations.is_empty() {
            return None;
        }
        let total: f64 = self.evaluations.iter().map(RunResult::best_fitness).sum();
        Some(total / self.evaluations.len() as f64)
    }

    /// Number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    /// Whether no run was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::Individual;
    use crate::program::Program;

    fn run(run: usize, fitness: f64) -> RunResult {
        RunResult {
            run,
            seed: run as u64,
            best: Individual {
                program: Program::new(Vec::new(), vec![0]),
                fitness: Some(fitness),
            },
            statistics: Vec::new(),
            aborted: false,
        }
    }

    #[test]
    fn test_best_and_mean() {
        let result = TrainingResult {
            evaluations: vec![run(0, 4.0), run(1, 1.0), run(2, 7.0)],
        };
        assert_eq!(result.best().map(|r| r.run), Some(1));
        assert!((result.mean_best_fitness().unwrap() - 4.0).abs() < 1e-12);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_empty() {
        let result = TrainingResult::default();
        assert!(result.best().is_none());
        assert!(result.mean_best_fitness().is_none());
        assert!(result.is_empty());
    }
}
