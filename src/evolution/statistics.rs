//! Per-generation statistics.

// Statistics use intentional casts for averaging
#![allow(clippy::cast_precision_loss)]

use crate::evolution::population::Population;
use serde::{Deserialize, Serialize};

/// Snapshot of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStatistics {
    /// Generation index, starting at 0.
    pub generation: usize,
    /// Lowest fitness in the generation.
    pub best: f64,
    /// Mean fitness.
    pub mean: f64,
    /// Highest fitness in the generation.
    pub worst: f64,
    /// Fitness standard deviation.
    pub std_dev: f64,
    /// Lowest fitness seen so far in the run.
    pub best_so_far: f64,
    /// Mean instruction count.
    pub mean_program_length: f64,
    /// Mean effective instruction count.
    pub mean_effective_length: f64,
}

impl GenerationStatistics {
    /// Summarise an evaluated population.
    ///
    /// `best_so_far` is the running best before this generation; the stored
    /// value includes this generation's best.
    #[must_use]
    pub fn from_population(generation: usize, population: &Population, best_so_far: f64) -> Self {
        let fitness = population.fitness();
        if fitness.is_empty() {
            return Self {
                generation,
                best: best_so_far,
                mean: 0.0,
                worst: 0.0,
                std_dev: 0.0,
                best_so_far,
                mean_program_length: 0.0,
                mean_effective_length: 0.0,
            };
        }

        let n = fitness.len() as f64;
        let mean = fitness.iter().sum::<f64>() / n;
        let best = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let worst = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;

        let individuals = population.individuals();
        let total_length: usize = individuals.iter().map(|i| i.program.len()).sum();
        let total_effective: usize = individuals.iter().map(|i| i.program.effective_len()).sum();

        Self {
            generation,
            best,
            mean,
            worst,
            std_dev: variance.sqrt(),
            best_so_far: best_so_far.min(best),
            mean_program_length: total_length as f64 / n,
            mean_effective_length: total_effective as f64 / n,
        }
    }
}
