//! Evolution models.
//!
//! A model runs one independent evolutionary run against a shared
//! [`Environment`] and [`Dataset`]. Every run owns its population, its
//! statistics history and its random stream; the environment is only read.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Initializing                       │
//! │      ↓                              │
//! │  Evaluating → Selecting → Breeding  │
//! │      ↑                       ↓      │
//! │  Recording  ←  Replacing  ←──┘      │
//! │      ↓                              │
//! │  Terminated                         │
//! └─────────────────────────────────────┘
//! ```
//!
//! [`SteadyState`] evaluates on the calling thread; [`MasterSlave`] runs the
//! same state machine but spreads the Evaluating state over a worker pool.

mod master_slave;
mod population;
mod statistics;
mod steady_state;

pub use master_slave::MasterSlave;
pub use population::{Individual, Population};
pub use statistics::GenerationStatistics;
pub use steady_state::{State, SteadyState};

use crate::dataset::Dataset;
use crate::environment::Environment;
use crate::error::RunError;
use crate::fitness::UNDEFINED_FITNESS;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identity of one run plus its cancellation flag.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Run index within the training session.
    pub run: usize,
    /// Seed for this run's random stream.
    pub seed: u64,
    abort: Arc<AtomicBool>,
}

impl RunContext {
    /// A run that can only finish normally.
    #[must_use]
    pub fn new(run: usize, seed: u64) -> Self {
        Self {
            run,
            seed,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an abort flag with other runs.
    #[must_use]
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = abort;
        self
    }

    /// Whether an abort was requested.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Run index.
    pub run: usize,
    /// Seed the run was started with.
    pub seed: u64,
    /// Best individual according to the configured best policy.
    pub best: Individual,
    /// One snapshot per recorded generation.
    pub statistics: Vec<GenerationStatistics>,
    /// Whether the run stopped early because of an abort request.
    pub aborted: bool,
}

impl RunResult {
    /// Fitness of the best individual.
    #[must_use]
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness_or_undefined()
    }

    /// Number of recorded generations.
    #[must_use]
    pub fn generations(&self) -> usize {
        self.statistics.len()
    }

    /// Running best fitness after the last generation.
    #[must_use]
    pub fn final_best_so_far(&self) -> f64 {
        self.statistics.last().map_or(UNDEFINED_FITNESS, |s| s.best_so_far)
    }
}

/// Runs one evolutionary run.
///
/// A model keeps no per-run state, so one instance serves every run of a
/// training session, including concurrent ones.
pub trait EvolutionModel: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Execute a complete run.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if fitness evaluation fails.
    fn run(
        &self,
        environment: &Environment,
        dataset: &Dataset,
        context: RunContext,
    ) -> Result<RunResult, RunError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let context = RunContext::new(0, 1).with_abort(Arc::clone(&flag));
        assert!(!context.is_aborted());
        flag.store(true, Ordering::Relaxed);
        assert!(context.is_aborted());
    }
}
