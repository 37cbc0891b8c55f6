//! Master-slave evolution: steady-state with pooled fitness evaluation.

use crate::config::Configuration;
use crate::dataset::Dataset;
use crate::environment::Environment;
use crate::error::RunError;
use crate::evolution::steady_state::{evolve, Evaluator};
use crate::evolution::{EvolutionModel, RunContext, RunResult};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::Arc;

/// Steady-state model whose Evaluating state runs on a worker pool.
///
/// Only where fitness is computed changes; selection, breeding and the random
/// stream are identical to [`SteadyState`](crate::evolution::SteadyState), so
/// both models produce the same result for the same seed.
#[derive(Debug, Clone)]
pub struct MasterSlave {
    evaluator: Evaluator,
}

impl MasterSlave {
    /// Create a model with `threads` evaluation workers.
    ///
    /// Zero uses rayon's default, the available parallelism.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be created.
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lgp-eval-{i}"))
            .build()?;
        Ok(Self::with_pool(Arc::new(pool)))
    }

    /// Create a model sized by `evaluation_threads`.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be created.
    pub fn from_configuration(configuration: &Configuration) -> Result<Self, ThreadPoolBuildError> {
        Self::new(configuration.evaluation_threads)
    }

    /// Evaluate on an existing pool.
    #[must_use]
    pub fn with_pool(pool: Arc<ThreadPool>) -> Self {
        Self {
            evaluator: Evaluator::Pool(pool),
        }
    }
}

impl EvolutionModel for MasterSlave {
    fn name(&self) -> &'static str {
        "master_slave"
    }

    fn run(
        &self,
        environment: &Environment,
        dataset: &Dataset,
        context: RunContext,
    ) -> Result<RunResult, RunError> {
        evolve(environment, dataset, context, &self.evaluator, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Sample, Target};
    use crate::evolution::SteadyState;
    use crate::fitness::FitnessFunction;

    fn setup() -> (Environment, Dataset) {
        let config = Configuration {
            num_features: 1,
            num_calculation_registers: 2,
            initial_minimum_program_length: 2,
            initial_maximum_program_length: 8,
            minimum_program_length: 1,
            maximum_program_length: 16,
            population_size: 30,
            generations: 6,
            ..Default::default()
        };
        let samples = (0..8).map(|i| Sample::from_values(&[f64::from(i)])).collect();
        let targets = (0..8).map(|i| Target::Single(f64::from(i) * 3.0)).collect();
        (
            Environment::standard(config, FitnessFunction::mse()).unwrap(),
            Dataset::new(samples, targets).unwrap(),
        )
    }

    #[test]
    fn test_matches_steady_state() {
        let (env, data) = setup();
        let pooled = MasterSlave::new(3).unwrap();

        let expected = SteadyState.run(&env, &data, RunContext::new(1, 17)).unwrap();
        let actual = pooled.run(&env, &data, RunContext::new(1, 17)).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_pool_from_configuration() {
        let config = Configuration {
            evaluation_threads: 2,
            ..Default::default()
        };
        let model = MasterSlave::from_configuration(&config).unwrap();
        assert_eq!(model.name(), "master_slave");
    }
}
