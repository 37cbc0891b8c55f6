//! Training orchestration.
//!
//! A trainer executes a number of independent runs of one evolution model
//! against a shared environment and dataset. Run `r` is seeded with
//! `seed + r`, so any single run can be replayed on its own.
//!
//! # Example
//!
//! ```ignore
//! use lgp::training::{Trainer, TrainerBuilder};
//!
//! let trainer = TrainerBuilder::new()
//!     .environment(environment)
//!     .model(SteadyState::new())
//!     .build_distributed()?;
//! let result = trainer.train(&dataset)?;
//! println!("{}", result.best().unwrap().best.program);
//! ```

mod distributed;
mod result;
mod sequential;

pub use distributed::DistributedTrainer;
pub use result::TrainingResult;
pub use sequential::SequentialTrainer;

use crate::dataset::Dataset;
use crate::environment::Environment;
use crate::error::{RunError, TrainingError};
use crate::evolution::{EvolutionModel, RunContext, RunResult};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

/// Called once per finished run, from the thread that ran it.
pub type RunObserver = Arc<dyn Fn(&RunResult) + Send + Sync>;

/// Runs a training session.
pub trait Trainer {
    /// Execute every run and return each outcome in run order.
    ///
    /// A failed run does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session itself cannot start.
    fn train_runs(
        &self,
        dataset: &Dataset,
    ) -> Result<Vec<Result<RunResult, RunError>>, TrainingError>;

    /// Flag that aborts every run of this trainer at its next generation
    /// boundary.
    ///
    /// The flag is never cleared by the trainer: once set, every later
    /// training call also stops after its first generation until the caller
    /// stores `false` again.
    fn abort_handle(&self) -> Arc<AtomicBool>;

    /// Execute every run.
    ///
    /// # Errors
    ///
    /// Returns the first failed run, by run index, after all runs finished.
    fn train(&self, dataset: &Dataset) -> Result<TrainingResult, TrainingError> {
        let evaluations = self
            .train_runs(dataset)?
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TrainingResult { evaluations })
    }
}

/// State shared by both trainers.
#[derive(Clone)]
struct Session {
    environment: Arc<Environment>,
    model: Arc<dyn EvolutionModel>,
    runs: usize,
    seed: u64,
    abort: Arc<AtomicBool>,
    observer: Option<RunObserver>,
}

impl Session {
    fn execute(&self, run: usize, dataset: &Dataset) -> Result<RunResult, RunError> {
        let context = RunContext::new(run, self.seed.wrapping_add(run as u64))
            .with_abort(Arc::clone(&self.abort));
        let outcome = self.model.run(&self.environment, dataset, context);
        match &outcome {
            Ok(result) => {
                if let Some(observer) = &self.observer {
                    observer(result);
                }
            }
            Err(error) => warn!(run, %error, "run failed"),
        }
        outcome
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("model", &self.model.name())
            .field("runs", &self.runs)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

/// Assembles a trainer, refusing to build until it has what it needs.
#[derive(Default)]
pub struct TrainerBuilder {
    environment: Option<Arc<Environment>>,
    model: Option<Arc<dyn EvolutionModel>>,
    runs: Option<usize>,
    seed: Option<u64>,
    threads: Option<usize>,
    observer: Option<RunObserver>,
}

impl fmt::Debug for TrainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainerBuilder")
            .field("environment", &self.environment.is_some())
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .field("runs", &self.runs)
            .field("seed", &self.seed)
            .field("threads", &self.threads)
            .finish_non_exhaustive()
    }
}

impl TrainerBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment shared by every run.
    #[must_use]
    pub fn environment(mut self, environment: impl Into<Arc<Environment>>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Evolution model used for every run.
    #[must_use]
    pub fn model(mut self, model: impl EvolutionModel + 'static) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    /// Evolution model behind a shared pointer.
    #[must_use]
    pub fn shared_model(mut self, model: Arc<dyn EvolutionModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Number of runs. Defaults to the configuration's `number_of_runs`.
    #[must_use]
    pub fn runs(mut self, runs: usize) -> Self {
        self.runs = Some(runs);
        self
    }

    /// Base seed. Defaults to the configuration's `seed`.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Upper bound on concurrent runs for the distributed trainer.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Callback invoked as each run completes.
    #[must_use]
    pub fn observer(mut self, observer: impl Fn(&RunResult) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    fn session(self) -> Result<(Session, Option<usize>), TrainingError> {
        let environment = self.environment.ok_or(TrainingError::NotReady("environment"))?;
        let model = self.model.ok_or(TrainingError::NotReady("evolution model"))?;
        let config = environment.configuration();
        let session = Session {
            runs: self.runs.unwrap_or(config.number_of_runs),
            seed: self.seed.unwrap_or(config.seed),
            environment,
            model,
            abort: Arc::new(AtomicBool::new(false)),
            observer: self.observer,
        };
        Ok((session, self.threads))
    }

    /// Build a trainer that executes runs one after another.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::NotReady`] if the environment or model is
    /// missing.
    pub fn build_sequential(self) -> Result<SequentialTrainer, TrainingError> {
        let (session, _) = self.session()?;
        Ok(SequentialTrainer { session })
    }

    /// Build a trainer that executes runs concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::NotReady`] if the environment or model is
    /// missing.
    pub fn build_distributed(self) -> Result<DistributedTrainer, TrainingError> {
        let (session, threads) = self.session()?;
        Ok(DistributedTrainer { session, threads })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::evolution::SteadyState;
    use crate::fitness::FitnessFunction;

    #[test]
    fn test_builder_reports_missing_environment() {
        let result = TrainerBuilder::new().model(SteadyState).build_sequential();
        assert!(matches!(result, Err(TrainingError::NotReady("environment"))));
    }

    #[test]
    fn test_builder_reports_missing_model() {
        let env = Environment::standard(Configuration::default(), FitnessFunction::sse()).unwrap();
        let result = TrainerBuilder::new().environment(env).build_distributed();
        assert!(matches!(result, Err(TrainingError::NotReady("evolution model"))));
    }

    #[test]
    fn test_builder_defaults_from_configuration() {
        let config = Configuration {
            number_of_runs: 3,
            seed: 1000,
            ..Default::default()
        };
        let env = Environment::standard(config, FitnessFunction::sse()).unwrap();
        let trainer = TrainerBuilder::new()
            .environment(env)
            .model(SteadyState)
            .build_sequential()
            .unwrap();
        assert_eq!(trainer.session.runs, 3);
        assert_eq!(trainer.session.seed, 1000);
    }
}
