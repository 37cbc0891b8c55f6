//! Runs in parallel across a bounded worker pool.

use crate::dataset::Dataset;
use crate::error::{RunError, TrainingError};
use crate::evolution::RunResult;
use crate::training::{Session, Trainer};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Executes runs concurrently, one run per worker at a time.
///
/// The pool holds at most one worker per available core, and never more
/// workers than runs. Results are gathered at a join barrier and sorted by
/// run index, so the output does not depend on completion order.
#[derive(Debug, Clone)]
pub struct DistributedTrainer {
    pub(super) session: Session,
    pub(super) threads: Option<usize>,
}

impl DistributedTrainer {
    fn worker_count(&self) -> usize {
        let cores = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        self.threads
            .unwrap_or(cores)
            .min(cores)
            .min(self.session.runs)
            .max(1)
    }
}

impl Trainer for DistributedTrainer {
    fn train_runs(
        &self,
        dataset: &Dataset,
    ) -> Result<Vec<Result<RunResult, RunError>>, TrainingError> {
        let workers = self.worker_count();
        info!(
            runs = self.session.runs,
            workers,
            model = self.session.model.name(),
            "distributed training started"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("lgp-run-{i}"))
            .build()?;

        let session: &Session = &self.session;
        let mut outcomes: Vec<(usize, Result<RunResult, RunError>)> = pool.install(|| {
            (0..session.runs)
                .into_par_iter()
                .map(|run| (run, session.execute(run, dataset)))
                .collect()
        });
        outcomes.sort_by_key(|(run, _)| *run);

        Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }

    fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.session.abort)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Configuration;
    use crate::environment::Environment;
    use crate::evolution::SteadyState;
    use crate::fitness::FitnessFunction;
    use crate::training::TrainerBuilder;

    #[test]
    fn test_worker_count_is_bounded_by_runs() {
        let env = Environment::standard(Configuration::default(), FitnessFunction::sse()).unwrap();
        let trainer = TrainerBuilder::new()
            .environment(env)
            .model(SteadyState)
            .runs(1)
            .threads(64)
            .build_distributed()
            .unwrap();
        assert_eq!(trainer.worker_count(), 1);
    }
}
