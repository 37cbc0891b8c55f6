//! Runs one after another on the calling thread.

use crate::dataset::Dataset;
use crate::error::{RunError, TrainingError};
use crate::evolution::RunResult;
use crate::training::{Session, Trainer};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Executes runs in run order on the calling thread.
#[derive(Debug, Clone)]
pub struct SequentialTrainer {
    pub(super) session: Session,
}

impl Trainer for SequentialTrainer {
    fn train_runs(
        &self,
        dataset: &Dataset,
    ) -> Result<Vec<Result<RunResult, RunError>>, TrainingError> {
        info!(
            runs = self.session.runs,
            model = self.session.model.name(),
            "sequential training started"
        );
        Ok((0..self.session.runs)
            .map(|run| self.session.execute(run, dataset))
            .collect())
    }

    fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.session.abort)
    }
}
