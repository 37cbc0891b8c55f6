//! Output formatting for training results.

use lgp::{RunResult, TrainingResult};
use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;

/// JSON-serializable training report.
#[derive(Debug, Serialize)]
pub(super) struct JsonTrainingReport<'a> {
    /// Number of runs.
    runs: usize,
    /// Index of the run with the lowest best fitness.
    best_run: Option<usize>,
    /// Lowest best fitness across runs.
    best_fitness: Option<f64>,
    /// Mean of per-run best fitness.
    mean_best_fitness: Option<f64>,
    /// Effective form of the overall best program.
    best_program: Option<String>,
    /// Wall-clock training time in seconds.
    elapsed_seconds: f64,
    /// Full per-run results.
    evaluations: &'a [RunResult],
}

impl<'a> JsonTrainingReport<'a> {
    /// Create from a training result.
    pub(super) fn from_result(result: &'a TrainingResult, elapsed: Duration) -> Self {
        let best = result.best();
        Self {
            runs: result.len(),
            best_run: best.map(|r| r.run),
            best_fitness: best.map(RunResult::best_fitness),
            mean_best_fitness: result.mean_best_fitness(),
            best_program: best.map(|r| r.best.program.effective().to_string()),
            elapsed_seconds: elapsed.as_secs_f64(),
            evaluations: &result.evaluations,
        }
    }
}

/// Format a training result as human-readable text.
pub(super) fn format_training_text(result: &TrainingResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Training Results ({} runs)", result.len());
    output.push_str("========================================\n\n");

    output.push_str("  Run        Seed    Best fitness  Gens  Length  Effective\n");
    for run in &result.evaluations {
        let _ = writeln!(
            output,
            "  {:>3}  {:>10}  {:>14.6}  {:>4}  {:>6}  {:>9}{}",
            run.run,
            run.seed,
            run.best_fitness(),
            run.generations(),
            run.best.program.len(),
            run.best.program.effective_len(),
            if run.aborted { "  (aborted)" } else { "" }
        );
    }

    if let Some(mean) = result.mean_best_fitness() {
        let _ = writeln!(output, "\nMean best fitness: {mean:.6}");
    }

    if let Some(best) = result.best() {
        let _ = writeln!(
            output,
            "\nBest program (run {}, fitness {:.6}):",
            best.run,
            best.best_fitness()
        );
        let _ = writeln!(output, "{}", best.best.program.effective());
    }

    output
}
