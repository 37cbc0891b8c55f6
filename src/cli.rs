//! CLI command implementations for LGP.

pub(crate) mod config;
pub(crate) mod train;

mod output;

use clap::ValueEnum;
use lgp::{ConfigurationError, DatasetError, TrainingError};
use std::error::Error;
use std::fmt;

/// Output format for the `train` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Built-in fitness functions selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FitnessMeasure {
    /// Sum of squared errors.
    Sse,
    /// Mean squared error.
    Mse,
    /// Mean absolute error.
    Mae,
    /// Root mean squared error.
    Rmse,
    /// Number of cases whose rounded outputs miss the target.
    Mismatches,
}

impl FitnessMeasure {
    /// Identifier understood by `FitnessFunction::from_name`.
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Sse => "sse",
            Self::Mse => "mse",
            Self::Mae => "mae",
            Self::Rmse => "rmse",
            Self::Mismatches => "mismatches",
        }
    }
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

impl From<ConfigurationError> for CliError {
    fn from(e: ConfigurationError) -> Self {
        Self::new(format!("invalid configuration: {e}"))
    }
}

impl From<DatasetError> for CliError {
    fn from(e: DatasetError) -> Self {
        Self::new(format!("invalid dataset: {e}"))
    }
}

impl From<TrainingError> for CliError {
    fn from(e: TrainingError) -> Self {
        Self::new(e.to_string())
    }
}
