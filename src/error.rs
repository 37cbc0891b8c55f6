//! Error types for the LGP engine.
//!
//! Errors are split by the phase that raises them: configuration errors are
//! reported while the environment is assembled, evaluation errors abort the
//! run that hit them, and operator constraint errors never leave the
//! evolution loop.

use crate::modules::CoreModuleType;
use thiserror::Error;

/// Invalid or mutually inconsistent parameters.
///
/// Always detected before the first run starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A numeric parameter is outside its allowed range.
    #[error("invalid value for `{parameter}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Human readable explanation.
        reason: String,
    },
    /// Two parameters contradict each other.
    #[error("`{lower}` ({lower_value}) must not exceed `{upper}` ({upper_value})")]
    InvertedBounds {
        /// Parameter that should be the lower bound.
        lower: &'static str,
        /// Its value.
        lower_value: usize,
        /// Parameter that should be the upper bound.
        upper: &'static str,
        /// Its value.
        upper_value: usize,
    },
    /// An output register does not name a calculation register.
    #[error("output register {index} is outside the calculation registers {start}..{end}")]
    OutputRegisterOutOfRange {
        /// The configured register index.
        index: usize,
        /// First calculation register.
        start: usize,
        /// One past the last calculation register.
        end: usize,
    },
    /// The same output register was listed twice.
    #[error("output register {0} is listed more than once")]
    DuplicateOutputRegister(usize),
    /// An operation identifier did not resolve.
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    /// A probability is outside `[0, 1]`.
    #[error("rate `{parameter}` must lie in [0, 1], got {value}")]
    RateOutOfRange {
        /// Name of the rate.
        parameter: &'static str,
        /// The configured value.
        value: f64,
    },
    /// The fitness function cannot consume the configured outputs.
    #[error("fitness function expects {expected} output(s) but {actual} output register(s) are configured")]
    FitnessShape {
        /// Shape the fitness function expects.
        expected: &'static str,
        /// Number of configured output registers.
        actual: usize,
    },
    /// A module role has no registered factory.
    #[error("no module registered for {0}")]
    MissingModule(CoreModuleType),
    /// A module factory refused to build its module.
    #[error("module {module} could not be built: {reason}")]
    ModuleFactory {
        /// Role of the failing module.
        module: CoreModuleType,
        /// Why it failed.
        reason: String,
    },
    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid JSON for [`crate::Configuration`].
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fitness evaluation failed for a program.
///
/// Fatal for the run that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum EvaluationError {
    /// Program outputs and dataset targets have different shapes.
    #[error("sample {sample}: program produces {outputs} output(s) but the target has {targets} value(s)")]
    ShapeMismatch {
        /// Index of the offending sample.
        sample: usize,
        /// Number of program outputs.
        outputs: usize,
        /// Number of target values.
        targets: usize,
    },
    /// A sample does not carry the configured number of features.
    #[error("sample {sample}: expected {expected} feature(s), found {found}")]
    FeatureCount {
        /// Index of the offending sample.
        sample: usize,
        /// Configured feature count.
        expected: usize,
        /// Features present on the sample.
        found: usize,
    },
    /// There is nothing to evaluate against.
    #[error("dataset is empty")]
    EmptyDataset,
}

/// An operator could not satisfy its bounds.
///
/// The evolution model recovers locally by skipping the breeding event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OperatorConstraintError {
    /// A parent program has no instructions to exchange.
    #[error("cannot recombine an empty program")]
    EmptyParent,
    /// The requested segment cannot be placed inside the program bounds.
    #[error("no valid segment: program length {length}, bounds {minimum}..={maximum}")]
    NoValidSegment {
        /// Length of the program being modified.
        length: usize,
        /// Minimum program length.
        minimum: usize,
        /// Maximum program length.
        maximum: usize,
    },
}

/// Dataset construction failed.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Every sample needs exactly one target.
    #[error("dataset has {samples} sample(s) but {targets} target(s)")]
    LengthMismatch {
        /// Number of samples.
        samples: usize,
        /// Number of targets.
        targets: usize,
    },
    /// Dataset file could not be read.
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    /// Dataset file is not valid JSON.
    #[error("failed to parse dataset: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single evolutionary run failed.
///
/// Carries enough context to replay the failure with the same seed.
#[derive(Debug, Clone, Copy, Error)]
#[error("run {run} (seed {seed}) failed at generation {generation}: {source}")]
pub struct RunError {
    /// Index of the failing run.
    pub run: usize,
    /// Seed of the failing run.
    pub seed: u64,
    /// Generation being evaluated when the error occurred.
    pub generation: usize,
    /// Underlying cause.
    #[source]
    pub source: EvaluationError,
}

/// Training could not complete.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Training was requested before the environment or model was supplied.
    #[error("trainer is not ready: {0} has not been initialised")]
    NotReady(&'static str),
    /// The environment could not be assembled.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// One of the runs failed.
    #[error(transparent)]
    Run(#[from] RunError),
}
