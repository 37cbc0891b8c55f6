//! Fitness evaluation.
//!
//! A [`FitnessContext`] runs a program over every sample of a dataset and
//! hands the collected outputs, with their targets, to a caller supplied
//! [`FitnessFunction`]. Fitness is minimised: lower is strictly better.

// Fitness functions use intentional casts for averaging
#![allow(clippy::cast_precision_loss)]

use crate::dataset::{Dataset, Target};
use crate::environment::Context;
use crate::error::{ConfigurationError, EvaluationError};
use crate::program::{Program, RegisterSet};
use std::fmt;
use std::sync::Arc;

/// Fitness assigned when a fitness function yields a non-finite value.
pub const UNDEFINED_FITNESS: f64 = 10e9;

/// Signature of a single-output fitness function: `(outputs, targets)`.
pub type SingleOutputFn = dyn Fn(&[f64], &[f64]) -> f64 + Send + Sync;

/// Signature of a multiple-output fitness function: `(outputs, targets)`.
pub type MultipleOutputFn = dyn Fn(&[Vec<f64>], &[Vec<f64>]) -> f64 + Send + Sync;

/// A caller supplied fitness function.
///
/// Must be total and deterministic; outputs and targets arrive in dataset
/// order.
#[derive(Clone)]
pub enum FitnessFunction {
    /// Consumes one output per sample.
    Single(Arc<SingleOutputFn>),
    /// Consumes several outputs per sample.
    Multiple(Arc<MultipleOutputFn>),
}

impl fmt::Debug for FitnessFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("FitnessFunction::Single(..)"),
            Self::Multiple(_) => f.write_str("FitnessFunction::Multiple(..)"),
        }
    }
}

impl FitnessFunction {
    /// Wrap a single-output fitness function.
    pub fn single(function: impl Fn(&[f64], &[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self::Single(Arc::new(function))
    }

    /// Wrap a multiple-output fitness function.
    pub fn multiple(
        function: impl Fn(&[Vec<f64>], &[Vec<f64>]) -> f64 + Send + Sync + 'static,
    ) -> Self {
        Self::Multiple(Arc::new(function))
    }

    /// Sum of squared errors.
    #[must_use]
    pub fn sse() -> Self {
        Self::single(|outputs, targets| {
            outputs
                .iter()
                .zip(targets)
                .map(|(o, t)| (o - t).powi(2))
                .sum()
        })
    }

    /// Mean squared error.
    #[must_use]
    pub fn mse() -> Self {
        Self::single(|outputs, targets| {
            let sum: f64 = outputs.iter().zip(targets).map(|(o, t)| (o - t).powi(2)).sum();
            sum / outputs.len().max(1) as f64
        })
    }

    /// Root mean squared error.
    #[must_use]
    pub fn rmse() -> Self {
        Self::single(|outputs, targets| {
            let sum: f64 = outputs.iter().zip(targets).map(|(o, t)| (o - t).powi(2)).sum();
            (sum / outputs.len().max(1) as f64).sqrt()
        })
    }

    /// Mean absolute error.
    #[must_use]
    pub fn mae() -> Self {
        Self::single(|outputs, targets| {
            let sum: f64 = outputs.iter().zip(targets).map(|(o, t)| (o - t).abs()).sum();
            sum / outputs.len().max(1) as f64
        })
    }

    /// Number of samples whose rounded outputs differ from the target.
    #[must_use]
    pub fn mismatches() -> Self {
        Self::multiple(|outputs, targets| {
            outputs
                .iter()
                .zip(targets)
                .filter(|(o, t)| {
                    o.len() != t.len()
                        || o.iter().zip(t.iter()).any(|(a, b)| (a.round() - b).abs() > f64::EPSILON)
                })
                .count() as f64
        })
    }

    /// Resolve a built-in fitness function by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a built-in function.
    pub fn from_name(name: &str) -> Result<Self, ConfigurationError> {
        match name.to_ascii_lowercase().as_str() {
            "sse" => Ok(Self::sse()),
            "mse" => Ok(Self::mse()),
            "rmse" => Ok(Self::rmse()),
            "mae" => Ok(Self::mae()),
            "mismatches" => Ok(Self::mismatches()),
            _ => Err(ConfigurationError::InvalidParameter {
                parameter: "fitness",
                reason: format!("unknown fitness function `{name}`"),
            }),
        }
    }

    /// Whether this function consumes a single output per sample.
    #[must_use]
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }
}

/// Map non-finite fitness values to [`UNDEFINED_FITNESS`].
#[must_use]
pub fn sanitize(fitness: f64) -> f64 {
    if fitness.is_finite() { fitness } else { UNDEFINED_FITNESS }
}

/// Computes the fitness of a program against a dataset.
pub trait FitnessContext: Send + Sync {
    /// Evaluate `program` on every sample of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns an error if a sample or target does not match the program's
    /// shape.
    fn fitness(&self, program: &Program, dataset: &Dataset) -> Result<f64, EvaluationError>;
}

/// Run the effective part of `program` over the dataset, collecting outputs.
fn collect_outputs(
    context: &Context,
    program: &Program,
    dataset: &Dataset,
) -> Result<Vec<Vec<f64>>, EvaluationError> {
    if dataset.is_empty() {
        return Err(EvaluationError::EmptyDataset);
    }

    let layout = context.layout();
    let effective = program.effective();
    let mut registers = RegisterSet::new(layout);

    dataset
        .samples()
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            if sample.len() != layout.num_features {
                return Err(EvaluationError::FeatureCount {
                    sample: i,
                    expected: layout.num_features,
                    found: sample.len(),
                });
            }
            Ok(effective.execute(&mut registers, sample))
        })
        .collect()
}

/// Fitness context for programs with one output register.
#[derive(Clone)]
pub struct SingleOutputFitnessContext {
    context: Arc<Context>,
    function: Arc<SingleOutputFn>,
}

impl SingleOutputFitnessContext {
    /// Create a context using the environment's fitness function.
    ///
    /// # Errors
    ///
    /// Returns an error if the fitness function is not single-output.
    pub fn new(context: Arc<Context>) -> Result<Self, ConfigurationError> {
        match context.fitness_function() {
            FitnessFunction::Single(function) => {
                let function = Arc::clone(function);
                Ok(Self { context, function })
            }
            FitnessFunction::Multiple(_) => Err(ConfigurationError::FitnessShape {
                expected: "several",
                actual: context.output_registers().len(),
            }),
        }
    }
}

impl fmt::Debug for SingleOutputFitnessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleOutputFitnessContext").finish_non_exhaustive()
    }
}

impl FitnessContext for SingleOutputFitnessContext {
    fn fitness(&self, program: &Program, dataset: &Dataset) -> Result<f64, EvaluationError> {
        let outputs = collect_outputs(&self.context, program, dataset)?;

        let mut actual = Vec::with_capacity(outputs.len());
        let mut expected = Vec::with_capacity(outputs.len());
        for (i, (output, target)) in outputs.iter().zip(dataset.targets()).enumerate() {
            match (output.as_slice(), target) {
                ([value], Target::Single(t)) => {
                    actual.push(*value);
                    expected.push(*t);
                }
                _ => {
                    return Err(EvaluationError::ShapeMismatch {
                        sample: i,
                        outputs: output.len(),
                        targets: target.len(),
                    });
                }
            }
        }

        Ok(sanitize((self.function)(&actual, &expected)))
    }
}

/// Fitness context for programs with several output registers.
#[derive(Clone)]
pub struct MultipleOutputFitnessContext {
    context: Arc<Context>,
    function: Arc<MultipleOutputFn>,
}

impl MultipleOutputFitnessContext {
    /// Create a context using the environment's fitness function.
    ///
    /// # Errors
    ///
    /// Returns an error if the fitness function is not multiple-output.
    pub fn new(context: Arc<Context>) -> Result<Self, ConfigurationError> {
        match context.fitness_function() {
            FitnessFunction::Multiple(function) => {
                let function = Arc::clone(function);
                Ok(Self { context, function })
            }
            FitnessFunction::Single(_) => Err(ConfigurationError::FitnessShape {
                expected: "one",
                actual: context.output_registers().len(),
            }),
        }
    }
}

impl fmt::Debug for MultipleOutputFitnessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipleOutputFitnessContext").finish_non_exhaustive()
    }
}

impl FitnessContext for MultipleOutputFitnessContext {
    fn fitness(&self, program: &Program, dataset: &Dataset) -> Result<f64, EvaluationError> {
        let outputs = collect_outputs(&self.context, program, dataset)?;

        let mut expected = Vec::with_capacity(outputs.len());
        for (i, (output, target)) in outputs.iter().zip(dataset.targets()).enumerate() {
            match target {
                Target::Multiple(values) if values.len() == output.len() => {
                    expected.push(values.clone());
                }
                _ => {
                    return Err(EvaluationError::ShapeMismatch {
                        sample: i,
                        outputs: output.len(),
                        targets: target.len(),
                    });
                }
            }
        }

        Ok(sanitize((self.function)(&outputs, &expected)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::dataset::Sample;
    use crate::program::{Instruction, Operand, Operation};

    fn identity_dataset() -> Dataset {
        let samples = (0..5).map(|i| Sample::from_values(&[f64::from(i)])).collect();
        let targets = (0..5).map(|i| Target::Single(f64::from(i))).collect();
        Dataset::new(samples, targets).unwrap()
    }

    fn single_context() -> SingleOutputFitnessContext {
        let config = Configuration {
            num_features: 1,
            num_calculation_registers: 2,
            default_register_value: 0.0,
            ..Default::default()
        };
        let context = Arc::new(Context::new(config, FitnessFunction::sse()).unwrap());
        SingleOutputFitnessContext::new(context).unwrap()
    }

    #[test]
    fn test_perfect_program_has_zero_fitness() {
        // r1 = x + r1 where r1 starts at 0
        let program = Program::new(
            vec![Instruction::binary(
                Operation::Addition,
                1,
                Operand::Register(0),
                Operand::Register(1),
            )],
            vec![1],
        );
        let fitness = single_context().fitness(&program, &identity_dataset()).unwrap();
        assert!(fitness.abs() < f64::EPSILON);
    }

    #[test]
    fn test_sse_of_constant_program() {
        // r1 stays 0: errors are 0,1,2,3,4 -> 30
        let program = Program::new(Vec::new(), vec![1]);
        let fitness = single_context().fitness(&program, &identity_dataset()).unwrap();
        assert!((fitness - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let dataset = Dataset::new(
            vec![Sample::from_values(&[1.0])],
            vec![Target::Multiple(vec![1.0, 2.0])],
        )
        .unwrap();
        let program = Program::new(Vec::new(), vec![1]);
        let result = single_context().fitness(&program, &dataset);
        assert!(matches!(
            result,
            Err(EvaluationError::ShapeMismatch { sample: 0, outputs: 1, targets: 2 })
        ));
    }

    #[test]
    fn test_feature_count_mismatch_is_an_error() {
        let dataset = Dataset::new(
            vec![Sample::from_values(&[1.0, 2.0])],
            vec![Target::Single(1.0)],
        )
        .unwrap();
        let program = Program::new(Vec::new(), vec![1]);
        let result = single_context().fitness(&program, &dataset);
        assert!(matches!(result, Err(EvaluationError::FeatureCount { expected: 1, found: 2, .. })));
    }

    #[test]
    fn test_non_finite_fitness_is_undefined() {
        assert!((sanitize(f64::NAN) - UNDEFINED_FITNESS).abs() < f64::EPSILON);
        assert!((sanitize(f64::INFINITY) - UNDEFINED_FITNESS).abs() < f64::EPSILON);
        assert!((sanitize(2.5) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_multiple_output_context() {
        let config = Configuration {
            num_features: 2,
            num_calculation_registers: 2,
            output_registers: vec![2, 3],
            default_register_value: 0.0,
            operations: vec!["and".to_string(), "or".to_string()],
            ..Default::default()
        };
        let context = Arc::new(Context::new(config, FitnessFunction::mismatches()).unwrap());
        let fitness = MultipleOutputFitnessContext::new(context).unwrap();

        // r2 = a & b, r3 = a | b
        let program = Program::new(
            vec![
                Instruction::binary(Operation::And, 2, Operand::Register(0), Operand::Register(1)),
                Instruction::binary(Operation::Or, 3, Operand::Register(0), Operand::Register(1)),
            ],
            vec![2, 3],
        );
        let samples = vec![
            Sample::from_values(&[0.0, 0.0]),
            Sample::from_values(&[1.0, 0.0]),
            Sample::from_values(&[1.0, 1.0]),
        ];
        let targets = vec![
            Target::Multiple(vec![0.0, 0.0]),
            Target::Multiple(vec![0.0, 1.0]),
            Target::Multiple(vec![1.0, 0.0]),
        ];
        let dataset = Dataset::new(samples, targets).unwrap();

        let value = fitness.fitness(&program, &dataset).unwrap();
        assert!((value - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrong_function_shape_is_configuration_error() {
        let config = Configuration::default();
        let context = Arc::new(Context::new(config, FitnessFunction::sse()).unwrap());
        assert!(MultipleOutputFitnessContext::new(context).is_err());
    }
}
