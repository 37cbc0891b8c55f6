// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! LGP: linear genetic programming on a register machine.
//!
//! Programs are linear sequences of register-machine instructions evolved to
//! minimise a fitness function over a dataset. This crate provides:
//! - A register machine with a library of total (protected) operations
//! - Effective-program analysis that strips introns before evaluation
//! - Tournament selection, linear crossover, macro and micro mutation
//! - Steady-state and master-slave evolution models
//! - Sequential and parallel training over independent, seeded runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Trainer (sequential | parallel)   │
//! ├─────────────────────────────────────┤
//! │   Evolution model (state machine)   │
//! ├─────────────────────────────────────┤
//! │  Operators │ Fitness │ Generators   │
//! ├─────────────────────────────────────┤
//! │   Program + register machine        │
//! └─────────────────────────────────────┘
//!         ▲ shared, read-only ▲
//!   Environment = Context + Modules
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lgp::{Configuration, Environment, FitnessFunction, SteadyState, Trainer, TrainerBuilder};
//!
//! let environment = Environment::standard(Configuration::default(), FitnessFunction::mse())?;
//! let trainer = TrainerBuilder::new()
//!     .environment(environment)
//!     .model(SteadyState::new())
//!     .build_sequential()?;
//! let result = trainer.train(&dataset)?;
//! ```

pub mod config;
pub mod dataset;
pub mod environment;
pub mod error;
pub mod evolution;
pub mod fitness;
pub mod modules;
pub mod operators;
pub mod program;
pub mod training;

pub use config::{BestPolicy, Configuration, ConfigurationLoader, JsonConfigurationLoader};
pub use dataset::{
    Dataset, DatasetLoader, Feature, InMemoryDatasetLoader, JsonDatasetLoader, Sample, Target,
};
pub use environment::{Context, Environment};
pub use error::{
    ConfigurationError, DatasetError, EvaluationError, OperatorConstraintError, RunError,
    TrainingError,
};
pub use evolution::{
    EvolutionModel, GenerationStatistics, Individual, MasterSlave, Population, RunContext,
    RunResult, SteadyState,
};
pub use fitness::{FitnessContext, FitnessFunction, UNDEFINED_FITNESS};
pub use modules::{CoreModuleType, ModuleContainer, Modules};
pub use program::{Instruction, Operand, Operation, OperationSet, Program, RegisterLayout};
pub use training::{DistributedTrainer, SequentialTrainer, Trainer, TrainerBuilder, TrainingResult};
