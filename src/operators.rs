//! Genetic operators.
//!
//! Every operator is a role trait with one or more implementations, resolved
//! through the [`ModuleContainer`](crate::modules::ModuleContainer). Operators
//! never edit their inputs: they read parent programs and return new ones.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Selection (fitness → winners,      │
//! │             losers)                 │
//! ├─────────────────────────────────────┤
//! │  Crossover │ Macro mut. │ Micro mut.│
//! ├─────────────────────────────────────┤
//! │  Program + effective analysis       │
//! └─────────────────────────────────────┘
//! ```

mod crossover;
mod mutation;
mod selection;

pub use crossover::{LinearCrossover, RecombinationOperator};
pub use mutation::{
    gaussian_noise, ConstantMutationFunction, EffectiveMacroMutation, EffectiveMicroMutation,
    MacroMutationOperator, MicroMutationOperator,
};
pub use selection::{Selection, SelectionOperator, TournamentSelection};
