//! Random instruction and program generation.

// Generators use intentional casts for random index arithmetic
#![allow(clippy::cast_possible_truncation)]

use crate::environment::Context;
use crate::program::effective::LiveRegisters;
use crate::program::instruction::{Instruction, Operand};
use crate::program::Program;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Produces random instructions.
pub trait InstructionGenerator: Send + Sync {
    /// Generate an instruction writing `destination`.
    fn generate_with_destination(&self, destination: usize, rng: &mut dyn RngCore) -> Instruction;

    /// Generate an instruction writing a random calculation register.
    fn generate(&self, rng: &mut dyn RngCore) -> Instruction;
}

/// Produces random programs for the initial population.
pub trait ProgramGenerator: Send + Sync {
    /// Generate one program.
    fn generate(&self, rng: &mut dyn RngCore) -> Program;
}

/// Uniform instruction generator.
///
/// Operations are drawn uniformly from the operation set and operands
/// uniformly from all registers. With probability `constants_rate` one
/// operand of a binary instruction is replaced by a constant from the pool,
/// so every instruction keeps at least one register operand.
#[derive(Debug, Clone)]
pub struct RandomInstructionGenerator {
    context: Arc<Context>,
}

impl RandomInstructionGenerator {
    /// Create a generator for the given context.
    #[must_use]
    pub fn new(context: Arc<Context>) -> Self {
        Self { context }
    }

    /// Draw a random register operand.
    pub fn random_register(&self, rng: &mut dyn RngCore) -> Operand {
        Operand::Register(rng.gen_range(0..self.context.layout().len()))
    }

    /// Draw a constant operand, or `None` when the pool is empty.
    pub fn random_constant(&self, rng: &mut dyn RngCore) -> Option<Operand> {
        self.context
            .configuration()
            .constants
            .choose(rng)
            .map(|&value| Operand::Constant(value))
    }
}

impl InstructionGenerator for RandomInstructionGenerator {
    fn generate_with_destination(&self, destination: usize, rng: &mut dyn RngCore) -> Instruction {
        let operations = self.context.operations().operations();
        let operation = operations[rng.gen_range(0..operations.len())];
        let arity = operation.arity().count();

        let mut operands: Vec<Operand> = (0..arity).map(|_| self.random_register(rng)).collect();
        if arity > 1 && rng.gen_bool(self.context.configuration().constants_rate) {
            if let Some(constant) = self.random_constant(rng) {
                let slot = rng.gen_range(0..arity);
                operands[slot] = constant;
            }
        }

        Instruction::new(operation, destination, operands)
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Instruction {
        let destination = rng.gen_range(self.context.layout().calculation_range());
        self.generate_with_destination(destination, rng)
    }
}

fn initial_length(context: &Context, rng: &mut dyn RngCore) -> usize {
    let config = context.configuration();
    rng.gen_range(config.initial_minimum_program_length..=config.initial_maximum_program_length)
}

/// Generates programs from independent random instructions.
///
/// Many of the generated instructions are typically introns.
#[derive(Clone)]
pub struct RandomProgramGenerator {
    context: Arc<Context>,
    instructions: Arc<dyn InstructionGenerator>,
}

impl RandomProgramGenerator {
    /// Create a generator drawing instructions from `instructions`.
    #[must_use]
    pub fn new(context: Arc<Context>, instructions: Arc<dyn InstructionGenerator>) -> Self {
        Self { context, instructions }
    }
}

impl std::fmt::Debug for RandomProgramGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomProgramGenerator").finish_non_exhaustive()
    }
}

impl ProgramGenerator for RandomProgramGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Program {
        let length = initial_length(&self.context, rng);
        let instructions = (0..length).map(|_| self.instructions.generate(rng)).collect();
        Program::new(instructions, self.context.output_registers().to_vec())
    }
}

/// Generates programs whose instructions are all effective.
///
/// The program is built back to front: each new instruction writes one of the
/// calculation registers that is still live, so its result reaches an
/// output. Only when no calculation register is live (every later read is a
/// feature) does the generator fall back to a random destination.
#[derive(Clone)]
pub struct EffectiveProgramGenerator {
    context: Arc<Context>,
    instructions: Arc<dyn InstructionGenerator>,
}

impl EffectiveProgramGenerator {
    /// Create a generator drawing instructions from `instructions`.
    #[must_use]
    pub fn new(context: Arc<Context>, instructions: Arc<dyn InstructionGenerator>) -> Self {
        Self { context, instructions }
    }
}

impl std::fmt::Debug for EffectiveProgramGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveProgramGenerator").finish_non_exhaustive()
    }
}

impl ProgramGenerator for EffectiveProgramGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> Program {
        let layout = self.context.layout();
        let outputs = self.context.output_registers();
        let length = initial_length(&self.context, rng);

        let mut live = LiveRegisters::from_outputs(outputs);
        let mut reversed = Vec::with_capacity(length);
        for _ in 0..length {
            let candidates: Vec<usize> =
                live.iter().filter(|&r| layout.is_calculation(r)).collect();
            let instruction = match candidates.choose(rng) {
                Some(&destination) => self.instructions.generate_with_destination(destination, rng),
                None => self.instructions.generate(rng),
            };
            live.step_back(&instruction);
            reversed.push(instruction);
        }
        reversed.reverse();

        Program::new(reversed, outputs.to_vec())
    }
}
