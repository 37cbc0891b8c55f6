//! Program representation and execution.
//!
//! A program is a linear sequence of register-machine instructions together
//! with the registers read as its outputs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Program (instructions, outputs)   │
//! ├─────────────────────────────────────┤
//! │  Effective analysis │ Generators    │
//! ├─────────────────────────────────────┤
//! │  Instruction │ Operation │ Registers│
//! └─────────────────────────────────────┘
//! ```

mod effective;
mod generator;
mod instruction;
mod operation;
mod register;

pub use effective::{effective_indices, effective_mask, live_before, LiveRegisters};
pub use generator::{
    EffectiveProgramGenerator, InstructionGenerator, ProgramGenerator, RandomInstructionGenerator,
    RandomProgramGenerator,
};
pub use instruction::{Instruction, Operand};
pub use operation::{
    Arity, Operation, OperationSet, FALSE_VALUE, PROTECTED_DIVISION_SENTINEL, TRUE_VALUE,
};
pub use register::{RegisterLayout, RegisterSet};

use crate::dataset::Sample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A linear genetic program.
///
/// A program owns its instructions exclusively; operators always produce new
/// programs instead of editing a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<Instruction>,
    output_registers: Vec<usize>,
}

impl Program {
    /// Create a program.
    #[must_use]
    pub fn new(instructions: Vec<Instruction>, output_registers: Vec<usize>) -> Self {
        Self {
            instructions,
            output_registers,
        }
    }

    /// The instruction sequence.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Registers read as outputs.
    #[must_use]
    pub fn output_registers(&self) -> &[usize] {
        &self.output_registers
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Copy of this program with a different instruction sequence.
    #[must_use]
    pub fn with_instructions(&self, instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            output_registers: self.output_registers.clone(),
        }
    }

    /// Indices of instructions that influence an output.
    #[must_use]
    pub fn effective_indices(&self) -> Vec<usize> {
        effective_indices(&self.instructions, &self.output_registers)
    }

    /// The program reduced to its effective instructions.
    ///
    /// Executing the result yields the same outputs as executing `self`.
    #[must_use]
    pub fn effective(&self) -> Program {
        let mask = effective_mask(&self.instructions, &self.output_registers);
        let instructions = self
            .instructions
            .iter()
            .zip(mask)
            .filter_map(|(instruction, effective)| effective.then(|| instruction.clone()))
            .collect();
        self.with_instructions(instructions)
    }

    /// Number of effective instructions.
    #[must_use]
    pub fn effective_len(&self) -> usize {
        effective_mask(&self.instructions, &self.output_registers)
            .into_iter()
            .filter(|&effective| effective)
            .count()
    }

    /// Run on one sample and return the output register values.
    ///
    /// The register file is reloaded from `sample` first, so it can be reused
    /// across samples.
    pub fn execute(&self, registers: &mut RegisterSet, sample: &Sample) -> Vec<f64> {
        registers.load(sample);
        for instruction in &self.instructions {
            instruction.execute(registers);
        }
        self.output_registers
            .iter()
            .map(|&r| registers.read(r))
            .collect()
    }

    /// Run on one sample with a fresh register file.
    #[must_use]
    pub fn run(&self, layout: RegisterLayout, sample: &Sample) -> Vec<f64> {
        let mut registers = RegisterSet::new(layout);
        self.execute(&mut registers, sample)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction};")?;
        }
        let outputs: Vec<String> = self
            .output_registers
            .iter()
            .map(|r| format!("r[{r}]"))
            .collect();
        write!(f, "return {};", outputs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RegisterLayout {
        RegisterLayout {
            num_features: 1,
            num_calculation: 3,
            default_value: 1.0,
        }
    }

    fn add(dst: usize, a: Operand, b: Operand) -> Instruction {
        Instruction::binary(Operation::Addition, dst, a, b)
    }

    #[test]
    fn test_execute_reads_outputs() {
        // r1 = x + 1; r2 = r1 * r1
        let program = Program::new(
            vec![
                add(1, Operand::Register(0), Operand::Constant(1.0)),
                Instruction::binary(
                    Operation::Multiplication,
                    2,
                    Operand::Register(1),
                    Operand::Register(1),
                ),
            ],
            vec![2],
        );

        assert_eq!(program.run(layout(), &Sample::from_values(&[2.0])), vec![9.0]);
        assert_eq!(program.run(layout(), &Sample::from_values(&[-1.0])), vec![0.0]);
    }

    #[test]
    fn test_calculation_registers_reset_between_samples() {
        // r1 = r1 + x accumulates only within one evaluation
        let program = Program::new(
            vec![add(1, Operand::Register(1), Operand::Register(0))],
            vec![1],
        );
        let mut registers = RegisterSet::new(layout());

        let first = program.execute(&mut registers, &Sample::from_values(&[5.0]));
        let second = program.execute(&mut registers, &Sample::from_values(&[5.0]));

        assert_eq!(first, vec![6.0]);
        assert_eq!(second, vec![6.0]);
    }

    #[test]
    fn test_effective_program_preserves_outputs() {
        let program = Program::new(
            vec![
                add(3, Operand::Register(0), Operand::Register(0)),
                add(1, Operand::Register(0), Operand::Constant(2.0)),
                add(3, Operand::Register(1), Operand::Register(1)),
                add(2, Operand::Register(3), Operand::Register(0)),
            ],
            vec![2],
        );
        let effective = program.effective();

        assert_eq!(effective.len(), 3);
        assert_eq!(program.effective_len(), 3);
        for x in [-3.0, 0.0, 0.5, 7.0] {
            let sample = Sample::from_values(&[x]);
            assert_eq!(effective.run(layout(), &sample), program.run(layout(), &sample));
        }
    }

    #[test]
    fn test_display() {
        let program = Program::new(
            vec![add(1, Operand::Register(0), Operand::Constant(1.0))],
            vec![1],
        );
        assert_eq!(program.to_string(), "r[1] = r[0] + 1;\nreturn r[1];");
    }
}
