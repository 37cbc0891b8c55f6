//! Register-machine instructions.

use crate::program::operation::{Arity, Operation};
use crate::program::register::RegisterSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A source operand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// Read a register.
    Register(usize),
    /// An immediate constant.
    Constant(f64),
}

impl Operand {
    /// Register index, if this operand reads a register.
    #[must_use]
    pub fn register(self) -> Option<usize> {
        match self {
            Self::Register(index) => Some(index),
            Self::Constant(_) => None,
        }
    }

    /// Whether this operand is an immediate constant.
    #[must_use]
    pub fn is_constant(self) -> bool {
        matches!(self, Self::Constant(_))
    }

    #[inline]
    fn value(self, registers: &RegisterSet) -> f64 {
        match self {
            Self::Register(index) => registers.read(index),
            Self::Constant(value) => value,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(index) => write!(f, "r[{index}]"),
            Self::Constant(value) => write!(f, "{value}"),
        }
    }
}

/// `destination = operation(operands)`.
///
/// Invariant: `operands.len()` equals the operation's arity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Operation to apply.
    pub operation: Operation,
    /// Calculation register receiving the result.
    pub destination: usize,
    /// Source operands, one per unit of arity.
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Create an instruction.
    #[must_use]
    pub fn new(operation: Operation, destination: usize, operands: Vec<Operand>) -> Self {
        debug_assert_eq!(operands.len(), operation.arity().count());
        Self {
            operation,
            destination,
            operands,
        }
    }

    /// Shorthand for a binary instruction.
    #[must_use]
    pub fn binary(operation: Operation, destination: usize, lhs: Operand, rhs: Operand) -> Self {
        Self::new(operation, destination, vec![lhs, rhs])
    }

    /// Shorthand for a unary instruction.
    #[must_use]
    pub fn unary(operation: Operation, destination: usize, operand: Operand) -> Self {
        Self::new(operation, destination, vec![operand])
    }

    /// Arity of the instruction's operation.
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.operation.arity()
    }

    /// Registers read by this instruction.
    pub fn source_registers(&self) -> impl Iterator<Item = usize> + '_ {
        self.operands.iter().filter_map(|op| op.register())
    }

    /// Whether any operand is an immediate constant.
    #[must_use]
    pub fn has_constant(&self) -> bool {
        self.operands.iter().any(|op| op.is_constant())
    }

    /// Execute against a register file.
    #[inline]
    pub fn execute(&self, registers: &mut RegisterSet) {
        let a = self.operands.first().map_or(0.0, |op| op.value(registers));
        let b = self.operands.get(1).map_or(0.0, |op| op.value(registers));
        registers.write(self.destination, self.operation.apply(a, b));
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operands.as_slice() {
            [a, b] => write!(f, "r[{}] = {a} {} {b}", self.destination, self.operation),
            [a] => write!(f, "r[{}] = {}({a})", self.destination, self.operation),
            _ => write!(f, "r[{}] = {}()", self.destination, self.operation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sample;
    use crate::program::register::RegisterLayout;

    #[test]
    fn test_execute_binary() {
        let mut registers = RegisterSet::new(RegisterLayout {
            num_features: 1,
            num_calculation: 2,
            default_value: 0.0,
        });
        registers.load(&Sample::from_values(&[3.0]));

        Instruction::binary(Operation::Addition, 1, Operand::Register(0), Operand::Constant(2.0))
            .execute(&mut registers);
        Instruction::binary(
            Operation::Multiplication,
            2,
            Operand::Register(1),
            Operand::Register(0),
        )
        .execute(&mut registers);

        assert_eq!(registers.values(), &[3.0, 5.0, 15.0]);
    }

    #[test]
    fn test_display() {
        let instruction = Instruction::binary(
            Operation::Subtraction,
            4,
            Operand::Register(1),
            Operand::Constant(2.5),
        );
        assert_eq!(instruction.to_string(), "r[4] = r[1] - 2.5");

        let instruction = Instruction::unary(Operation::Sine, 3, Operand::Register(0));
        assert_eq!(instruction.to_string(), "r[3] = sin(r[0])");
    }

    #[test]
    fn test_source_registers_skip_constants() {
        let instruction = Instruction::binary(
            Operation::Addition,
            4,
            Operand::Constant(1.0),
            Operand::Register(2),
        );
        assert_eq!(instruction.source_registers().collect::<Vec<_>>(), vec![2]);
        assert!(instruction.has_constant());
    }
}
