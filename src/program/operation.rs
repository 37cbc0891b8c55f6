//! Operations available to instructions.
//!
//! Every operation is total over `f64`: division, logarithm, square root and
//! power are protected so that execution never fails.

// Boolean operations compare against the truth encoding exactly
#![allow(clippy::float_cmp)]

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value returned by protected division when the divisor is zero.
pub const PROTECTED_DIVISION_SENTINEL: f64 = 1.0;

/// Value boolean operations treat as `true`.
pub const TRUE_VALUE: f64 = 1.0;

/// Value boolean operations produce for `false`.
pub const FALSE_VALUE: f64 = 0.0;

/// Number of operands an operation consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    /// One operand.
    Unary,
    /// Two operands.
    Binary,
}

impl Arity {
    /// Operand count.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Unary => 1,
            Self::Binary => 2,
        }
    }
}

/// A numeric operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `a + b`.
    Addition,
    /// `a - b`.
    Subtraction,
    /// `a * b`.
    Multiplication,
    /// `a / b`, with a zero divisor yielding [`PROTECTED_DIVISION_SENTINEL`].
    Division,
    /// `|a|^b`, falling back to 1 when the result is not finite.
    Power,
    /// `e^a`.
    Exponent,
    /// `ln |a|`, with `ln 0` defined as 0.
    Logarithm,
    /// `sqrt |a|`.
    SquareRoot,
    /// `sin a`.
    Sine,
    /// `cos a`.
    Cosine,
    /// `min(a, b)`.
    Minimum,
    /// `max(a, b)`.
    Maximum,
    /// Logical not.
    Not,
    /// Logical and.
    And,
    /// Logical or.
    Or,
    /// Logical exclusive or.
    ExclusiveOr,
}

impl Operation {
    /// Every built-in operation.
    pub const ALL: [Operation; 16] = [
        Self::Addition,
        Self::Subtraction,
        Self::Multiplication,
        Self::Division,
        Self::Power,
        Self::Exponent,
        Self::Logarithm,
        Self::SquareRoot,
        Self::Sine,
        Self::Cosine,
        Self::Minimum,
        Self::Maximum,
        Self::Not,
        Self::And,
        Self::Or,
        Self::ExclusiveOr,
    ];

    /// Number of operands this operation consumes.
    #[must_use]
    pub fn arity(self) -> Arity {
        match self {
            Self::Exponent
            | Self::Logarithm
            | Self::SquareRoot
            | Self::Sine
            | Self::Cosine
            | Self::Not => Arity::Unary,
            Self::Addition
            | Self::Subtraction
            | Self::Multiplication
            | Self::Division
            | Self::Power
            | Self::Minimum
            | Self::Maximum
            | Self::And
            | Self::Or
            | Self::ExclusiveOr => Arity::Binary,
        }
    }

    /// Configuration identifier.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Multiplication => "multiplication",
            Self::Division => "division",
            Self::Power => "power",
            Self::Exponent => "exponent",
            Self::Logarithm => "logarithm",
            Self::SquareRoot => "square_root",
            Self::Sine => "sine",
            Self::Cosine => "cosine",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Not => "not",
            Self::And => "and",
            Self::Or => "or",
            Self::ExclusiveOr => "exclusive_or",
        }
    }

    /// Human readable symbol.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Addition => "+",
            Self::Subtraction => "-",
            Self::Multiplication => "*",
            Self::Division => "/",
            Self::Power => "^",
            Self::Exponent => "exp",
            Self::Logarithm => "ln",
            Self::SquareRoot => "sqrt",
            Self::Sine => "sin",
            Self::Cosine => "cos",
            Self::Minimum => "min",
            Self::Maximum => "max",
            Self::Not => "!",
            Self::And => "&",
            Self::Or => "|",
            Self::ExclusiveOr => "xor",
        }
    }

    /// Apply the operation.
    ///
    /// `b` is ignored by unary operations.
    #[inline]
    #[must_use]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Addition => a + b,
            Self::Subtraction => a - b,
            Self::Multiplication => a * b,
            Self::Division => {
                if b == 0.0 {
                    PROTECTED_DIVISION_SENTINEL
                } else {
                    a / b
                }
            }
            Self::Power => {
                let result = a.abs().powf(b);
                if result.is_finite() { result } else { 1.0 }
            }
            Self::Exponent => a.exp(),
            Self::Logarithm => {
                if a == 0.0 {
                    0.0
                } else {
                    a.abs().ln()
                }
            }
            Self::SquareRoot => a.abs().sqrt(),
            Self::Sine => a.sin(),
            Self::Cosine => a.cos(),
            Self::Minimum => a.min(b),
            Self::Maximum => a.max(b),
            Self::Not => from_bool(!to_bool(a)),
            Self::And => from_bool(to_bool(a) && to_bool(b)),
            Self::Or => from_bool(to_bool(a) || to_bool(b)),
            Self::ExclusiveOr => from_bool(to_bool(a) ^ to_bool(b)),
        }
    }
}

#[inline]
fn to_bool(value: f64) -> bool {
    value == TRUE_VALUE
}

#[inline]
fn from_bool(value: bool) -> f64 {
    if value { TRUE_VALUE } else { FALSE_VALUE }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operation {
    type Err = ConfigurationError;

    /// Resolve an identifier: either the snake_case name or the symbol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(trimmed) || op.symbol() == trimmed)
            .ok_or_else(|| ConfigurationError::UnknownOperation(s.to_string()))
    }
}

/// The operations a training session may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSet {
    operations: Vec<Operation>,
}

impl OperationSet {
    /// Build a set from operations, dropping duplicates.
    ///
    /// # Errors
    ///
    /// Returns an error if no operation is given.
    pub fn new(
        operations: impl IntoIterator<Item = Operation>,
    ) -> Result<Self, ConfigurationError> {
        let mut unique = Vec::new();
        for op in operations {
            if !unique.contains(&op) {
                unique.push(op);
            }
        }
        if unique.is_empty() {
            return Err(ConfigurationError::InvalidParameter {
                parameter: "operations",
                reason: "at least one operation is required".to_string(),
            });
        }
        Ok(Self { operations: unique })
    }

    /// Resolve configured identifiers into a set.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first identifier that does not resolve.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigurationError> {
        let operations = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<Operation>, _>>()?;
        Self::new(operations)
    }

    /// All operations in the set.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Operations of the given arity.
    pub fn with_arity(&self, arity: Arity) -> impl Iterator<Item = Operation> + '_ {
        self.operations.iter().copied().filter(move |op| op.arity() == arity)
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the set is empty (never true for a constructed set).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
