//! Macro and micro mutation.
//!
//! Macro mutation changes program length by inserting or deleting one
//! instruction. Micro mutation edits a single instruction in place:
//! a register operand, the operation, or a constant.

use crate::environment::Context;
use crate::error::ConfigurationError;
use crate::program::{live_before, InstructionGenerator, Operand, Program};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use std::fmt;
use std::sync::Arc;

/// Inserts or deletes whole instructions.
pub trait MacroMutationOperator: Send + Sync {
    /// Return a mutated copy of `program`.
    fn mutate(&self, program: &Program, rng: &mut dyn RngCore) -> Program;
}

/// Changes a single instruction.
pub trait MicroMutationOperator: Send + Sync {
    /// Return a mutated copy of `program`.
    fn mutate(&self, program: &Program, rng: &mut dyn RngCore) -> Program;
}

/// Perturbs a constant operand.
pub type ConstantMutationFunction = Arc<dyn Fn(f64, &mut dyn RngCore) -> f64 + Send + Sync>;

/// Additive Gaussian noise with standard deviation `std_dev`.
///
/// # Errors
///
/// Returns [`ConfigurationError::InvalidParameter`] if `std_dev` is negative
/// or not finite.
pub fn gaussian_noise(std_dev: f64) -> Result<ConstantMutationFunction, ConfigurationError> {
    let normal = Normal::new(0.0, std_dev).map_err(|e| ConfigurationError::InvalidParameter {
        parameter: "mutation.constant_mutation_std_dev",
        reason: e.to_string(),
    })?;
    Ok(Arc::new(move |value: f64, rng: &mut dyn RngCore| {
        value + normal.sample(rng)
    }))
}

/// Effective macro mutation.
///
/// Insertion and deletion are exclusive; the choice is weighted by
/// `insertion_rate` against `deletion_rate` and forced the other way at the
/// length bounds. An inserted instruction writes a register that is live at
/// its position, so it is effective. Deletion removes an effective
/// instruction when the program has one.
#[derive(Clone)]
pub struct EffectiveMacroMutation {
    context: Arc<Context>,
    instructions: Arc<dyn InstructionGenerator>,
}

impl EffectiveMacroMutation {
    /// Create a macro mutation drawing new instructions from `instructions`.
    #[must_use]
    pub fn new(context: Arc<Context>, instructions: Arc<dyn InstructionGenerator>) -> Self {
        Self { context, instructions }
    }

    fn insert(&self, program: &Program, rng: &mut dyn RngCore) -> Program {
        let layout = self.context.layout();
        let position = rng.gen_range(0..=program.len());
        let live: Vec<usize> =
            live_before(program.instructions(), program.output_registers(), position)
                .iter()
                .filter(|&r| layout.is_calculation(r))
                .collect();

        let instruction = match live.choose(rng) {
            Some(&destination) => self.instructions.generate_with_destination(destination, rng),
            None => self.instructions.generate(rng),
        };

        let mut instructions = program.instructions().to_vec();
        instructions.insert(position, instruction);
        program.with_instructions(instructions)
    }

    fn delete(program: &Program, rng: &mut dyn RngCore) -> Program {
        let effective = program.effective_indices();
        let position = match effective.choose(rng) {
            Some(&i) => i,
            None => rng.gen_range(0..program.len()),
        };

        let mut instructions = program.instructions().to_vec();
        instructions.remove(position);
        program.with_instructions(instructions)
    }
}

impl fmt::Debug for EffectiveMacroMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveMacroMutation").finish_non_exhaustive()
    }
}

impl MacroMutationOperator for EffectiveMacroMutation {
    fn mutate(&self, program: &Program, rng: &mut dyn RngCore) -> Program {
        let config = self.context.configuration();
        let can_insert = program.len() < config.maximum_program_length;
        let can_delete = program.len() > config.minimum_program_length && !program.is_empty();

        let weight = config.mutation.insertion_rate
            / (config.mutation.insertion_rate + config.mutation.deletion_rate);
        let prefer_insert = rng.gen_bool(weight.clamp(0.0, 1.0));

        let insert = match (can_insert, can_delete) {
            (false, false) => return program.clone(),
            (true, false) => true,
            (false, true) => false,
            (true, true) => prefer_insert,
        };
        if insert {
            self.insert(program, rng)
        } else {
            Self::delete(program, rng)
        }
    }
}

/// Effective micro mutation.
///
/// The mutated instruction is drawn from the effective instructions when
/// there are any. One uniform draw picks the kind of change:
/// below `register_mutation_rate` a register operand is replaced, below
/// `register_mutation_rate + operator_mutation_rate` the operation is
/// replaced by another of equal arity, otherwise a constant operand is
/// perturbed. An instruction without constants gets a register mutation
/// instead.
#[derive(Clone)]
pub struct EffectiveMicroMutation {
    context: Arc<Context>,
    constant_mutation: ConstantMutationFunction,
}

impl EffectiveMicroMutation {
    /// Create a micro mutation using `constant_mutation` for constants.
    #[must_use]
    pub fn new(context: Arc<Context>, constant_mutation: ConstantMutationFunction) -> Self {
        Self {
            context,
            constant_mutation,
        }
    }
}

impl fmt::Debug for EffectiveMicroMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectiveMicroMutation").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MicroKind {
    Register,
    Operator,
    Constant,
}

impl MicroMutationOperator for EffectiveMicroMutation {
    fn mutate(&self, program: &Program, rng: &mut dyn RngCore) -> Program {
        if program.is_empty() {
            return program.clone();
        }

        let effective = program.effective_indices();
        let index = match effective.choose(rng) {
            Some(&i) => i,
            None => rng.gen_range(0..program.len()),
        };
        let mut instruction = program.instructions()[index].clone();

        let rates = self.context.configuration().mutation;
        let draw: f64 = rng.r#gen();
        let mut kind = if draw < rates.register_mutation_rate {
            MicroKind::Register
        } else if draw < rates.register_mutation_rate + rates.operator_mutation_rate {
            MicroKind::Operator
        } else {
            MicroKind::Constant
        };

        let constant_slots: Vec<usize> = instruction
            .operands
            .iter()
            .enumerate()
            .filter_map(|(i, operand)| operand.is_constant().then_some(i))
            .collect();
        if kind == MicroKind::Constant && constant_slots.is_empty() {
            kind = MicroKind::Register;
        }

        match kind {
            MicroKind::Register => {
                let register_slots: Vec<usize> = instruction
                    .operands
                    .iter()
                    .enumerate()
                    .filter_map(|(i, operand)| operand.register().map(|_| i))
                    .collect();
                let registers = self.context.layout().len();
                let target = register_slots
                    .choose(rng)
                    .and_then(|&slot| instruction.operands[slot].register().map(|r| (slot, r)))
                    .filter(|_| registers > 1);
                if let Some((slot, current)) = target {
                    // Skip over the current index so the operand always changes.
                    let mut replacement = rng.gen_range(0..registers - 1);
                    if replacement >= current {
                        replacement += 1;
                    }
                    instruction.operands[slot] = Operand::Register(replacement);
                }
            }
            MicroKind::Operator => {
                let current = instruction.operation;
                let alternatives: Vec<_> = self
                    .context
                    .operations()
                    .with_arity(current.arity())
                    .filter(|&op| op != current)
                    .collect();
                if let Some(&operation) = alternatives.choose(rng) {
                    instruction.operation = operation;
                }
            }
            MicroKind::Constant => {
                if let Some(&slot) = constant_slots.choose(rng) {
                    if let Operand::Constant(value) = instruction.operands[slot] {
                        let mutated = (self.constant_mutation)(value, rng);
                        instruction.operands[slot] = Operand::Constant(mutated);
                    }
                }
            }
        }

        let mut instructions = program.instructions().to_vec();
        instructions[index] = instruction;
        program.with_instructions(instructions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Configuration, MutationConfig};
    use crate::fitness::FitnessFunction;
    use crate::program::{Instruction, Operation, RandomInstructionGenerator};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn context(mutation: MutationConfig) -> Arc<Context> {
        let config = Configuration {
            num_features: 1,
            num_calculation_registers: 3,
            minimum_program_length: 2,
            maximum_program_length: 6,
            initial_minimum_program_length: 2,
            initial_maximum_program_length: 6,
            operations: vec!["addition".into(), "subtraction".into(), "sine".into()],
            mutation,
            ..Default::default()
        };
        Arc::new(Context::new(config, FitnessFunction::sse()).unwrap())
    }

    fn macro_mutation(context: &Arc<Context>) -> EffectiveMacroMutation {
        let instructions: Arc<dyn InstructionGenerator> =
            Arc::new(RandomInstructionGenerator::new(context.clone()));
        EffectiveMacroMutation::new(context.clone(), instructions)
    }

    fn program(len: usize) -> Program {
        let instructions = (0..len)
            .map(|_| {
                Instruction::binary(
                    Operation::Addition,
                    1,
                    Operand::Register(1),
                    Operand::Register(0),
                )
            })
            .collect();
        Program::new(instructions, vec![1])
    }

    #[test]
    fn test_macro_mutation_changes_length_by_one_within_bounds() {
        let context = context(MutationConfig::default());
        let operator = macro_mutation(&context);
        let mut rng = SmallRng::seed_from_u64(42);

        let mut current = program(4);
        for _ in 0..500 {
            let next = operator.mutate(&current, &mut rng);
            assert_eq!(next.len().abs_diff(current.len()), 1);
            assert!((2..=6).contains(&next.len()));
            current = next;
        }
    }

    #[test]
    fn test_macro_mutation_forced_at_bounds() {
        let context = context(MutationConfig {
            insertion_rate: 1.0,
            deletion_rate: 0.0,
            ..Default::default()
        });
        let operator = macro_mutation(&context);
        let mut rng = SmallRng::seed_from_u64(1);

        assert_eq!(operator.mutate(&program(6), &mut rng).len(), 5);
        assert_eq!(operator.mutate(&program(3), &mut rng).len(), 4);
    }

    #[test]
    fn test_inserted_instruction_is_effective() {
        let context = context(MutationConfig {
            insertion_rate: 1.0,
            deletion_rate: 0.0,
            ..Default::default()
        });
        let operator = macro_mutation(&context);
        let mut rng = SmallRng::seed_from_u64(2);

        let parent = program(3);
        for _ in 0..100 {
            let child = operator.mutate(&parent, &mut rng);
            let inserted = (0..child.len())
                .find(|&i| i == parent.len() || child.instructions()[i] != parent.instructions()[i])
                .unwrap();
            assert!(child.effective_indices().contains(&inserted));
            assert_eq!(parent, program(3));
        }
    }

    #[test]
    fn test_micro_operator_mutation_keeps_arity() {
        let context = context(MutationConfig {
            register_mutation_rate: 0.0,
            operator_mutation_rate: 1.0,
            ..Default::default()
        });
        let operator = EffectiveMicroMutation::new(context, gaussian_noise(1.0).unwrap());
        let mut rng = SmallRng::seed_from_u64(3);

        let child = operator.mutate(&program(2), &mut rng);
        let changed: Vec<_> = child
            .instructions()
            .iter()
            .filter(|i| i.operation != Operation::Addition)
            .collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].operation, Operation::Subtraction);
    }

    #[test]
    fn test_micro_constant_mutation_keeps_operand_kind() {
        let context = context(MutationConfig {
            register_mutation_rate: 0.0,
            operator_mutation_rate: 0.0,
            ..Default::default()
        });
        let shift = Arc::new(|value: f64, _: &mut dyn RngCore| value + 10.0);
        let operator = EffectiveMicroMutation::new(context, shift);
        let mut rng = SmallRng::seed_from_u64(4);
        let parent = Program::new(
            vec![Instruction::binary(
                Operation::Addition,
                1,
                Operand::Register(0),
                Operand::Constant(2.0),
            )],
            vec![1],
        );

        let child = operator.mutate(&parent, &mut rng);
        assert_eq!(child.instructions()[0].operands[0], Operand::Register(0));
        assert_eq!(child.instructions()[0].operands[1], Operand::Constant(12.0));
    }

    #[test]
    fn test_micro_register_mutation_stays_in_range() {
        let context = context(MutationConfig {
            register_mutation_rate: 1.0,
            operator_mutation_rate: 0.0,
            ..Default::default()
        });
        let operator = EffectiveMicroMutation::new(context, gaussian_noise(1.0).unwrap());
        let mut rng = SmallRng::seed_from_u64(5);

        let mut current = program(4);
        for _ in 0..200 {
            current = operator.mutate(&current, &mut rng);
            assert_eq!(current.len(), 4);
            for instruction in current.instructions() {
                assert!(instruction.source_registers().all(|r| r < 4));
            }
        }
    }

    #[test]
    fn test_micro_register_mutation_always_changes_operand() {
        let context = context(MutationConfig {
            register_mutation_rate: 1.0,
            operator_mutation_rate: 0.0,
            ..Default::default()
        });
        let operator = EffectiveMicroMutation::new(context, gaussian_noise(1.0).unwrap());
        let mut rng = SmallRng::seed_from_u64(7);
        let parent = Program::new(
            vec![Instruction::binary(
                Operation::Addition,
                1,
                Operand::Register(0),
                Operand::Register(2),
            )],
            vec![1],
        );

        for _ in 0..1000 {
            let child = operator.mutate(&parent, &mut rng);
            assert_ne!(child, parent);
            let changed = child.instructions()[0]
                .operands
                .iter()
                .zip(&parent.instructions()[0].operands)
                .filter(|(a, b)| a != b)
                .count();
            assert_eq!(changed, 1);
        }
    }

    #[test]
    fn test_gaussian_noise_rejects_negative_deviation() {
        assert!(matches!(
            gaussian_noise(-1.0),
            Err(ConfigurationError::InvalidParameter { .. })
        ));
        assert!(gaussian_noise(f64::NAN).is_err());
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn test_gaussian_noise_statistics() {
        let noise = gaussian_noise(2.0).unwrap();
        let mut rng = SmallRng::seed_from_u64(6);
        let samples: Vec<f64> = (0..20_000).map(|_| noise(5.0, &mut rng)).collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!((mean - 5.0).abs() < 0.1, "mean {mean}");
        assert!((variance.sqrt() - 2.0).abs() < 0.1, "std dev {}", variance.sqrt());
    }
}
