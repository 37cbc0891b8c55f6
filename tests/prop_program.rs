//! Property-based tests for programs and variation operators.
//!
//! Run with: cargo test --release prop_

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use lgp::config::SelectionConfig;
use lgp::operators::{
    EffectiveMacroMutation, LinearCrossover, MacroMutationOperator, RecombinationOperator,
    SelectionOperator, TournamentSelection,
};
use lgp::program::{Arity, InstructionGenerator, RandomInstructionGenerator};
use lgp::{
    Configuration, Context, FitnessFunction, Instruction, Operand, Operation, Program, Sample,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::sync::Arc;

const FEATURES: usize = 2;
const REGISTERS: usize = 6;
const MIN_LENGTH: usize = 1;
const MAX_LENGTH: usize = 40;

fn context() -> Arc<Context> {
    let config = Configuration {
        num_features: FEATURES,
        num_calculation_registers: REGISTERS - FEATURES,
        operations: Operation::ALL.iter().map(|op| op.name().to_string()).collect(),
        initial_minimum_program_length: MIN_LENGTH,
        initial_maximum_program_length: 10,
        minimum_program_length: MIN_LENGTH,
        maximum_program_length: MAX_LENGTH,
        ..Default::default()
    };
    Arc::new(Context::new(config, FitnessFunction::sse()).unwrap())
}

fn operand() -> impl Strategy<Value = Operand> {
    prop_oneof![
        3 => (0..REGISTERS).prop_map(Operand::Register),
        1 => (-5.0f64..5.0).prop_map(Operand::Constant),
    ]
}

fn instruction() -> impl Strategy<Value = Instruction> {
    (0..Operation::ALL.len(), FEATURES..REGISTERS, operand(), operand()).prop_map(
        |(op, destination, lhs, rhs)| {
            let operation = Operation::ALL[op];
            match operation.arity() {
                Arity::Unary => Instruction::unary(operation, destination, lhs),
                Arity::Binary => Instruction::binary(operation, destination, lhs, rhs),
            }
        },
    )
}

fn program(lengths: std::ops::Range<usize>) -> impl Strategy<Value = Program> {
    prop::collection::vec(instruction(), lengths)
        .prop_map(|instructions| Program::new(instructions, vec![FEATURES]))
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Dropping non-effective instructions never changes the outputs.
    #[test]
    fn prop_effective_program_preserves_outputs(
        program in program(0..MAX_LENGTH),
        inputs in prop::collection::vec(-10.0f64..10.0, FEATURES),
    ) {
        let layout = context().layout();
        let sample = Sample::from_values(&inputs);
        let full = program.run(layout, &sample);
        let effective = program.effective().run(layout, &sample);
        prop_assert_eq!(bits(&full), bits(&effective));
    }

    #[test]
    fn prop_effective_length_bounded(program in program(0..MAX_LENGTH)) {
        let indices = program.effective_indices();
        prop_assert!(indices.len() <= program.len());
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(program.effective().len(), program.effective_len());
    }

    /// Recombination of in-bounds parents succeeds and keeps both children in bounds.
    #[test]
    fn prop_crossover_children_within_bounds(
        mother in program(MIN_LENGTH..MAX_LENGTH + 1),
        father in program(MIN_LENGTH..MAX_LENGTH + 1),
        seed in any::<u64>(),
    ) {
        let crossover = LinearCrossover::new(context());
        let mut rng = SmallRng::seed_from_u64(seed);
        let result = crossover.recombine(&mother, &father, &mut rng);
        prop_assert!(result.is_ok(), "in-bounds parents rejected: {:?}", result.as_ref().err());
        let (first, second) = result.unwrap();
        for child in [&first, &second] {
            prop_assert!(
                (MIN_LENGTH..=MAX_LENGTH).contains(&child.len()),
                "child length {}",
                child.len()
            );
        }
        prop_assert_eq!(first.len() + second.len(), mother.len() + father.len());
    }

    #[test]
    fn prop_macro_mutation_changes_length_by_one(
        parent in program(MIN_LENGTH..MAX_LENGTH + 1),
        seed in any::<u64>(),
    ) {
        let ctx = context();
        let instructions: Arc<dyn InstructionGenerator> =
            Arc::new(RandomInstructionGenerator::new(Arc::clone(&ctx)));
        let mutation = EffectiveMacroMutation::new(ctx, instructions);
        let mut rng = SmallRng::seed_from_u64(seed);

        let child = mutation.mutate(&parent, &mut rng);
        prop_assert!(child.len().abs_diff(parent.len()) <= 1);
        prop_assert!((MIN_LENGTH..=MAX_LENGTH).contains(&child.len()));
    }

    /// A tournament winner beats at least `tournament_size - 1` others.
    #[test]
    fn prop_tournament_winner_is_competitive(
        fitness in prop::collection::vec(0.0f64..100.0, 4..50),
        tournament_size in 2usize..5,
        seed in any::<u64>(),
    ) {
        let selection = TournamentSelection::new(SelectionConfig {
            tournament_size,
            number_of_offspring: 2,
        });
        let mut rng = SmallRng::seed_from_u64(seed);
        let result = selection.select(&fitness, &mut rng);

        prop_assert_eq!(result.winners.len(), 2);
        for &winner in &result.winners {
            let outranked = fitness
                .iter()
                .enumerate()
                .filter(|&(i, f)| i != winner && *f >= fitness[winner])
                .count();
            prop_assert!(outranked + 1 >= tournament_size);
            prop_assert!(!result.losers.contains(&winner));
        }
    }
}
