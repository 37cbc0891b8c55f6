//! Linear crossover.
//!
//! Two parents exchange one contiguous instruction segment each. Segment
//! sizes, their start offsets and their size difference are bounded by the
//! crossover configuration; the children always stay inside the global
//! program length bounds.

use crate::environment::Context;
use crate::error::OperatorConstraintError;
use crate::program::{Instruction, Program};
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Combines two parents into two children.
pub trait RecombinationOperator: Send + Sync {
    /// Recombine `mother` and `father`.
    ///
    /// The first child descends from `mother`, the second from `father`.
    ///
    /// # Errors
    ///
    /// Returns [`OperatorConstraintError`] when no exchange keeps both
    /// children within the program length bounds.
    fn recombine(
        &self,
        mother: &Program,
        father: &Program,
        rng: &mut dyn RngCore,
    ) -> Result<(Program, Program), OperatorConstraintError>;
}

/// Two-segment linear crossover.
///
/// The shorter parent receives the longer segment where the bounds allow it.
/// If the exchange would push a child outside the length bounds, both
/// segments are cut to the same size so lengths are preserved.
#[derive(Debug, Clone)]
pub struct LinearCrossover {
    context: Arc<Context>,
}

/// A chosen exchange: start and length in each parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Exchange {
    short_start: usize,
    short_len: usize,
    long_start: usize,
    long_len: usize,
}

impl LinearCrossover {
    /// Create a crossover operator.
    #[must_use]
    pub fn new(context: Arc<Context>) -> Self {
        Self { context }
    }

    fn choose(&self, short: usize, long: usize, rng: &mut dyn RngCore) -> Exchange {
        let params = self.context.configuration().crossover;

        let short_start = rng.gen_range(0..short);
        let lo = short_start.saturating_sub(params.maximum_crossover_distance);
        let hi = (short_start + params.maximum_crossover_distance).min(long - 1);
        let long_start = rng.gen_range(lo..=hi);

        let short_cap = params.maximum_segment_length.min(short - short_start);
        let long_cap = params.maximum_segment_length.min(long - long_start);

        let mut short_len = rng.gen_range(1..=short_cap);
        let upper = long_cap.min(short_len + params.maximum_segment_length_difference);
        let long_len = if short_len <= upper {
            rng.gen_range(short_len..=upper)
        } else {
            long_cap
        };
        short_len = short_len.min(long_len + params.maximum_segment_length_difference);

        Exchange {
            short_start,
            short_len,
            long_start,
            long_len,
        }
    }
}

fn splice(
    base: &[Instruction],
    start: usize,
    len: usize,
    donor: &[Instruction],
) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(base.len() - len + donor.len());
    out.extend_from_slice(&base[..start]);
    out.extend_from_slice(donor);
    out.extend_from_slice(&base[start + len..]);
    out
}

impl RecombinationOperator for LinearCrossover {
    fn recombine(
        &self,
        mother: &Program,
        father: &Program,
        rng: &mut dyn RngCore,
    ) -> Result<(Program, Program), OperatorConstraintError> {
        if mother.is_empty() || father.is_empty() {
            return Err(OperatorConstraintError::EmptyParent);
        }

        let config = self.context.configuration();
        let (minimum, maximum) = (config.minimum_program_length, config.maximum_program_length);
        let in_bounds = |len: usize| (minimum..=maximum).contains(&len);

        let swapped = mother.len() > father.len();
        let (short, long) = if swapped { (father, mother) } else { (mother, father) };

        for len in [short.len(), long.len()] {
            if !in_bounds(len) {
                return Err(OperatorConstraintError::NoValidSegment {
                    length: len,
                    minimum,
                    maximum,
                });
            }
        }

        let mut exchange = self.choose(short.len(), long.len(), rng);
        let short_child = short.len() - exchange.short_len + exchange.long_len;
        let long_child = long.len() - exchange.long_len + exchange.short_len;
        if !in_bounds(short_child) || !in_bounds(long_child) {
            let common = exchange.short_len.min(exchange.long_len);
            exchange.short_len = common;
            exchange.long_len = common;
        }

        let short_end = exchange.short_start + exchange.short_len;
        let long_end = exchange.long_start + exchange.long_len;
        let short_segment = &short.instructions()[exchange.short_start..short_end];
        let long_segment = &long.instructions()[exchange.long_start..long_end];

        let short_child = short.with_instructions(splice(
            short.instructions(),
            exchange.short_start,
            exchange.short_len,
            long_segment,
        ));
        let long_child = long.with_instructions(splice(
            long.instructions(),
            exchange.long_start,
            exchange.long_len,
            short_segment,
        ));

        if swapped {
            Ok((long_child, short_child))
        } else {
            Ok((short_child, long_child))
        }
    }
}
