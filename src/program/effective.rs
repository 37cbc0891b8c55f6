//! Effective program analysis.
//!
//! A backward data-flow pass starting at the output registers. An
//! instruction is effective when it writes a register that is live at that
//! point; its destination then stops being live and its source registers
//! become live. Everything else is an intron and can be skipped without
//! changing any output.

use crate::program::instruction::Instruction;

/// Set of registers whose current value still reaches an output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveRegisters {
    live: Vec<bool>,
}

impl LiveRegisters {
    /// Live set at the end of a program: exactly the output registers.
    #[must_use]
    pub fn from_outputs(outputs: &[usize]) -> Self {
        let mut set = Self::default();
        for &r in outputs {
            set.insert(r);
        }
        set
    }

    /// Whether register `r` is live.
    #[must_use]
    pub fn contains(&self, r: usize) -> bool {
        self.live.get(r).copied().unwrap_or(false)
    }

    /// Mark `r` live.
    pub fn insert(&mut self, r: usize) {
        if r >= self.live.len() {
            self.live.resize(r + 1, false);
        }
        self.live[r] = true;
    }

    /// Mark `r` dead.
    pub fn remove(&mut self, r: usize) {
        if let Some(slot) = self.live.get_mut(r) {
            *slot = false;
        }
    }

    /// Live register indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.live
            .iter()
            .enumerate()
            .filter_map(|(r, &live)| live.then_some(r))
    }

    /// Whether no register is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.live.iter().any(|&live| live)
    }

    /// Walk backwards over one instruction, updating the live set.
    ///
    /// Returns whether the instruction is effective.
    pub fn step_back(&mut self, instruction: &Instruction) -> bool {
        if !self.contains(instruction.destination) {
            return false;
        }
        self.remove(instruction.destination);
        for source in instruction.source_registers() {
            self.insert(source);
        }
        true
    }
}

/// Effectiveness flag for every instruction.
#[must_use]
pub fn effective_mask(instructions: &[Instruction], outputs: &[usize]) -> Vec<bool> {
    let mut live = LiveRegisters::from_outputs(outputs);
    let mut mask = vec![false; instructions.len()];
    for (i, instruction) in instructions.iter().enumerate().rev() {
        mask[i] = live.step_back(instruction);
    }
    mask
}

/// Indices of effective instructions, in program order.
#[must_use]
pub fn effective_indices(instructions: &[Instruction], outputs: &[usize]) -> Vec<usize> {
    effective_mask(instructions, outputs)
        .into_iter()
        .enumerate()
        .filter_map(|(i, effective)| effective.then_some(i))
        .collect()
}

/// Registers live immediately before `instructions[position]`.
///
/// `position == instructions.len()` yields the output registers.
#[must_use]
pub fn live_before(
    instructions: &[Instruction],
    outputs: &[usize],
    position: usize,
) -> LiveRegisters {
    let mut live = LiveRegisters::from_outputs(outputs);
    for instruction in instructions[position.min(instructions.len())..].iter().rev() {
        live.step_back(instruction);
    }
    live
}
