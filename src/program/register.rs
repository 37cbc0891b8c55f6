//! The register file programs execute against.

use crate::dataset::Sample;

/// Shape of a register file.
///
/// Indices `0..num_features` are feature registers, followed by
/// `num_calculation` scratch registers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegisterLayout {
    /// Number of feature registers.
    pub num_features: usize,
    /// Number of calculation registers.
    pub num_calculation: usize,
    /// Value calculation registers are reset to before each evaluation.
    pub default_value: f64,
}

impl RegisterLayout {
    /// Total number of registers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.num_features + self.num_calculation
    }

    /// Whether the layout has no registers at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Range of calculation register indices.
    #[must_use]
    pub fn calculation_range(&self) -> std::ops::Range<usize> {
        self.num_features..self.len()
    }

    /// Whether `index` is a calculation register.
    #[must_use]
    pub fn is_calculation(&self, index: usize) -> bool {
        self.calculation_range().contains(&index)
    }
}

/// A private register file for one evaluation.
///
/// Feature registers are written only by [`RegisterSet::load`]; instructions
/// write calculation registers.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSet {
    layout: RegisterLayout,
    values: Vec<f64>,
}

impl RegisterSet {
    /// Create a register file with every register at the default value.
    #[must_use]
    pub fn new(layout: RegisterLayout) -> Self {
        Self {
            layout,
            values: vec![layout.default_value; layout.len()],
        }
    }

    /// Layout of this register file.
    #[must_use]
    pub fn layout(&self) -> RegisterLayout {
        self.layout
    }

    /// Load a sample's features and reset every calculation register.
    ///
    /// Features beyond the layout are ignored; missing features read as 0.
    pub fn load(&mut self, sample: &Sample) {
        let num_features = self.layout.num_features;
        for (i, slot) in self.values[..num_features].iter_mut().enumerate() {
            *slot = sample.features.get(i).map_or(0.0, |f| f.value);
        }
        self.reset();
    }

    /// Reset calculation registers to the default value.
    pub fn reset(&mut self) {
        let default = self.layout.default_value;
        for slot in &mut self.values[self.layout.num_features..] {
            *slot = default;
        }
    }

    /// Read a register.
    #[inline]
    #[must_use]
    pub fn read(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Write a register.
    #[inline]
    pub fn write(&mut self, index: usize, value: f64) {
        debug_assert!(self.layout.is_calculation(index), "write to feature register {index}");
        self.values[index] = value;
    }

    /// All register values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RegisterLayout {
        RegisterLayout {
            num_features: 2,
            num_calculation: 3,
            default_value: 1.0,
        }
    }

    #[test]
    fn test_load_sets_features_and_resets_calculation() {
        let mut registers = RegisterSet::new(layout());
        registers.write(3, 42.0);

        registers.load(&Sample::from_values(&[5.0, 6.0]));

        assert_eq!(registers.values(), &[5.0, 6.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_calculation_range() {
        let layout = layout();
        assert_eq!(layout.calculation_range(), 2..5);
        assert!(!layout.is_calculation(1));
        assert!(layout.is_calculation(4));
        assert!(!layout.is_calculation(5));
    }
}
