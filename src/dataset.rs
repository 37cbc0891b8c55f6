//! Datasets of (sample, target) pairs.
//!
//! A dataset is built once and shared read-only by every run of a training
//! session.

use crate::error::DatasetError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A named input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name.
    pub name: String,
    /// Feature value.
    pub value: f64,
}

impl Feature {
    /// Create a feature.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// An ordered set of features loaded into the feature registers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Features in register order.
    pub features: Vec<Feature>,
}

impl Sample {
    /// Create a sample from its features.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Create a sample from bare values, naming them `x0`, `x1`, ...
    #[must_use]
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            features: values
                .iter()
                .enumerate()
                .map(|(i, &value)| Feature::new(format!("x{i}"), value))
                .collect(),
        }
    }

    /// Look up a feature by name.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the sample has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Expected program output for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A single expected value.
    Single(f64),
    /// Several expected values, one per output register.
    Multiple(Vec<f64>),
}

impl Target {
    /// Number of values in this target.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(values) => values.len(),
        }
    }

    /// Whether the target carries no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable collection of samples and their targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    samples: Vec<Sample>,
    targets: Vec<Target>,
}

#[derive(Deserialize)]
struct RawDataset {
    samples: Vec<Sample>,
    targets: Vec<Target>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = DatasetError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        Self::new(raw.samples, raw.targets)
    }
}

impl Dataset {
    /// Pair samples with targets.
    ///
    /// # Errors
    ///
    /// Returns an error if the two lists differ in length.
    pub fn new(samples: Vec<Sample>, targets: Vec<Target>) -> Result<Self, DatasetError> {
        if samples.len() != targets.len() {
            return Err(DatasetError::LengthMismatch {
                samples: samples.len(),
                targets: targets.len(),
            });
        }
        Ok(Self { samples, targets })
    }

    /// All samples.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// All targets.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Iterate over (sample, target) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Sample, &Target)> {
        self.samples.iter().zip(self.targets.iter())
    }

    /// Number of (sample, target) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of features on the first sample (0 for an empty dataset).
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.samples.first().map_or(0, Sample::len)
    }
}

/// Source of a [`Dataset`].
pub trait DatasetLoader {
    /// Produce the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be obtained.
    fn load(&self) -> Result<Dataset, DatasetError>;
}

/// Hands out a dataset that is already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryDatasetLoader {
    dataset: Dataset,
}

impl InMemoryDatasetLoader {
    /// Wrap an existing dataset.
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

impl DatasetLoader for InMemoryDatasetLoader {
    fn load(&self) -> Result<Dataset, DatasetError> {
        Ok(self.dataset.clone())
    }
}

/// Reads a dataset stored as JSON in this crate's serde representation.
#[derive(Debug, Clone)]
pub struct JsonDatasetLoader {
    path: PathBuf,
}

impl JsonDatasetLoader {
    /// Create a loader reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetLoader for JsonDatasetLoader {
    fn load(&self) -> Result<Dataset, DatasetError> {
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_length_mismatch() {
        let result = Dataset::new(vec![Sample::from_values(&[1.0])], Vec::new());
        assert!(matches!(
            result,
            Err(DatasetError::LengthMismatch { samples: 1, targets: 0 })
        ));
    }

    #[test]
    fn test_sample_feature_lookup() {
        let sample = Sample::new(vec![Feature::new("a", 1.0), Feature::new("b", 2.0)]);
        assert_eq!(sample.feature("b").map(|f| f.value), Some(2.0));
        assert!(sample.feature("c").is_none());
    }

    #[test]
    fn test_json_dataset_validates_lengths() {
        let json = r#"{
            "samples": [{ "features": [{ "name": "x", "value": 1.0 }] }],
            "targets": [{ "single": 1.0 }, { "single": 2.0 }]
        }"#;
        let result: Result<Dataset, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let json = r#"{
            "samples": [{ "features": [{ "name": "x", "value": 1.0 }] }],
            "targets": [{ "multiple": [0.0, 1.0] }]
        }"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.num_features(), 1);
        assert_eq!(dataset.targets()[0].len(), 2);
    }
}
