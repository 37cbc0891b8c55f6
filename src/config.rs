//! Run configuration.
//!
//! A [`Configuration`] carries every numeric and categorical parameter the
//! engine reads. It is validated once while the environment is assembled and
//! never changes afterwards.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for tournament selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Number of distinct individuals competing in each tournament.
    pub tournament_size: usize,
    /// Number of tournament winners (and so children) per generation.
    pub number_of_offspring: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            tournament_size: 4,
            number_of_offspring: 10,
        }
    }
}

/// Configuration for linear crossover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossoverConfig {
    /// Longest segment taken from either parent.
    pub maximum_segment_length: usize,
    /// Largest distance between the two segment start positions.
    pub maximum_crossover_distance: usize,
    /// Largest difference between the two segment lengths.
    pub maximum_segment_length_difference: usize,
}

impl Default for CrossoverConfig {
    fn default() -> Self {
        Self {
            maximum_segment_length: 6,
            maximum_crossover_distance: 5,
            maximum_segment_length_difference: 3,
        }
    }
}

/// Configuration for macro and micro mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Relative weight of instruction insertion.
    pub insertion_rate: f64,
    /// Relative weight of instruction deletion.
    pub deletion_rate: f64,
    /// Probability that a micro mutation changes a register.
    pub register_mutation_rate: f64,
    /// Probability that a micro mutation changes an operation.
    pub operator_mutation_rate: f64,
    /// Standard deviation of the Gaussian noise applied to constants.
    pub constant_mutation_std_dev: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            insertion_rate: 0.67,
            deletion_rate: 0.33,
            register_mutation_rate: 0.5,
            operator_mutation_rate: 0.3,
            constant_mutation_std_dev: 1.0,
        }
    }
}

/// Which individual a run reports as its best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BestPolicy {
    /// Best individual seen in any generation (elitist, never gets worse).
    #[default]
    BestEver,
    /// Best individual of the last evaluated generation.
    FinalGeneration,
}

/// Complete configuration for training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Shortest program produced by the initial population.
    pub initial_minimum_program_length: usize,
    /// Longest program produced by the initial population.
    pub initial_maximum_program_length: usize,
    /// Shortest program allowed at any time.
    pub minimum_program_length: usize,
    /// Longest program allowed at any time.
    pub maximum_program_length: usize,
    /// Identifiers of the operations programs may use.
    pub operations: Vec<String>,
    /// Probability that a generated instruction uses an immediate constant.
    pub constants_rate: f64,
    /// Pool of immediate constants.
    pub constants: Vec<f64>,
    /// Number of input features per sample.
    pub num_features: usize,
    /// Number of scratch registers.
    pub num_calculation_registers: usize,
    /// Absolute register indices read as program outputs.
    ///
    /// Empty means the first calculation register.
    pub output_registers: Vec<usize>,
    /// Value calculation registers hold before each evaluation.
    pub default_register_value: f64,
    /// Individuals per population.
    pub population_size: usize,
    /// Generation budget per run.
    pub generations: usize,
    /// Independent runs per training.
    pub number_of_runs: usize,
    /// Base seed; run `r` is seeded with `seed + r`.
    pub seed: u64,
    /// Probability that a pair of winners is recombined.
    pub crossover_rate: f64,
    /// Probability that a child receives a macro mutation.
    pub macro_mutation_rate: f64,
    /// Probability that a child receives a micro mutation.
    pub micro_mutation_rate: f64,
    /// Tournament selection parameters.
    pub selection: SelectionConfig,
    /// Linear crossover parameters.
    pub crossover: CrossoverConfig,
    /// Mutation parameters.
    pub mutation: MutationConfig,
    /// How the best individual of a run is tracked.
    pub best_policy: BestPolicy,
    /// Stop a run once its best fitness reaches this value.
    pub stopping_criterion: Option<f64>,
    /// Worker threads for parallel fitness evaluation (0 = all cores).
    pub evaluation_threads: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            initial_minimum_program_length: 10,
            initial_maximum_program_length: 30,
            minimum_program_length: 10,
            maximum_program_length: 200,
            operations: vec![
                "addition".to_string(),
                "subtraction".to_string(),
                "multiplication".to_string(),
                "division".to_string(),
            ],
            constants_rate: 0.5,
            constants: vec![-1.0, 0.0, 1.0],
            num_features: 0,
            num_calculation_registers: 10,
            output_registers: Vec::new(),
            default_register_value: 1.0,
            population_size: 100,
            generations: 50,
            number_of_runs: 10,
            seed: 42,
            crossover_rate: 0.5,
            macro_mutation_rate: 0.6,
            micro_mutation_rate: 0.4,
            selection: SelectionConfig::default(),
            crossover: CrossoverConfig::default(),
            mutation: MutationConfig::default(),
            best_policy: BestPolicy::default(),
            stopping_criterion: None,
            evaluation_threads: 0,
        }
    }
}

impl Configuration {
    /// Total number of registers (features followed by calculation registers).
    #[must_use]
    pub fn register_count(&self) -> usize {
        self.num_features + self.num_calculation_registers
    }

    /// Output register indices with the empty default resolved.
    #[must_use]
    pub fn output_register_indices(&self) -> Vec<usize> {
        if self.output_registers.is_empty() {
            vec![self.num_features]
        } else {
            self.output_registers.clone()
        }
    }

    /// Check every parameter and their mutual consistency.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_lengths()?;
        self.validate_registers()?;
        self.validate_rates()?;
        self.validate_population()?;

        if self.operations.is_empty() {
            return Err(invalid("operations", "at least one operation is required"));
        }
        if self.crossover.maximum_segment_length == 0 {
            return Err(invalid("crossover.maximum_segment_length", "must be at least 1"));
        }
        let deviation = self.mutation.constant_mutation_std_dev;
        if !deviation.is_finite() || deviation < 0.0 {
            return Err(invalid(
                "mutation.constant_mutation_std_dev",
                format!("must be finite and non-negative, got {deviation}"),
            ));
        }
        if self.constants.iter().any(|c| !c.is_finite()) {
            return Err(invalid("constants", "constants must be finite"));
        }
        Ok(())
    }

    fn validate_lengths(&self) -> Result<(), ConfigurationError> {
        if self.minimum_program_length == 0 {
            return Err(invalid("minimum_program_length", "must be at least 1"));
        }
        ordered(
            "minimum_program_length",
            self.minimum_program_length,
            "maximum_program_length",
            self.maximum_program_length,
        )?;
        ordered(
            "initial_minimum_program_length",
            self.initial_minimum_program_length,
            "initial_maximum_program_length",
            self.initial_maximum_program_length,
        )?;
        ordered(
            "minimum_program_length",
            self.minimum_program_length,
            "initial_minimum_program_length",
            self.initial_minimum_program_length,
        )?;
        ordered(
            "initial_maximum_program_length",
            self.initial_maximum_program_length,
            "maximum_program_length",
            self.maximum_program_length,
        )
    }

    fn validate_registers(&self) -> Result<(), ConfigurationError> {
        if self.num_calculation_registers == 0 {
            return Err(invalid("num_calculation_registers", "must be at least 1"));
        }

        let start = self.num_features;
        let end = self.register_count();
        let outputs = self.output_register_indices();
        for (i, &index) in outputs.iter().enumerate() {
            if index < start || index >= end {
                return Err(ConfigurationError::OutputRegisterOutOfRange { index, start, end });
            }
            if outputs[..i].contains(&index) {
                return Err(ConfigurationError::DuplicateOutputRegister(index));
            }
        }
        Ok(())
    }

    fn validate_rates(&self) -> Result<(), ConfigurationError> {
        let rates = [
            ("constants_rate", self.constants_rate),
            ("crossover_rate", self.crossover_rate),
            ("macro_mutation_rate", self.macro_mutation_rate),
            ("micro_mutation_rate", self.micro_mutation_rate),
            ("mutation.insertion_rate", self.mutation.insertion_rate),
            ("mutation.deletion_rate", self.mutation.deletion_rate),
            ("mutation.register_mutation_rate", self.mutation.register_mutation_rate),
            ("mutation.operator_mutation_rate", self.mutation.operator_mutation_rate),
        ];
        for (parameter, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::RateOutOfRange { parameter, value });
            }
        }

        if self.mutation.insertion_rate + self.mutation.deletion_rate <= 0.0 {
            return Err(invalid(
                "mutation.insertion_rate",
                "insertion and deletion rates cannot both be zero",
            ));
        }
        if self.mutation.register_mutation_rate + self.mutation.operator_mutation_rate > 1.0 {
            return Err(invalid(
                "mutation.register_mutation_rate",
                "register and operator mutation rates must sum to at most 1",
            ));
        }
        Ok(())
    }

    fn validate_population(&self) -> Result<(), ConfigurationError> {
        if self.generations == 0 {
            return Err(invalid("generations", "must be at least 1"));
        }
        if self.number_of_runs == 0 {
            return Err(invalid("number_of_runs", "must be at least 1"));
        }
        if self.selection.tournament_size < 2 {
            return Err(invalid("selection.tournament_size", "must be at least 2"));
        }
        ordered(
            "selection.tournament_size",
            self.selection.tournament_size,
            "population_size",
            self.population_size,
        )?;
        if self.selection.number_of_offspring == 0 {
            return Err(invalid("selection.number_of_offspring", "must be at least 1"));
        }
        // Every child needs a distinct non-winner slot to replace.
        let offspring = self.selection.number_of_offspring;
        if offspring.saturating_mul(2) > self.population_size {
            return Err(invalid(
                "selection.number_of_offspring",
                format!(
                    "must be at most half of population_size ({}), got {offspring}",
                    self.population_size
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidParameter {
        parameter,
        reason: reason.into(),
    }
}

fn ordered(
    lower: &'static str,
    lower_value: usize,
    upper: &'static str,
    upper_value: usize,
) -> Result<(), ConfigurationError> {
    if lower_value > upper_value {
        Err(ConfigurationError::InvertedBounds {
            lower,
            lower_value,
            upper,
            upper_value,
        })
    } else {
        Ok(())
    }
}

/// Source of a [`Configuration`].
pub trait ConfigurationLoader {
    /// Produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be obtained.
    fn load(&self) -> Result<Configuration, ConfigurationError>;
}

impl ConfigurationLoader for Configuration {
    fn load(&self) -> Result<Configuration, ConfigurationError> {
        Ok(self.clone())
    }
}

/// Loads a configuration from a JSON file.
///
/// Missing fields take their default values.
#[derive(Debug, Clone)]
pub struct JsonConfigurationLoader {
    path: PathBuf,
}

impl JsonConfigurationLoader {
    /// Create a loader reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigurationLoader for JsonConfigurationLoader {
    fn load(&self) -> Result<Configuration, ConfigurationError> {
        let contents = std::fs::read_to_string(&self.path)?;
        let configuration = serde_json::from_str(&contents)?;
        Ok(configuration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_configuration_is_valid() {
        let config = Configuration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output_register_indices(), vec![0]);
    }

    #[test]
    fn test_inverted_length_bounds() {
        let config = Configuration {
            minimum_program_length: 50,
            maximum_program_length: 20,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvertedBounds { lower: "minimum_program_length", .. })
        ));
    }

    #[test]
    fn test_output_register_must_be_calculation_register() {
        let config = Configuration {
            num_features: 2,
            output_registers: vec![1],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::OutputRegisterOutOfRange { index: 1, start: 2, end: 12 })
        ));

        let config = Configuration {
            num_features: 2,
            output_registers: vec![2, 12],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::OutputRegisterOutOfRange { index: 12, .. })
        ));
    }

    #[test]
    fn test_duplicate_output_register() {
        let config = Configuration {
            output_registers: vec![3, 3],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::DuplicateOutputRegister(3))
        ));
    }

    #[test]
    fn test_rate_out_of_range() {
        let config = Configuration {
            crossover_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::RateOutOfRange { parameter: "crossover_rate", .. })
        ));
    }

    #[test]
    fn test_tournament_larger_than_population() {
        let mut config = Configuration {
            population_size: 3,
            ..Default::default()
        };
        config.selection.number_of_offspring = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvertedBounds { lower: "selection.tournament_size", .. })
        ));
    }

    #[test]
    fn test_offspring_limited_to_half_population() {
        let mut config = Configuration {
            population_size: 4,
            ..Default::default()
        };
        config.selection.tournament_size = 2;
        config.selection.number_of_offspring = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter {
                parameter: "selection.number_of_offspring",
                ..
            })
        ));

        config.selection.number_of_offspring = 3;
        assert!(config.validate().is_err());

        config.selection.number_of_offspring = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_loader_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "population_size": 64, "selection": {{ "tournament_size": 3 }} }}"#
        )
        .unwrap();

        let config = JsonConfigurationLoader::new(file.path()).load().unwrap();
        assert_eq!(config.population_size, 64);
        assert_eq!(config.selection.tournament_size, 3);
        assert_eq!(config.selection.number_of_offspring, 10);
        assert_eq!(config.generations, 50);
    }

    #[test]
    fn test_json_loader_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = JsonConfigurationLoader::new(file.path()).load();
        assert!(matches!(result, Err(ConfigurationError::Json(_))));
    }
}
