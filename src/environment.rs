//! The shared, read-only training environment.
//!
//! Construction happens in two phases. A [`Context`] is built first from the
//! configuration and fitness function; it is complete and validated before
//! any module exists. The registered module factories are then resolved
//! against that finished context to form the [`Environment`]. Neither value
//! changes afterwards, so both are shared between concurrent runs without
//! locking.

use crate::config::{Configuration, ConfigurationLoader};
use crate::error::ConfigurationError;
use crate::fitness::FitnessFunction;
use crate::modules::{ModuleContainer, Modules};
use crate::program::{OperationSet, RegisterLayout};
use std::sync::Arc;

/// Validated configuration plus the values derived from it.
#[derive(Debug, Clone)]
pub struct Context {
    configuration: Configuration,
    operations: OperationSet,
    layout: RegisterLayout,
    output_registers: Vec<usize>,
    fitness_function: FitnessFunction,
}

impl Context {
    /// Validate `configuration` and resolve its operation set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, names an unknown
    /// operation, or the fitness function cannot consume the configured
    /// number of outputs.
    pub fn new(
        configuration: Configuration,
        fitness_function: FitnessFunction,
    ) -> Result<Self, ConfigurationError> {
        configuration.validate()?;

        let operations = OperationSet::from_names(&configuration.operations)?;
        let output_registers = configuration.output_register_indices();
        if fitness_function.is_single() && output_registers.len() != 1 {
            return Err(ConfigurationError::FitnessShape {
                expected: "one",
                actual: output_registers.len(),
            });
        }

        let layout = RegisterLayout {
            num_features: configuration.num_features,
            num_calculation: configuration.num_calculation_registers,
            default_value: configuration.default_register_value,
        };

        Ok(Self {
            configuration,
            operations,
            layout,
            output_registers,
            fitness_function,
        })
    }

    /// Load the configuration from `loader`, then build the context.
    ///
    /// # Errors
    ///
    /// Returns an error if loading or validation fails.
    pub fn from_loader(
        loader: &dyn ConfigurationLoader,
        fitness_function: FitnessFunction,
    ) -> Result<Self, ConfigurationError> {
        Self::new(loader.load()?, fitness_function)
    }

    /// The validated configuration.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Operations programs may use.
    #[must_use]
    pub fn operations(&self) -> &OperationSet {
        &self.operations
    }

    /// Register file shape.
    #[must_use]
    pub fn layout(&self) -> RegisterLayout {
        self.layout
    }

    /// Output register indices.
    #[must_use]
    pub fn output_registers(&self) -> &[usize] {
        &self.output_registers
    }

    /// The fitness function.
    #[must_use]
    pub fn fitness_function(&self) -> &FitnessFunction {
        &self.fitness_function
    }
}

/// A context together with its resolved modules.
#[derive(Debug, Clone)]
pub struct Environment {
    context: Arc<Context>,
    modules: Modules,
}

impl Environment {
    /// Resolve every registered module against `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if a module role has no factory or a factory fails.
    pub fn new(context: Context, container: &ModuleContainer) -> Result<Self, ConfigurationError> {
        let context = Arc::new(context);
        let modules = container.resolve(&context)?;
        Ok(Self { context, modules })
    }

    /// Build an environment with the built-in modules.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn standard(
        configuration: Configuration,
        fitness_function: FitnessFunction,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            Context::new(configuration, fitness_function)?,
            &ModuleContainer::standard(),
        )
    }

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Shorthand for the context's configuration.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        self.context.configuration()
    }

    /// Resolved modules.
    #[must_use]
    pub fn modules(&self) -> &Modules {
        &self.modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::CoreModuleType;

    #[test]
    fn test_single_fitness_needs_one_output() {
        let config = Configuration {
            output_registers: vec![0, 1],
            ..Default::default()
        };
        assert!(matches!(
            Context::new(config, FitnessFunction::sse()),
            Err(ConfigurationError::FitnessShape { expected: "one", actual: 2 })
        ));
    }

    #[test]
    fn test_unknown_operation_fails_fast() {
        let config = Configuration {
            operations: vec!["addition".to_string(), "teleport".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            Context::new(config, FitnessFunction::sse()),
            Err(ConfigurationError::UnknownOperation(name)) if name == "teleport"
        ));
    }

    #[test]
    fn test_standard_environment_resolves() {
        let env = Environment::standard(Configuration::default(), FitnessFunction::mse()).unwrap();
        assert_eq!(env.context().output_registers(), &[0]);
        assert_eq!(env.configuration().population_size, 100);
    }

    #[test]
    fn test_missing_module_is_reported_before_runs() {
        let context = Context::new(Configuration::default(), FitnessFunction::sse()).unwrap();
        let result = Environment::new(context, &ModuleContainer::new());
        assert!(matches!(
            result,
            Err(ConfigurationError::MissingModule(CoreModuleType::InstructionGenerator))
        ));
    }
}
